//! Asynchronous signature verification.
//!
//! Verification is the only inherently parallel activity in the pipeline:
//! the pool spawns each distinct signature onto rayon as soon as it is
//! submitted (during speculative pre-handle, ahead of consensus order) and
//! publishes the outcome through a single-assignment cell. "Awaiting" a
//! verification is a synchronous read that blocks only the current
//! dispatch's thread of control, never the global transaction order.

use indexmap::IndexMap;
use std::sync::{Arc, Condvar, Mutex};
use tracing::debug;
use unison_types::{Address, Key, PublicKey, Signature};

/// Single-assignment result cell shared between the pool and its futures.
#[derive(Debug, Default)]
struct Cell {
    result: Mutex<Option<bool>>,
    ready: Condvar,
}

impl Cell {
    fn set(&self, passed: bool) {
        let mut guard = self.result.lock().unwrap();
        *guard = Some(passed);
        self.ready.notify_all();
    }

    fn wait(&self) -> bool {
        let mut guard = self.result.lock().unwrap();
        while guard.is_none() {
            guard = self.ready.wait(guard).unwrap();
        }
        guard.unwrap_or(false)
    }
}

/// Handle to one pending or resolved signature verification.
#[derive(Debug, Clone)]
pub struct SignatureVerificationFuture {
    key: PublicKey,
    cell: Arc<Cell>,
}

impl SignatureVerificationFuture {
    /// The key the signature was verified against.
    pub fn key(&self) -> PublicKey {
        self.key
    }

    /// Wait for and return the verification outcome.
    pub fn resolve(&self) -> bool {
        self.cell.wait()
    }
}

/// Block-scoped pool of verification work units, keyed by raw signature
/// bytes so identical signatures across several keys are verified once.
///
/// This is an explicit cache object rather than ambient global state; the
/// owner drains it at round boundaries.
#[derive(Debug, Default)]
pub struct VerificationPool {
    by_signature: IndexMap<Vec<u8>, SignatureVerificationFuture>,
}

impl VerificationPool {
    /// Create an empty pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Submit one (key, signature, message) work unit.
    ///
    /// Returns immediately with a future; the verification itself runs on
    /// the rayon pool. A signature already submitted is not re-verified.
    pub fn submit(
        &mut self,
        key: PublicKey,
        signature: &Signature,
        message: &[u8],
    ) -> SignatureVerificationFuture {
        if let Some(existing) = self.by_signature.get(signature.as_bytes()) {
            return existing.clone();
        }

        let cell = Arc::new(Cell::default());
        let future = SignatureVerificationFuture {
            key,
            cell: Arc::clone(&cell),
        };
        let signature_owned = signature.clone();
        let message_owned = message.to_vec();
        rayon::spawn(move || {
            cell.set(key.verify(&message_owned, &signature_owned));
        });

        self.by_signature
            .insert(signature.as_bytes().to_vec(), future.clone());
        future
    }

    /// Number of distinct signatures submitted.
    pub fn len(&self) -> usize {
        self.by_signature.len()
    }

    /// Whether the pool is empty.
    pub fn is_empty(&self) -> bool {
        self.by_signature.is_empty()
    }

    /// Evict all cached verifications, at a round boundary.
    pub fn drain(&mut self) {
        debug!(evicted = self.by_signature.len(), "draining verification pool");
        self.by_signature.clear();
    }
}

/// Verification results scoped to one dispatch.
///
/// Walks composite key structure against the per-key futures, resolving
/// only the futures relevant to the key being checked.
#[derive(Debug, Clone, Default)]
pub struct KeyVerifier {
    verifications: IndexMap<PublicKey, SignatureVerificationFuture>,
}

impl KeyVerifier {
    /// Scope a verifier over the futures gathered at pre-handle.
    pub fn new(verifications: IndexMap<PublicKey, SignatureVerificationFuture>) -> Self {
        Self { verifications }
    }

    /// Whether the given (possibly composite) key is satisfied.
    ///
    /// A primitive key with no submitted signature fails. A threshold key
    /// stops resolving children as soon as the threshold is met.
    pub fn verifies(&self, key: &Key) -> bool {
        match key {
            Key::Ed25519(pk) => self
                .verifications
                .get(pk)
                .map(|future| future.resolve())
                .unwrap_or(false),
            Key::Threshold { threshold, keys } => {
                if *threshold == 0 {
                    return false;
                }
                let mut passed = 0usize;
                for child in keys {
                    if self.verifies(child) {
                        passed += 1;
                        if passed >= *threshold as usize {
                            return true;
                        }
                    }
                }
                false
            }
            Key::KeyList(keys) => !keys.is_empty() && keys.iter().all(|k| self.verifies(k)),
        }
    }

    /// Find a passing verification whose key derives the given implicit
    /// address, for hollow-account completion.
    pub fn verification_for_alias(&self, address: &Address) -> Option<PublicKey> {
        self.verifications
            .iter()
            .find(|(pk, future)| Address::of(pk) == *address && future.resolve())
            .map(|(pk, _)| *pk)
    }
}
