//! Cryptographic key pairs and signatures.
//!
//! The pipeline only needs one primitive: verify a signature against a
//! public key, yielding a boolean. ED25519 is the single supported scheme;
//! composite (threshold/list) structure is layered on top in [`crate::Key`].

use serde::{Deserialize, Serialize};
use std::fmt;

/// An ED25519 public key (32 bytes).
#[derive(
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    bincode::Encode,
    bincode::Decode,
)]
pub struct PublicKey(pub [u8; 32]);

impl PublicKey {
    /// Verify a signature over a message.
    ///
    /// Returns `false` for malformed keys or signatures; verification never
    /// fails with an error, only with a negative outcome.
    pub fn verify(&self, message: &[u8], signature: &Signature) -> bool {
        use ed25519_dalek::Verifier;
        let pk = match ed25519_dalek::VerifyingKey::from_bytes(&self.0) {
            Ok(pk) => pk,
            Err(_) => return false,
        };
        let sig_array: [u8; 64] = match signature.0.as_slice().try_into() {
            Ok(arr) => arr,
            Err(_) => return false,
        };
        let sig = ed25519_dalek::Signature::from_bytes(&sig_array);
        pk.verify(message, &sig).is_ok()
    }

    /// Get the key as a byte slice.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({}..)", &hex::encode(self.0)[..16])
    }
}

/// An ED25519 signature (64 bytes).
#[derive(
    Clone, PartialEq, Eq, Hash, Serialize, Deserialize, bincode::Encode, bincode::Decode,
)]
pub struct Signature(pub Vec<u8>);

impl Signature {
    /// Get signature as a byte slice.
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_slice()
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({}..)", &hex::encode(&self.0)[..16.min(self.0.len() * 2)])
    }
}

/// An ED25519 key pair for signing.
#[derive(Clone)]
pub struct KeyPair(ed25519_dalek::SigningKey);

impl KeyPair {
    /// Generate a new random keypair.
    pub fn generate() -> Self {
        let mut csprng = rand::rngs::OsRng;
        KeyPair(ed25519_dalek::SigningKey::generate(&mut csprng))
    }

    /// Generate a keypair from a seed (for testing/simulation).
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        KeyPair(ed25519_dalek::SigningKey::from_bytes(seed))
    }

    /// Sign a message.
    pub fn sign(&self, message: &[u8]) -> Signature {
        use ed25519_dalek::Signer;
        Signature(self.0.sign(message).to_bytes().to_vec())
    }

    /// Get the public key.
    pub fn public_key(&self) -> PublicKey {
        PublicKey(self.0.verifying_key().to_bytes())
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KeyPair({:?})", self.public_key())
    }
}
