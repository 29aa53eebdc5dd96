//! Deterministic transaction dispatch and record assembly.
//!
//! This crate implements the handle pipeline as a pure, synchronous state
//! machine over the savepoint stack. Given one consensus-ordered
//! transaction it:
//!
//! - verifies required signatures (the only parallel activity, performed
//!   by the verification pool ahead of time),
//! - executes the state transition, including any child or preceding
//!   dispatches the handler requests,
//! - assembles an ordered, hierarchically numbered record stream,
//! - guarantees that a failed nested dispatch rolls back only its own
//!   savepoint frame.
//!
//! Consensus transactions are processed strictly in consensus order on a
//! single logical thread of control; that sequentiality, not locking, is
//! what keeps replicas identical.

mod config;
mod dispatch;
mod engine;
mod error;
mod handlers;
mod hollow;
mod pipeline;
mod prehandle;
mod records;
mod verifier;

pub use config::DispatchConfig;
pub use dispatch::{ChildOutcome, Dispatch, DispatchLevel, DispatchState, HandleContext};
pub use engine::{ContractEngine, EngineCall, EngineOutcome, NoContractEngine, ScriptedEngine};
pub use error::HandleError;
pub use hollow::HollowAccountCompleter;
pub use pipeline::TransactionPipeline;
pub use prehandle::{PreHandleEvaluator, PreHandleResult, PreHandleStatus};
pub use records::{RecordBuilder, RecordIndex, RecordListBuilder};
pub use verifier::{KeyVerifier, SignatureVerificationFuture, VerificationPool};
