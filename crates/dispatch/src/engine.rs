//! Seam to the external contract-execution engine.

use unison_types::AccountId;

/// One synchronous contract invocation.
#[derive(Debug, Clone, Copy)]
pub struct EngineCall<'a> {
    /// Account paying for and initiating the call.
    pub sender: AccountId,
    /// The contract account being called.
    pub contract: AccountId,
    /// Gas limit.
    pub gas: u64,
    /// Value moved from sender to contract before the call.
    pub value: u64,
    /// Opaque call data.
    pub call_data: &'a [u8],
}

/// Result of one engine invocation.
///
/// Storage writes are applied to the calling dispatch's savepoint frame,
/// so a failed call (or a later failure of the dispatch) discards them
/// with everything else in the frame.
#[derive(Debug, Clone, Default)]
pub struct EngineOutcome {
    /// Whether the call succeeded.
    pub success: bool,
    /// Gas consumed.
    pub gas_used: u64,
    /// Return data.
    pub output: Vec<u8>,
    /// Contract storage cells written by the call.
    pub storage_writes: Vec<(Vec<u8>, Vec<u8>)>,
    /// Engine-reported error, if any.
    pub error: Option<String>,
}

/// The contract-execution engine collaborator.
///
/// The engine must be deterministic: the replicated state machine folds
/// its outcome into the record stream byte-for-byte.
pub trait ContractEngine {
    /// Execute one call synchronously.
    fn execute(&mut self, call: EngineCall<'_>) -> EngineOutcome;
}

/// Engine that rejects every call, for deployments without contract
/// support.
#[derive(Debug, Default)]
pub struct NoContractEngine;

impl ContractEngine for NoContractEngine {
    fn execute(&mut self, _call: EngineCall<'_>) -> EngineOutcome {
        EngineOutcome {
            success: false,
            error: Some("contract execution is not enabled".to_string()),
            ..EngineOutcome::default()
        }
    }
}

/// Engine that replays scripted outcomes in order, for tests and
/// simulation.
#[derive(Debug, Default)]
pub struct ScriptedEngine {
    outcomes: Vec<EngineOutcome>,
}

impl ScriptedEngine {
    /// Queue outcomes to be returned by successive calls.
    pub fn with_outcomes(outcomes: Vec<EngineOutcome>) -> Self {
        Self { outcomes }
    }
}

impl ContractEngine for ScriptedEngine {
    fn execute(&mut self, _call: EngineCall<'_>) -> EngineOutcome {
        if self.outcomes.is_empty() {
            EngineOutcome {
                success: true,
                gas_used: 1,
                ..EngineOutcome::default()
            }
        } else {
            self.outcomes.remove(0)
        }
    }
}
