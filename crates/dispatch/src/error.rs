//! Error type for dispatch execution.

use thiserror::Error;
use unison_types::ResponseCode;

/// A business-rule or resource failure inside one dispatch.
///
/// Handlers surface every failure as a response code; the dispatcher
/// catches the error at the dispatch boundary, rolls back that dispatch's
/// savepoint frame, and seals its record with the code. Errors never
/// propagate past a dispatch boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("dispatch failed: {code:?}")]
pub struct HandleError {
    /// The response code recorded for the failing dispatch.
    pub code: ResponseCode,
}

impl HandleError {
    /// Wrap a response code.
    pub fn new(code: ResponseCode) -> Self {
        Self { code }
    }
}

impl From<ResponseCode> for HandleError {
    fn from(code: ResponseCode) -> Self {
        Self { code }
    }
}
