//! Error taxonomy for a single gate invocation.
//!
//! Every variant ends in the same place: a deny decision and exit status 1.
//! The variants exist so the log line says *why* access was refused.

use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GateError {
    #[error("credential unavailable: {0}")]
    CredentialUnavailable(String),

    #[error("failed to create auth request: {0}")]
    RequestCreationFailed(String),

    #[error("error polling auth status")]
    PollTransportFailed,

    #[error("timeout waiting for user response after {0:?}")]
    PollTimeout(Duration),

    #[error("authentication DENIED by user")]
    RemoteDenied,

    #[error("authentication request {0}")]
    RemoteExpired(String),

    #[error("unknown status: {0}")]
    UnrecognizedRemoteStatus(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("unexpected error: {0}")]
    InternalFault(String),

    #[error("authentication cancelled by user")]
    Interrupted,
}

pub type GateResult<T> = std::result::Result<T, GateError>;
