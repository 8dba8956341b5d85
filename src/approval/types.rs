//! Types for the remote approval flow.

use crate::error::{GateError, GateResult};
use std::fmt;
use std::time::Duration;

/// Who is asking, from where, for what. Sent once per invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApprovalRequest {
    /// Local account requesting elevation
    pub username: String,
    /// Machine the request originates from
    pub hostname: String,
    /// Command or context string shown on the phone
    pub command: String,
}

/// What the server handed back for a freshly created request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestTicket {
    /// Server-issued opaque identifier
    pub request_id: String,
    /// Server-side expiry timestamp, informational only
    pub expires_at: Option<String>,
    /// Server-side lifetime in seconds, informational only
    pub expires_in: Option<u64>,
}

impl RequestTicket {
    pub fn new(request_id: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            expires_at: None,
            expires_in: None,
        }
    }
}

/// Classified value of the server's `status` field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteStatus {
    Pending,
    Approved,
    Denied,
    Expired,
    Timeout,
    /// The body had no `status` field
    Unknown,
    /// The poll call itself failed
    Error,
    /// Anything else the server chose to send
    Other(String),
}

impl RemoteStatus {
    /// Exact, case-sensitive match. A server that says "APPROVED" is not
    /// approving anything.
    pub fn parse(s: &str) -> Self {
        match s {
            "pending" => RemoteStatus::Pending,
            "approved" => RemoteStatus::Approved,
            "denied" => RemoteStatus::Denied,
            "expired" => RemoteStatus::Expired,
            "timeout" => RemoteStatus::Timeout,
            "unknown" => RemoteStatus::Unknown,
            "error" => RemoteStatus::Error,
            other => RemoteStatus::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            RemoteStatus::Pending => "pending",
            RemoteStatus::Approved => "approved",
            RemoteStatus::Denied => "denied",
            RemoteStatus::Expired => "expired",
            RemoteStatus::Timeout => "timeout",
            RemoteStatus::Unknown => "unknown",
            RemoteStatus::Error => "error",
            RemoteStatus::Other(s) => s,
        }
    }
}

impl fmt::Display for RemoteStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of one poll call. Produced fresh every time, never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollOutcome {
    /// Whether the call returned a usable 200 body
    pub success: bool,
    pub status: RemoteStatus,
    /// Optional human-readable note from the server
    pub message: Option<String>,
}

impl PollOutcome {
    pub fn fetched(status: RemoteStatus) -> Self {
        Self {
            success: true,
            status,
            message: None,
        }
    }

    /// A failed call always carries status "error".
    pub fn failed() -> Self {
        Self {
            success: false,
            status: RemoteStatus::Error,
            message: None,
        }
    }

    pub fn with_message(mut self, message: Option<String>) -> Self {
        self.message = message;
        self
    }
}

/// Where the polling state machine stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerminalState {
    Approved,
    Denied,
    /// Remote "expired" or "timeout"
    Expired(RemoteStatus),
    /// The poll call failed
    PollFailed,
    /// A status we do not act on, including "unknown"
    Unrecognized(RemoteStatus),
    /// The local deadline elapsed first
    Exhausted { elapsed: Duration, polls: u32 },
}

impl TerminalState {
    /// Collapse to the gate's result. Only `Approved` is `Ok`.
    pub fn into_result(self) -> GateResult<()> {
        match self {
            TerminalState::Approved => Ok(()),
            TerminalState::Denied => Err(GateError::RemoteDenied),
            TerminalState::Expired(status) => Err(GateError::RemoteExpired(status.to_string())),
            TerminalState::PollFailed => Err(GateError::PollTransportFailed),
            TerminalState::Unrecognized(status) => {
                Err(GateError::UnrecognizedRemoteStatus(status.to_string()))
            }
            TerminalState::Exhausted { elapsed, .. } => Err(GateError::PollTimeout(elapsed)),
        }
    }
}

/// The only thing the caller ever sees.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny,
}

impl Decision {
    /// 0 for allow, 1 for every kind of deny.
    pub fn exit_code(&self) -> i32 {
        match self {
            Decision::Allow => 0,
            Decision::Deny => 1,
        }
    }
}

impl<T> From<&GateResult<T>> for Decision {
    fn from(result: &GateResult<T>) -> Self {
        match result {
            Ok(_) => Decision::Allow,
            Err(_) => Decision::Deny,
        }
    }
}
