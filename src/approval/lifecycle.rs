//! Request lifecycle: create one request, then poll it to a terminal state.
//!
//! ```text
//! Created ──▶ Polling ──┬──▶ Approved            (allow)
//!                ▲      ├──▶ Denied              (deny)
//!                │      ├──▶ Expired / Timeout   (deny)
//!             pending   ├──▶ Error               (deny: failed poll or unknown status)
//!                └──────┴──▶ Exhausted           (deny: local deadline)
//! ```
//!
//! The local deadline is checked before every poll and is independent of
//! whatever the server claims. A single failed poll is terminal; only
//! `pending` loops.

use crate::approval::types::{ApprovalRequest, RemoteStatus, TerminalState};
use crate::approval::ApprovalBackend;
use crate::config::GateConfig;
use crate::credential::{load_credential, Credential};
use crate::error::GateResult;
use tokio::time::Instant;

/// Drives one approval request from creation to a decision.
pub struct LifecycleController<B> {
    backend: B,
    config: GateConfig,
}

impl<B: ApprovalBackend> LifecycleController<B> {
    pub fn new(backend: B, config: GateConfig) -> Self {
        Self { backend, config }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Full invocation. `Ok(())` means the user approved; every `Err` is a
    /// denial with its reason.
    ///
    /// The credential is loaded first, so a missing token never reaches the
    /// backend.
    pub async fn run(&self, request: &ApprovalRequest) -> GateResult<()> {
        let credential = load_credential(&self.config.credential_path)?;

        tracing::info!(
            "Creating auth request for {}@{}",
            request.username,
            request.hostname
        );
        let ticket = self.backend.create_request(&credential, request).await?;
        tracing::info!("Auth request created: {}", ticket.request_id);
        if let Some(expires_in) = ticket.expires_in {
            tracing::debug!("Server expires request in {}s", expires_in);
        }

        self.wait_for_decision(&credential, &ticket.request_id)
            .await
            .into_result()
    }

    /// Poll `request_id` until it resolves or the deadline elapses.
    pub async fn wait_for_decision(
        &self,
        credential: &Credential,
        request_id: &str,
    ) -> TerminalState {
        let start = Instant::now();
        let mut polls: u32 = 0;

        tracing::info!("Waiting for user response...");

        loop {
            let elapsed = start.elapsed();
            if elapsed > self.config.overall_deadline {
                tracing::warn!("Timeout waiting for user response");
                return TerminalState::Exhausted { elapsed, polls };
            }

            let outcome = self.backend.poll_once(credential, request_id).await;
            polls += 1;

            if !outcome.success {
                tracing::error!("Error polling auth status");
                return TerminalState::PollFailed;
            }
            if let Some(message) = &outcome.message {
                tracing::debug!("Server message: {}", message);
            }

            match outcome.status {
                RemoteStatus::Approved => {
                    tracing::info!("Authentication APPROVED by user");
                    return TerminalState::Approved;
                }
                RemoteStatus::Denied => {
                    tracing::info!("Authentication DENIED by user");
                    return TerminalState::Denied;
                }
                status @ (RemoteStatus::Expired | RemoteStatus::Timeout) => {
                    tracing::info!("Authentication request {}", status);
                    return TerminalState::Expired(status);
                }
                RemoteStatus::Pending => {
                    tracing::debug!("Request {} still pending (poll {})", request_id, polls);
                    tokio::time::sleep(self.config.poll_interval).await;
                }
                other => {
                    tracing::warn!("Unknown status: {}", other);
                    return TerminalState::Unrecognized(other);
                }
            }
        }
    }
}
