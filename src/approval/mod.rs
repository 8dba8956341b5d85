pub mod lifecycle;
pub mod types;

use crate::credential::Credential;
use crate::error::GateResult;
use async_trait::async_trait;

pub use lifecycle::LifecycleController;
pub use types::*;

/// The two calls the lifecycle needs from an approval server.
/// `GatewayClient` talks HTTP; tests script the answers.
#[async_trait]
pub trait ApprovalBackend: Send + Sync {
    /// Create one pending request. Any failure is `RequestCreationFailed`.
    async fn create_request(
        &self,
        credential: &Credential,
        request: &ApprovalRequest,
    ) -> GateResult<RequestTicket>;

    /// Fetch the current status once. Never retries; failures come back as
    /// `PollOutcome::failed()`.
    async fn poll_once(&self, credential: &Credential, request_id: &str) -> PollOutcome;
}
