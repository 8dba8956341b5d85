//! Lifecycle state machine tests against a scripted backend.
//!
//! The tokio clock is paused, so the 2s interval and 30s deadline are exact
//! and the tests finish instantly.

use async_trait::async_trait;
use bioauth_gate::approval::{
    ApprovalBackend, ApprovalRequest, LifecycleController, PollOutcome, RemoteStatus,
    RequestTicket, TerminalState,
};
use bioauth_gate::config::GateConfig;
use bioauth_gate::credential::Credential;
use bioauth_gate::error::{GateError, GateResult};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tempfile::TempDir;

/// Answers polls from a script; once the script runs out it keeps answering
/// with `fallback`.
struct ScriptedBackend {
    create_fails: bool,
    script: Mutex<VecDeque<PollOutcome>>,
    fallback: PollOutcome,
    create_calls: AtomicU32,
    poll_calls: AtomicU32,
    seen_ids: Mutex<Vec<String>>,
}

impl ScriptedBackend {
    fn new(statuses: &[&str]) -> Self {
        Self {
            create_fails: false,
            script: Mutex::new(
                statuses
                    .iter()
                    .map(|s| PollOutcome::fetched(RemoteStatus::parse(s)))
                    .collect(),
            ),
            fallback: PollOutcome::fetched(RemoteStatus::Pending),
            create_calls: AtomicU32::new(0),
            poll_calls: AtomicU32::new(0),
            seen_ids: Mutex::new(Vec::new()),
        }
    }

    fn with_outcomes(outcomes: Vec<PollOutcome>) -> Self {
        let backend = Self::new(&[]);
        *backend.script.lock().unwrap() = outcomes.into();
        backend
    }

    fn failing_create() -> Self {
        Self {
            create_fails: true,
            ..Self::new(&[])
        }
    }

    fn creates(&self) -> u32 {
        self.create_calls.load(Ordering::SeqCst)
    }

    fn polls(&self) -> u32 {
        self.poll_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ApprovalBackend for ScriptedBackend {
    async fn create_request(
        &self,
        _credential: &Credential,
        _request: &ApprovalRequest,
    ) -> GateResult<RequestTicket> {
        let n = self.create_calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.create_fails {
            return Err(GateError::RequestCreationFailed("status 500".to_string()));
        }
        Ok(RequestTicket::new(format!("req-{}", n)))
    }

    async fn poll_once(&self, _credential: &Credential, request_id: &str) -> PollOutcome {
        self.poll_calls.fetch_add(1, Ordering::SeqCst);
        self.seen_ids.lock().unwrap().push(request_id.to_string());
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone())
    }
}

fn sample_request() -> ApprovalRequest {
    ApprovalRequest {
        username: "alice".to_string(),
        hostname: "workstation".to_string(),
        command: "apt install vim".to_string(),
    }
}

/// Config pointing at a fresh token file holding `token`.
fn config_with_token(token: &str) -> (GateConfig, TempDir) {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("jwt");
    std::fs::write(&path, token).unwrap();
    let config = GateConfig {
        credential_path: path,
        ..GateConfig::default()
    };
    (config, tmp)
}

#[tokio::test(start_paused = true)]
async fn test_pending_then_approved() {
    let (config, _tmp) = config_with_token("token");
    let controller =
        LifecycleController::new(ScriptedBackend::new(&["pending", "pending", "approved"]), config);

    let result = controller.run(&sample_request()).await;

    assert!(result.is_ok());
    assert_eq!(controller.backend().creates(), 1);
    assert_eq!(controller.backend().polls(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_pending_then_denied() {
    let (config, _tmp) = config_with_token("token");
    let controller = LifecycleController::new(ScriptedBackend::new(&["pending", "denied"]), config);

    let result = controller.run(&sample_request()).await;

    assert!(matches!(result, Err(GateError::RemoteDenied)));
    assert_eq!(controller.backend().polls(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_pending_forever_exhausts_deadline() {
    let (config, _tmp) = config_with_token("token");
    let controller = LifecycleController::new(ScriptedBackend::new(&[]), config);

    let start = tokio::time::Instant::now();
    let result = controller.run(&sample_request()).await;

    assert!(matches!(result, Err(GateError::PollTimeout(_))));
    // floor(30s / 2s) = 15, give or take one
    let polls = controller.backend().polls();
    assert!((14..=16).contains(&polls), "polls = {}", polls);
    assert!(start.elapsed() > Duration::from_secs(30));
    assert!(start.elapsed() <= Duration::from_secs(34));
}

#[tokio::test(start_paused = true)]
async fn test_exhausted_state_reports_polls() {
    let config = GateConfig {
        overall_deadline: Duration::from_secs(11),
        poll_interval: Duration::from_secs(2),
        ..GateConfig::default()
    };
    let controller = LifecycleController::new(ScriptedBackend::new(&[]), config);
    let credential = Credential::new("token").unwrap();

    let state = controller.wait_for_decision(&credential, "req-x").await;

    match state {
        TerminalState::Exhausted { elapsed, polls } => {
            // Polls at 0, 2, 4, 6, 8, 10; the check at 12 gives up.
            assert_eq!(polls, 6);
            assert!(elapsed > Duration::from_secs(11));
            assert!(elapsed < Duration::from_secs(13));
        }
        other => panic!("expected Exhausted, got {:?}", other),
    }
}

#[tokio::test(start_paused = true)]
async fn test_failed_poll_is_terminal() {
    let (config, _tmp) = config_with_token("token");
    let backend = ScriptedBackend::with_outcomes(vec![
        PollOutcome::fetched(RemoteStatus::Pending),
        PollOutcome::failed(),
        PollOutcome::fetched(RemoteStatus::Approved),
    ]);
    let controller = LifecycleController::new(backend, config);

    let result = controller.run(&sample_request()).await;

    assert!(matches!(result, Err(GateError::PollTransportFailed)));
    // The approval queued after the failure is never fetched.
    assert_eq!(controller.backend().polls(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_unrecognized_status_denies() {
    for status in ["weird_value", "unknown", "APPROVED", "approved "] {
        let (config, _tmp) = config_with_token("token");
        let controller = LifecycleController::new(ScriptedBackend::new(&[status]), config);

        let result = controller.run(&sample_request()).await;

        assert!(
            matches!(result, Err(GateError::UnrecognizedRemoteStatus(_))),
            "status {:?} gave {:?}",
            status,
            result
        );
        assert_eq!(controller.backend().polls(), 1);
    }
}

#[tokio::test(start_paused = true)]
async fn test_expired_and_timeout_deny() {
    for status in ["expired", "timeout"] {
        let (config, _tmp) = config_with_token("token");
        let controller =
            LifecycleController::new(ScriptedBackend::new(&["pending", status]), config);

        match controller.run(&sample_request()).await {
            Err(GateError::RemoteExpired(s)) => assert_eq!(s, status),
            other => panic!("expected RemoteExpired, got {:?}", other),
        }
    }
}

#[tokio::test(start_paused = true)]
async fn test_missing_credential_never_reaches_backend() {
    let tmp = TempDir::new().unwrap();
    let config = GateConfig {
        credential_path: tmp.path().join("absent"),
        ..GateConfig::default()
    };
    let controller = LifecycleController::new(ScriptedBackend::new(&["approved"]), config);

    let result = controller.run(&sample_request()).await;

    assert!(matches!(result, Err(GateError::CredentialUnavailable(_))));
    assert_eq!(controller.backend().creates(), 0);
    assert_eq!(controller.backend().polls(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_blank_credential_never_reaches_backend() {
    let (config, _tmp) = config_with_token("   \n\n");
    let controller = LifecycleController::new(ScriptedBackend::new(&["approved"]), config);

    let result = controller.run(&sample_request()).await;

    assert!(matches!(result, Err(GateError::CredentialUnavailable(_))));
    assert_eq!(controller.backend().creates(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_failed_creation_skips_polling() {
    let (config, _tmp) = config_with_token("token");
    let controller = LifecycleController::new(ScriptedBackend::failing_create(), config);

    let result = controller.run(&sample_request()).await;

    assert!(matches!(result, Err(GateError::RequestCreationFailed(_))));
    assert_eq!(controller.backend().creates(), 1);
    assert_eq!(controller.backend().polls(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_each_run_creates_its_own_request() {
    let (config, _tmp) = config_with_token("token");
    let controller = LifecycleController::new(ScriptedBackend::new(&["denied", "approved"]), config);

    assert!(controller.run(&sample_request()).await.is_err());
    assert!(controller.run(&sample_request()).await.is_ok());

    assert_eq!(controller.backend().creates(), 2);
    let seen = controller.backend().seen_ids.lock().unwrap().clone();
    assert_eq!(seen, vec!["req-1".to_string(), "req-2".to_string()]);
}
