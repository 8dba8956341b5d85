//! Runtime configuration for one gate invocation.

use std::path::PathBuf;
use std::time::Duration;

/// Where the bearer token lives unless overridden.
pub const DEFAULT_CREDENTIAL_PATH: &str = "/root/.roamie_jwt";

/// Approval server reachable over the VPN.
pub const DEFAULT_BASE_URL: &str = "http://10.100.0.1:8080";

/// Optional system-wide config file, read only when present.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/roamie/bioauth.yaml";

pub const DEFAULT_OVERALL_DEADLINE: Duration = Duration::from_secs(30);
pub const DEFAULT_PER_CALL_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Everything the lifecycle controller and gateway client need to know.
/// Built once at startup and passed down explicitly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateConfig {
    /// File holding the bearer token
    pub credential_path: PathBuf,
    /// Approval server root, without a trailing slash
    pub base_url: String,
    /// Local wall-clock budget for the whole polling phase
    pub overall_deadline: Duration,
    /// Timeout applied to each individual HTTP call
    pub per_call_timeout: Duration,
    /// Sleep between two polls while the request is pending
    pub poll_interval: Duration,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            credential_path: PathBuf::from(DEFAULT_CREDENTIAL_PATH),
            base_url: DEFAULT_BASE_URL.to_string(),
            overall_deadline: DEFAULT_OVERALL_DEADLINE,
            per_call_timeout: DEFAULT_PER_CALL_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

/// Values supplied on the command line or through the environment.
/// `None` means "keep whatever the lower layer said".
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub server_url: Option<String>,
    pub token_file: Option<PathBuf>,
    pub deadline_secs: Option<u64>,
    pub poll_interval_secs: Option<u64>,
    pub request_timeout_secs: Option<u64>,
}
