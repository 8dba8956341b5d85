//! bioauth-gate — biometric approval hook for sudo.
//!
//! PAM runs this binary (via pam_exec or a wrapper) before granting elevated
//! rights. It asks the approval server to push a request to the user's phone,
//! waits for the answer, and reports it through the exit status:
//!   - Exits 0 (the user approved)
//!   - Exits 1 (anything else: denied, expired, timed out, broken, interrupted)
//!
//! All diagnostics go to stderr, tagged `[RoamieBioSudo]`.
//!
//! Usage:
//!   bioauth-gate [OPTIONS] [COMMAND]...
//!
//! The trailing words become the context string shown on the phone. Without
//! them the gate falls back to `$PAM_RHOST`, then to "sudo".
//!
//! Server URL, token file and config path come from flags or the config file
//! only. The environment under sudo/PAM belongs to the caller, so it must not
//! be able to redirect the gate to a server that approves everything.

use bioauth_gate::approval::{ApprovalRequest, Decision, LifecycleController};
use bioauth_gate::config::{load_config, ConfigOverrides};
use bioauth_gate::error::{GateError, GateResult};
use bioauth_gate::gateway::GatewayClient;
use bioauth_gate::utils::identity;
use bioauth_gate::utils::logging::init_logging;
use clap::Parser;
use std::path::PathBuf;
use std::process;

/// Ask your phone before sudo says yes.
#[derive(Parser, Debug)]
#[command(
    name = "bioauth-gate",
    version,
    about = "Approve privileged access with a biometric check on your phone"
)]
struct Cli {
    /// YAML config file (default: /etc/roamie/bioauth.yaml when present)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Approval server base URL
    #[arg(long, value_name = "URL")]
    server_url: Option<String>,

    /// File holding the bearer token
    #[arg(long, value_name = "PATH")]
    token_file: Option<PathBuf>,

    /// Give up locally after this many seconds of polling
    #[arg(long, value_name = "SECS")]
    deadline_secs: Option<u64>,

    /// Seconds between two polls
    #[arg(long, value_name = "SECS")]
    poll_interval_secs: Option<u64>,

    /// Timeout for each HTTP call, in seconds
    #[arg(long, value_name = "SECS")]
    request_timeout_secs: Option<u64>,

    /// Log debug detail to stderr
    #[arg(short, long)]
    verbose: bool,

    /// Command or context being authorized
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    command: Vec<String>,
}

impl Cli {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            server_url: self.server_url.clone(),
            token_file: self.token_file.clone(),
            deadline_secs: self.deadline_secs,
            poll_interval_secs: self.poll_interval_secs,
            request_timeout_secs: self.request_timeout_secs,
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // --help and --version land here too. Only an approval exits 0.
            let _ = e.print();
            process::exit(Decision::Deny.exit_code());
        }
    };

    init_logging(cli.verbose);

    let remote_host = std::env::var(identity::REMOTE_HOST_ENV).ok();
    let command = identity::command_context(&cli.command, remote_host.as_deref());
    tracing::info!("Biometric authentication requested for: {}", command);

    let result = tokio::select! {
        result = authenticate(&cli, command) => result,
        _ = wait_for_interrupt() => Err(GateError::Interrupted),
    };

    let decision = report(&result);
    process::exit(decision.exit_code());
}

/// Build everything from the CLI and run the lifecycle in its own task, so a
/// panic anywhere inside it still ends as a denial.
async fn authenticate(cli: &Cli, command: String) -> GateResult<()> {
    let config = load_config(cli.config.as_deref(), &cli.overrides())
        .map_err(|e| GateError::Config(format!("{:#}", e)))?;
    tracing::debug!("Using approval server {}", config.base_url);

    let client = GatewayClient::from_config(&config)?;
    let controller = LifecycleController::new(client, config);

    let request = ApprovalRequest {
        username: identity::current_username(),
        hostname: identity::local_hostname(),
        command,
    };

    let task = tokio::spawn(async move { controller.run(&request).await });
    match task.await {
        Ok(result) => result,
        Err(e) => Err(GateError::InternalFault(e.to_string())),
    }
}

/// Resolves on SIGINT or SIGTERM. A handler that cannot be installed simply
/// never fires.
async fn wait_for_interrupt() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::debug!("Cannot listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    tokio::select! {
        _ = ctrl_c => {}
        _ = wait_for_sigterm() => {}
    }
}

#[cfg(unix)]
async fn wait_for_sigterm() {
    use tokio::signal::unix::{signal, SignalKind};

    match signal(SignalKind::terminate()) {
        Ok(mut sigterm) => {
            sigterm.recv().await;
        }
        Err(e) => {
            tracing::debug!("Cannot listen for SIGTERM: {}", e);
            std::future::pending::<()>().await
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_sigterm() {
    std::future::pending::<()>().await
}

/// Log the final word and collapse the result to a decision.
fn report(result: &GateResult<()>) -> Decision {
    match result {
        Ok(()) => tracing::info!("Authentication SUCCESSFUL"),
        Err(e) => {
            match e {
                GateError::Interrupted => tracing::warn!("{}", e),
                GateError::CredentialUnavailable(_)
                | GateError::RequestCreationFailed(_)
                | GateError::Config(_)
                | GateError::InternalFault(_) => tracing::error!("{}", e),
                // The lifecycle already logged how polling ended.
                _ => tracing::debug!("{}", e),
            }
            tracing::info!("Authentication FAILED");
        }
    }
    Decision::from(result)
}
