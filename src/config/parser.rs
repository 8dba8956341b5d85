//! YAML config file parser and layering.
//!
//! Precedence, lowest first: built-in defaults, the YAML file, then CLI flags
//! (which clap already merged with their environment variables).
//!
//! # Example config file:
//! ```yaml
//! server_url: https://vpn.example.com:8080
//! token_file: /root/.roamie_jwt
//! deadline_secs: 45
//! poll_interval_secs: 2
//! request_timeout_secs: 5
//! ```

use crate::config::types::{ConfigOverrides, GateConfig, DEFAULT_CONFIG_PATH};
use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Raw YAML representation. Every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    #[serde(default)]
    server_url: Option<String>,
    #[serde(default)]
    token_file: Option<PathBuf>,
    #[serde(default)]
    deadline_secs: Option<u64>,
    #[serde(default)]
    poll_interval_secs: Option<u64>,
    #[serde(default)]
    request_timeout_secs: Option<u64>,
}

impl RawConfig {
    fn into_overrides(self) -> ConfigOverrides {
        ConfigOverrides {
            server_url: self.server_url,
            token_file: self.token_file,
            deadline_secs: self.deadline_secs,
            poll_interval_secs: self.poll_interval_secs,
            request_timeout_secs: self.request_timeout_secs,
        }
    }
}

/// Parse a YAML config string into overrides on top of the defaults.
pub fn parse_config_str(yaml: &str) -> Result<ConfigOverrides> {
    // An empty file deserializes to unit, not a map.
    if yaml.trim().is_empty() {
        return Ok(ConfigOverrides::default());
    }
    let raw: RawConfig = serde_yaml::from_str(yaml).context("Invalid YAML syntax in config file")?;
    Ok(raw.into_overrides())
}

/// Parse a YAML config file from a path.
pub fn parse_config_file(path: impl AsRef<Path>) -> Result<ConfigOverrides> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    parse_config_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Build the final configuration.
///
/// `explicit_path` comes from `--config` and must exist.
/// Without it the system-wide default path is used only if it exists.
pub fn load_config(explicit_path: Option<&Path>, cli: &ConfigOverrides) -> Result<GateConfig> {
    let file = match explicit_path {
        Some(path) => Some(parse_config_file(path)?),
        None => {
            let default = Path::new(DEFAULT_CONFIG_PATH);
            if default.exists() {
                Some(parse_config_file(default)?)
            } else {
                None
            }
        }
    };

    let mut config = GateConfig::default();
    if let Some(file) = &file {
        apply_overrides(&mut config, file).context("Invalid value in config file")?;
    }
    apply_overrides(&mut config, cli).context("Invalid command-line option")?;
    Ok(config)
}

/// Layer `overrides` onto `config`, validating every value it sets.
pub fn apply_overrides(config: &mut GateConfig, overrides: &ConfigOverrides) -> Result<()> {
    if let Some(url) = &overrides.server_url {
        config.base_url = normalize_base_url(url)?;
    }
    if let Some(path) = &overrides.token_file {
        if path.as_os_str().is_empty() {
            bail!("token_file must not be empty");
        }
        config.credential_path = path.clone();
    }
    if let Some(secs) = overrides.deadline_secs {
        config.overall_deadline = positive_secs("deadline_secs", secs)?;
    }
    if let Some(secs) = overrides.poll_interval_secs {
        config.poll_interval = positive_secs("poll_interval_secs", secs)?;
    }
    if let Some(secs) = overrides.request_timeout_secs {
        config.per_call_timeout = positive_secs("request_timeout_secs", secs)?;
    }
    Ok(())
}

fn positive_secs(key: &str, secs: u64) -> Result<Duration> {
    if secs == 0 {
        bail!("{} must be greater than zero", key);
    }
    Ok(Duration::from_secs(secs))
}

/// Validate the scheme and strip trailing slashes so paths can be appended.
pub fn normalize_base_url(url: &str) -> Result<String> {
    let trimmed = url.trim().trim_end_matches('/');
    // "http://" alone trims to "http:" and fails here too.
    if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
        bail!("server_url must start with http:// or https:// (got '{}')", url);
    }
    Ok(trimmed.to_string())
}
