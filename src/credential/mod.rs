//! Bearer credential loading.
//!
//! The token is provisioned out of band into a root-owned file. We only read
//! it: no caching, no refresh, no writes.

use crate::error::{GateError, GateResult};
use std::fmt;
use std::fs::Metadata;
use std::io;
use std::path::Path;

/// Opaque bearer token. Never empty.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Wrap an already-trimmed token. Returns None for blank input.
    pub fn new(token: impl Into<String>) -> Option<Self> {
        let token = token.into();
        let trimmed = token.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Value for the `Authorization` header.
    pub fn bearer_header(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

// Keep the token out of logs and panic messages.
impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

/// Read the bearer token from `path`.
///
/// Missing, unreadable and whitespace-only files all fail. Permissions that
/// grant group or other access are logged as a warning and otherwise ignored.
pub fn load_credential(path: &Path) -> GateResult<Credential> {
    let metadata = match std::fs::metadata(path) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            tracing::error!("Error: JWT token file not found at {}", path.display());
            return Err(GateError::CredentialUnavailable(format!(
                "{} does not exist",
                path.display()
            )));
        }
        Err(e) => {
            tracing::error!("Error accessing JWT token file {}: {}", path.display(), e);
            return Err(GateError::CredentialUnavailable(format!(
                "{}: {}",
                path.display(),
                e
            )));
        }
    };

    if is_group_or_world_accessible(&metadata) {
        tracing::warn!("Warning: JWT token file has insecure permissions");
    }

    let content = std::fs::read_to_string(path).map_err(|e| {
        tracing::error!("Error reading JWT token: {}", e);
        GateError::CredentialUnavailable(format!("{}: {}", path.display(), e))
    })?;

    match Credential::new(content) {
        Some(credential) => Ok(credential),
        None => {
            tracing::error!("Error: JWT token file is empty");
            Err(GateError::CredentialUnavailable(format!(
                "{} is empty",
                path.display()
            )))
        }
    }
}

#[cfg(unix)]
fn is_group_or_world_accessible(metadata: &Metadata) -> bool {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode() & 0o077 != 0
}

#[cfg(not(unix))]
fn is_group_or_world_accessible(_metadata: &Metadata) -> bool {
    false
}
