//! Requester identity and command context.
//!
//! None of these functions fail. Anything we cannot determine becomes a
//! fixed placeholder, and the server decides what to do with it.

/// Placeholder for an unknown user or host.
pub const UNKNOWN: &str = "unknown";

/// Context label when neither arguments nor `PAM_RHOST` say anything.
pub const DEFAULT_COMMAND: &str = "sudo";

/// Environment variable PAM sets to the remote host, if any.
pub const REMOTE_HOST_ENV: &str = "PAM_RHOST";

/// Arguments joined by spaces, else the remote-host hint, else "sudo".
/// Blank values fall through to the next source.
pub fn command_context(args: &[String], remote_host: Option<&str>) -> String {
    let joined = args.join(" ");
    if !joined.trim().is_empty() {
        return joined;
    }
    match remote_host {
        Some(host) if !host.trim().is_empty() => host.to_string(),
        _ => DEFAULT_COMMAND.to_string(),
    }
}

/// `$USER`, or "unknown".
pub fn current_username() -> String {
    username_from(std::env::var("USER").ok())
}

fn username_from(value: Option<String>) -> String {
    match value {
        Some(user) if !user.trim().is_empty() => user,
        _ => UNKNOWN.to_string(),
    }
}

/// The local hostname from gethostname(2), or "unknown".
pub fn local_hostname() -> String {
    gethostname().unwrap_or_else(|| UNKNOWN.to_string())
}

#[cfg(unix)]
fn gethostname() -> Option<String> {
    use std::ffi::CStr;

    // HOST_NAME_MAX is 64 on Linux and 255 elsewhere.
    let mut buf = [0u8; 256];
    // SAFETY: buf is valid for buf.len() bytes, and we force a terminating
    // NUL below in case the name was truncated.
    let rc = unsafe { libc::gethostname(buf.as_mut_ptr().cast::<libc::c_char>(), buf.len() - 1) };
    if rc != 0 {
        return None;
    }
    let last = buf.len() - 1;
    buf[last] = 0;

    let name = CStr::from_bytes_until_nul(&buf).ok()?.to_string_lossy();
    let name = name.trim();
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

#[cfg(not(unix))]
fn gethostname() -> Option<String> {
    std::env::var("COMPUTERNAME").ok()
}
