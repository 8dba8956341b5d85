//! bioauth-gate — remote biometric approval for privileged access.
//!
//! A PAM hook (or anything else that understands exit codes) runs the
//! `bioauth-gate` binary before granting elevated rights. The gate asks the
//! approval server to create a request, the user's phone gets a push, and the
//! gate polls until the request resolves or the local deadline runs out.
//!
//! Everything that is not an explicit approval is a denial.

pub mod approval;
pub mod config;
pub mod credential;
pub mod error;
pub mod gateway;
pub mod utils;

pub use error::{GateError, GateResult};
