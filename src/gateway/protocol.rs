//! Wire types for the approval server's biometric endpoints.
//!
//! `POST /api/auth/biometric/request` takes a [`CreateAuthRequest`] and answers
//! `201` with a [`CreateAuthResponse`]. `GET /api/auth/biometric/poll/{id}`
//! answers `200` with a [`PollStatusResponse`].

use crate::approval::types::ApprovalRequest;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const CREATE_REQUEST_PATH: &str = "/api/auth/biometric/request";
pub const POLL_PATH_PREFIX: &str = "/api/auth/biometric/poll/";

/// Body of the create call.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CreateAuthRequest {
    pub username: String,
    pub hostname: String,
    pub command: String,
}

impl From<&ApprovalRequest> for CreateAuthRequest {
    fn from(request: &ApprovalRequest) -> Self {
        Self {
            username: request.username.clone(),
            hostname: request.hostname.clone(),
            command: request.command.clone(),
        }
    }
}

/// Body of a `201 Created` answer.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateAuthResponse {
    #[serde(default)]
    pub request_id: Option<String>,

    /// RFC 3339 timestamp after which the server expires the request
    #[serde(default)]
    pub expires_at: Option<String>,

    /// Server-side lifetime in seconds
    #[serde(default)]
    pub expires_in: Option<u64>,
}

/// Body of a `200 OK` poll answer.
#[derive(Debug, Clone, Deserialize)]
pub struct PollStatusResponse {
    #[serde(default)]
    pub status: Option<String>,

    #[serde(default)]
    pub message: Option<String>,
}

/// Status reported when the poll body has no `status` field.
pub const MISSING_STATUS: &str = "unknown";

/// Decode a response body that must be a JSON object.
///
/// serde's struct derive also accepts a sequence, so `["approved"]` would
/// otherwise fill the first field. Anything but an object is rejected here.
pub fn decode_object<T: DeserializeOwned>(body: &str) -> Result<T, String> {
    let value: Value = serde_json::from_str(body).map_err(|e| e.to_string())?;
    if !value.is_object() {
        return Err(format!("expected a JSON object, got {}", json_kind(&value)));
    }
    serde_json::from_value(value).map_err(|e| e.to_string())
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
