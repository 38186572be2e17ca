use std::time::Duration;

use serde::Deserialize;
use serde::de::DeserializeOwned;
use sheet_cmd_core::{Error, Result};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Shared `reqwest::Client` with the default timeout.
pub fn default_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(DEFAULT_TIMEOUT)
        .build()
        .map_err(transport)
}

pub(crate) fn transport(err: reqwest::Error) -> Error {
    Error::Remote(err.to_string())
}

/// Google API error envelope: `{"error": {"code": 404, "message": "..."}}`.
#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: Option<String>,
}

/// OAuth token endpoint error: `{"error": "invalid_grant", "error_description": "..."}`.
#[derive(Debug, Deserialize)]
pub(crate) struct OAuthErrorBody {
    pub error: String,
    #[serde(default)]
    pub error_description: Option<String>,
}

/// Turn a non-2xx body into a readable message, falling back to raw text.
pub(crate) fn error_message(status: reqwest::StatusCode, body: &str) -> String {
    if let Ok(envelope) = serde_json::from_str::<ApiErrorEnvelope>(body) {
        return match envelope.error.status {
            Some(kind) => format!("{status} {kind}: {}", envelope.error.message),
            None => format!("{status}: {}", envelope.error.message),
        };
    }
    if let Ok(oauth) = serde_json::from_str::<OAuthErrorBody>(body) {
        return match oauth.error_description {
            Some(desc) => format!("{status} {}: {desc}", oauth.error),
            None => format!("{status} {}", oauth.error),
        };
    }
    format!("{status}: {}", body.trim())
}

/// Parse an HTTP response: return the deserialized body on 2xx,
/// or a remote error containing the status and message.
pub(crate) async fn parse_response<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T> {
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(Error::Remote(error_message(status, &body)));
    }
    resp.json().await.map_err(transport)
}

/// Like [`parse_response`] for endpoints whose body we ignore.
pub(crate) async fn expect_success(resp: reqwest::Response) -> Result<()> {
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(Error::Remote(error_message(status, &body)));
    }
    Ok(())
}
