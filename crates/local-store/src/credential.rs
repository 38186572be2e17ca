use std::future::Future;

use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use sheet_cmd_core::Result;
use tracing::info;

/// Access tokens this close to expiry are refreshed before use.
pub const REFRESH_THRESHOLD_MINUTES: i64 = 5;

pub fn refresh_threshold() -> Duration {
    Duration::minutes(REFRESH_THRESHOLD_MINUTES)
}

/// OAuth token set owned by one account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    /// Milliseconds since the Unix epoch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry_date: Option<i64>,
}

impl Credential {
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expiry_date
            .and_then(|ms| Utc.timestamp_millis_opt(ms).single())
    }
}

/// Result of exchanging a refresh token.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefreshedToken {
    pub access_token: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

/// The remote half of a refresh: trade a refresh token for a new access token.
///
/// Implementations must report a rejected refresh token as
/// [`sheet_cmd_core::Error::AuthExpired`] so callers can tell it apart from a
/// transient failure.
pub trait TokenRefresher {
    fn refresh_access_token(
        &self,
        credential: &Credential,
    ) -> impl Future<Output = Result<RefreshedToken>> + Send;
}

/// True when the credential has no recorded expiry or expires within the
/// refresh threshold of `now`.
pub fn is_stale(credential: &Credential, now: DateTime<Utc>) -> bool {
    match credential.expires_at() {
        Some(expiry) => now >= expiry - refresh_threshold(),
        None => true,
    }
}

/// Exchange the refresh token and return the updated credential.
///
/// Client id, secret, and refresh token carry over unchanged. When the
/// exchange omits a field the previous value is kept. Persisting the result
/// is the caller's job.
pub async fn refresh<R: TokenRefresher>(credential: &Credential, refresher: &R) -> Result<Credential> {
    let fresh = refresher.refresh_access_token(credential).await?;
    info!(client_id = %credential.client_id, "refreshed access token");
    Ok(Credential {
        client_id: credential.client_id.clone(),
        client_secret: credential.client_secret.clone(),
        refresh_token: credential.refresh_token.clone(),
        access_token: fresh.access_token.or_else(|| credential.access_token.clone()),
        expiry_date: fresh
            .expires_at
            .map(|at| at.timestamp_millis())
            .or(credential.expiry_date),
    })
}
