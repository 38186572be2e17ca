//! Google OAuth 2.0 for installed apps: consent URL, code exchange,
//! refresh, and the signed-in user's email.

use chrono::{Duration, Utc};
use serde::Deserialize;
use sheet_cmd_core::{Error, Result};
use sheet_cmd_local_store::{Credential, RefreshedToken, TokenRefresher};
use tracing::debug;

use crate::http::{OAuthErrorBody, default_client, error_message, parse_response, transport};
use crate::retry::{RetryConfig, send_with_retry};

pub const AUTHORIZE_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
pub const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
pub const USERINFO_URL: &str = "https://www.googleapis.com/oauth2/v2/userinfo";

pub const SCOPES: &[&str] = &[
    "https://www.googleapis.com/auth/spreadsheets",
    "https://www.googleapis.com/auth/drive.readonly",
    "https://www.googleapis.com/auth/userinfo.email",
];

/// The user-supplied OAuth client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OAuthApp {
    pub client_id: String,
    pub client_secret: String,
}

/// Which grant a token request carries; decides how `invalid_grant` reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Grant {
    AuthorizationCode,
    RefreshToken,
}

#[derive(Debug, Clone)]
pub struct OAuthEndpoints {
    pub authorize: String,
    pub token: String,
    pub userinfo: String,
}

impl Default for OAuthEndpoints {
    fn default() -> Self {
        Self {
            authorize: AUTHORIZE_URL.to_string(),
            token: TOKEN_URL.to_string(),
            userinfo: USERINFO_URL.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    refresh_token: Option<String>,
    expires_in: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct UserInfo {
    email: Option<String>,
}

pub struct OAuthClient {
    client: reqwest::Client,
    endpoints: OAuthEndpoints,
    retry: RetryConfig,
}

impl OAuthClient {
    pub fn new() -> Result<Self> {
        Ok(Self::with_client(default_client()?, OAuthEndpoints::default()))
    }

    pub fn with_client(client: reqwest::Client, endpoints: OAuthEndpoints) -> Self {
        Self {
            client,
            endpoints,
            retry: RetryConfig::default(),
        }
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Consent URL that sends the browser back to `redirect_uri` with a
    /// one-time code. `prompt=consent` forces a refresh token every time.
    pub fn authorize_url(&self, app: &OAuthApp, redirect_uri: &str, state: &str) -> Result<String> {
        let scope = SCOPES.join(" ");
        let url = url::Url::parse_with_params(
            &self.endpoints.authorize,
            &[
                ("client_id", app.client_id.as_str()),
                ("redirect_uri", redirect_uri),
                ("response_type", "code"),
                ("scope", scope.as_str()),
                ("access_type", "offline"),
                ("prompt", "consent"),
                ("state", state),
            ],
        )
        .map_err(|e| Error::Auth(format!("invalid authorize endpoint: {e}")))?;
        Ok(url.into())
    }

    /// Trade the authorization code for a full credential.
    pub async fn exchange_code(
        &self,
        app: &OAuthApp,
        code: &str,
        redirect_uri: &str,
    ) -> Result<Credential> {
        let request = self.client.post(&self.endpoints.token).form(&[
            ("grant_type", "authorization_code"),
            ("code", code),
            ("client_id", app.client_id.as_str()),
            ("client_secret", app.client_secret.as_str()),
            ("redirect_uri", redirect_uri),
        ]);
        let token = self.token_request(request, Grant::AuthorizationCode).await?;
        let refresh_token = token.refresh_token.ok_or_else(|| {
            Error::Auth(
                "Google did not return a refresh token; remove the app's access in your Google account and try again"
                    .to_string(),
            )
        })?;
        debug!("exchanged authorization code");
        Ok(Credential {
            client_id: app.client_id.clone(),
            client_secret: app.client_secret.clone(),
            refresh_token,
            access_token: token.access_token,
            expiry_date: token
                .expires_in
                .map(|secs| (Utc::now() + Duration::seconds(secs)).timestamp_millis()),
        })
    }

    /// Email of the user the access token belongs to.
    pub async fn fetch_email(&self, access_token: &str) -> Result<String> {
        let request = self
            .client
            .get(&self.endpoints.userinfo)
            .bearer_auth(access_token);
        let resp = send_with_retry(request, &self.retry).await?;
        let info: UserInfo = parse_response(resp).await?;
        info.email
            .filter(|email| !email.is_empty())
            .ok_or_else(|| Error::Auth("Google did not report an email for this account".to_string()))
    }

    async fn token_request(
        &self,
        request: reqwest::RequestBuilder,
        grant: Grant,
    ) -> Result<TokenResponse> {
        let resp = send_with_retry(request, &self.retry).await?;
        let status = resp.status();
        if status.is_success() {
            return resp.json().await.map_err(transport);
        }
        let body = resp.text().await.unwrap_or_default();
        let invalid_grant = status == reqwest::StatusCode::BAD_REQUEST
            && serde_json::from_str::<OAuthErrorBody>(&body)
                .is_ok_and(|err| err.error == "invalid_grant");
        match grant {
            // The store fills in the account email.
            Grant::RefreshToken if invalid_grant => Err(Error::AuthExpired(String::new())),
            Grant::AuthorizationCode if invalid_grant => Err(Error::Auth(format!(
                "authorization code was rejected (expired or already used), sign in again: {}",
                error_message(status, &body)
            ))),
            _ => Err(Error::Auth(error_message(status, &body))),
        }
    }
}

impl TokenRefresher for OAuthClient {
    async fn refresh_access_token(&self, credential: &Credential) -> Result<RefreshedToken> {
        let request = self.client.post(&self.endpoints.token).form(&[
            ("grant_type", "refresh_token"),
            ("refresh_token", credential.refresh_token.as_str()),
            ("client_id", credential.client_id.as_str()),
            ("client_secret", credential.client_secret.as_str()),
        ]);
        let token = self.token_request(request, Grant::RefreshToken).await?;
        Ok(RefreshedToken {
            access_token: token.access_token,
            expires_at: token
                .expires_in
                .map(|secs| Utc::now() + Duration::seconds(secs)),
        })
    }
}
