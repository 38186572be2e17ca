use std::time::Duration;

use sheet_cmd_core::{Error, Result};
use tracing::warn;

use crate::http::transport;

/// Backoff schedule for idempotent-enough Google API calls.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub max_retries: usize,
    pub delays: Vec<u64>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            delays: vec![1, 2, 4],
        }
    }
}

impl RetryConfig {
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            delays: Vec::new(),
        }
    }
}

fn is_retryable(status: reqwest::StatusCode) -> bool {
    status.is_server_error() || status == reqwest::StatusCode::TOO_MANY_REQUESTS
}

/// Send a request with exponential backoff.
///
/// Retries on network errors, 429, and 5xx responses.
/// Returns immediately on success or any other 4xx.
pub async fn send_with_retry(
    request: reqwest::RequestBuilder,
    config: &RetryConfig,
) -> Result<reqwest::Response> {
    let max_attempts = config.max_retries + 1;

    for attempt in 0..max_attempts {
        let has_next = attempt < config.delays.len() && attempt + 1 < max_attempts;
        let Some(this_try) = request.try_clone() else {
            // Streaming bodies cannot be replayed.
            return request.send().await.map_err(transport);
        };

        match this_try.send().await {
            Ok(resp) if is_retryable(resp.status()) && has_next => {
                warn!(
                    "request attempt {}/{} failed (HTTP {}), retrying in {}s…",
                    attempt + 1,
                    max_attempts,
                    resp.status(),
                    config.delays[attempt],
                );
                tokio::time::sleep(Duration::from_secs(config.delays[attempt])).await;
            }
            Ok(resp) => return Ok(resp),
            Err(e) if has_next => {
                warn!(
                    "request attempt {}/{} failed ({}), retrying in {}s…",
                    attempt + 1,
                    max_attempts,
                    e,
                    config.delays[attempt],
                );
                tokio::time::sleep(Duration::from_secs(config.delays[attempt])).await;
            }
            Err(e) => {
                return Err(Error::Remote(format!(
                    "failed to reach Google after {} attempts: {e}",
                    attempt + 1
                )));
            }
        }
    }

    Err(Error::Remote("request was never sent".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{serve, Canned};

    fn instant(retries: usize) -> RetryConfig {
        RetryConfig {
            max_retries: retries,
            delays: vec![0; retries],
        }
    }

    #[tokio::test]
    async fn retries_server_errors_until_success() {
        let server = serve(vec![
            Canned::status(503, "{}"),
            Canned::status(429, "{}"),
            Canned::ok(r#"{"ok": true}"#),
        ])
        .await;
        let client = reqwest::Client::new();
        let resp = send_with_retry(client.get(server.url("/ping")), &instant(3))
            .await
            .expect("send");
        assert_eq!(resp.status(), 200);
        assert_eq!(server.requests().len(), 3);
    }

    #[tokio::test]
    async fn client_errors_are_not_retried() {
        let server = serve(vec![Canned::status(404, "{}"), Canned::ok("{}")]).await;
        let client = reqwest::Client::new();
        let resp = send_with_retry(client.get(server.url("/missing")), &instant(3))
            .await
            .expect("send");
        assert_eq!(resp.status(), 404);
        assert_eq!(server.requests().len(), 1);
    }

    #[tokio::test]
    async fn last_server_error_is_returned() {
        let server = serve(vec![Canned::status(500, "{}"), Canned::status(502, "{}")]).await;
        let client = reqwest::Client::new();
        let resp = send_with_retry(client.get(server.url("/flaky")), &instant(1))
            .await
            .expect("send");
        assert_eq!(resp.status(), 502);
    }
}
