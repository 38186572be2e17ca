//! Browser consent via a one-shot loopback listener on 127.0.0.1.

use std::time::Duration;

use anyhow::{Context, Result, anyhow, bail};
use sheet_cmd_api_client::{OAuthApp, OAuthClient};
use sheet_cmd_local_store::Credential;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tracing::debug;

const CALLBACK_PATH: &str = "/callback";
const CALLBACK_TIMEOUT: Duration = Duration::from_secs(300);

const SUCCESS_PAGE: &str = "<html><body><h2>sheet-cmd is authorized.</h2><p>You can close this tab.</p></body></html>";
const FAILURE_PAGE: &str = "<html><body><h2>Authorization failed.</h2><p>Return to the terminal for details.</p></body></html>";

pub struct Authorized {
    pub email: String,
    pub credential: Credential,
}

#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Callback {
    Code(String),
    /// Some other request hit the listener (favicon and friends).
    Ignored,
}

/// Run the consent flow and return the signed-in account.
pub async fn authorize(app: &OAuthApp) -> Result<Authorized> {
    let listener = TcpListener::bind(("127.0.0.1", 0))
        .await
        .context("bind loopback listener")?;
    let port = listener.local_addr()?.port();
    let redirect_uri = format!("http://127.0.0.1:{port}{CALLBACK_PATH}");
    let state = uuid::Uuid::new_v4().simple().to_string();

    let oauth = OAuthClient::new()?;
    let url = oauth.authorize_url(app, &redirect_uri, &state)?;
    eprintln!("Open this URL in your browser to authorize sheet-cmd:\n\n  {url}\n");
    eprintln!("Waiting for the browser to redirect to {redirect_uri} ...");

    let code = tokio::time::timeout(CALLBACK_TIMEOUT, wait_for_code(&listener, &state))
        .await
        .map_err(|_| anyhow!("timed out waiting for the browser authorization"))??;
    debug!(port, "received authorization code");

    let credential = oauth.exchange_code(app, &code, &redirect_uri).await?;
    let access_token = credential
        .access_token
        .as_deref()
        .context("Google did not return an access token")?;
    let email = oauth.fetch_email(access_token).await?;
    Ok(Authorized { email, credential })
}

async fn wait_for_code(listener: &TcpListener, state: &str) -> Result<String> {
    loop {
        let (mut stream, _) = listener.accept().await.context("accept callback")?;
        let request_line = read_request_line(&mut stream).await?;
        match parse_callback(&request_line, state) {
            Ok(Callback::Code(code)) => {
                respond(&mut stream, "200 OK", SUCCESS_PAGE).await;
                return Ok(code);
            }
            Ok(Callback::Ignored) => respond(&mut stream, "404 Not Found", "").await,
            Err(err) => {
                respond(&mut stream, "400 Bad Request", FAILURE_PAGE).await;
                return Err(err);
            }
        }
    }
}

async fn read_request_line(stream: &mut TcpStream) -> Result<String> {
    let mut reader = BufReader::new(stream);
    let mut line = String::new();
    reader
        .read_line(&mut line)
        .await
        .context("read callback request")?;
    Ok(line.trim_end().to_string())
}

async fn respond(stream: &mut TcpStream, status: &str, body: &str) {
    let reply = format!(
        "HTTP/1.1 {status}\r\ncontent-type: text/html; charset=utf-8\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
        body.len()
    );
    let _ = stream.write_all(reply.as_bytes()).await;
    let _ = stream.shutdown().await;
}

/// Interpret `GET /callback?code=..&state=.. HTTP/1.1`.
pub(crate) fn parse_callback(request_line: &str, expected_state: &str) -> Result<Callback> {
    let target = request_line
        .split_whitespace()
        .nth(1)
        .context("malformed callback request")?;
    let url = url::Url::parse(&format!("http://127.0.0.1{target}"))
        .context("malformed callback URL")?;
    if url.path() != CALLBACK_PATH {
        return Ok(Callback::Ignored);
    }

    let mut code = None;
    let mut state = None;
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "code" => code = Some(value.into_owned()),
            "state" => state = Some(value.into_owned()),
            "error" => bail!("authorization was denied: {value}"),
            _ => {}
        }
    }
    if state.as_deref() != Some(expected_state) {
        bail!("authorization callback state did not match; try again");
    }
    code.filter(|c| !c.is_empty())
        .map(Callback::Code)
        .context("authorization callback carried no code")
}
