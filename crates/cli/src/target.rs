//! Shared plumbing for commands: open the store, resolve what to act on,
//! and build authenticated clients.

use anyhow::{Context, Result};
use chrono::Utc;
use sheet_cmd_api_client::{DriveClient, OAuthClient, SheetsClient};
use sheet_cmd_core::Error;
use sheet_cmd_local_store::{ConfigStore, Credential, ResolvedTarget, TargetRequest, resolve_target};
use sheet_cmd_paths::ConfigPaths;

pub fn open_store() -> Result<ConfigStore> {
    let paths = ConfigPaths::resolve().context("locate sheet-cmd config directory")?;
    let dir = paths.config_dir.display().to_string();
    ConfigStore::open(paths).with_context(|| format!("open config in {dir}"))
}

/// Resolve the active selection and attach fresh credentials.
pub async fn resolve(store: &mut ConfigStore, request: &TargetRequest) -> Result<ResolvedTarget> {
    let oauth = OAuthClient::new()?;
    Ok(resolve_target(store, request, &oauth, Utc::now()).await?)
}

/// Fresh credentials for the active account, without any spreadsheet.
pub async fn active_account(store: &mut ConfigStore) -> Result<(String, Credential)> {
    let email = store
        .active_account_email()
        .ok_or(Error::NoActiveAccount)?
        .to_string();
    let oauth = OAuthClient::new()?;
    let credential = store
        .get_refreshed_credentials(&email, &oauth, Utc::now())
        .await?;
    Ok((email, credential))
}

pub fn access_token(credential: &Credential) -> Result<&str> {
    credential
        .access_token
        .as_deref()
        .context("account has no access token; run `sheet-cmd account reauth`")
}

pub fn sheets_client(target: &ResolvedTarget) -> Result<SheetsClient> {
    Ok(SheetsClient::new(
        &target.spreadsheet_id,
        access_token(&target.credentials)?,
    )?)
}

pub fn drive_client(credential: &Credential) -> Result<DriveClient> {
    Ok(DriveClient::new(access_token(credential)?)?)
}
