//! Persistent account → spreadsheet → active-sheet tree.
//!
//! Every mutator checks its keys, applies the change in memory, and then
//! rewrites the whole root document. Readers only ever get shared borrows
//! of the tree.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;
use sheet_cmd_core::{Error, Result};
use sheet_cmd_paths::ConfigPaths;
use tracing::debug;

use crate::credential::{self, Credential, TokenRefresher};
use crate::document::{Account, Settings, SettingsDocument, SpreadsheetEntry, UserMetadata};

/// One registered spreadsheet as shown by `spreadsheet list`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpreadsheetSummary {
    pub name: String,
    pub spreadsheet_id: String,
    pub active_sheet: Option<String>,
    pub is_active: bool,
}

pub struct ConfigStore {
    paths: ConfigPaths,
    metadata: UserMetadata,
    settings: Option<SettingsDocument>,
}

impl ConfigStore {
    /// Open the store, creating the directory and an empty root document
    /// when they do not exist yet. The settings document is not touched.
    pub fn open(paths: ConfigPaths) -> Result<Self> {
        std::fs::create_dir_all(&paths.config_dir)?;
        let metadata = if paths.user_metadata_file.exists() {
            read_json::<UserMetadata>(&paths.user_metadata_file)?
        } else {
            let fresh = UserMetadata::empty(paths.default_settings_file.to_string_lossy());
            write_json_atomic(&paths.user_metadata_file, &fresh)?;
            debug!(path = %paths.user_metadata_file.display(), "created user metadata");
            fresh
        };
        Ok(Self {
            paths,
            metadata,
            settings: None,
        })
    }

    pub fn paths(&self) -> &ConfigPaths {
        &self.paths
    }

    pub fn metadata(&self) -> &UserMetadata {
        &self.metadata
    }

    pub fn settings_path(&self) -> PathBuf {
        PathBuf::from(&self.metadata.config_path)
    }

    fn save(&self) -> Result<()> {
        write_json_atomic(&self.paths.user_metadata_file, &self.metadata)?;
        debug!(path = %self.paths.user_metadata_file.display(), "saved user metadata");
        Ok(())
    }

    fn account_mut(&mut self, email: &str) -> Result<&mut Account> {
        self.metadata
            .accounts
            .get_mut(email)
            .ok_or_else(|| Error::NotFound(format!("account '{email}'")))
    }

    fn require_account(&self, email: &str) -> Result<&Account> {
        self.account(email)
            .ok_or_else(|| Error::NotFound(format!("account '{email}'")))
    }

    // ── Accounts ──────────────────────────────────────────────────────────

    pub fn accounts(&self) -> impl Iterator<Item = &Account> {
        self.metadata.accounts.values()
    }

    pub fn account(&self, email: &str) -> Option<&Account> {
        self.metadata.accounts.get(email)
    }

    pub fn active_account_email(&self) -> Option<&str> {
        self.metadata.active_account.as_deref()
    }

    pub fn active_account(&self) -> Option<&Account> {
        self.active_account_email()
            .and_then(|email| self.account(email))
    }

    pub fn add_account(&mut self, email: &str, credential: Credential) -> Result<()> {
        if self.metadata.accounts.contains_key(email) {
            return Err(Error::AlreadyExists(format!("account '{email}'")));
        }
        self.metadata
            .accounts
            .insert(email.to_string(), Account::new(email, credential));
        self.save()
    }

    /// Remove an account and everything registered under it.
    pub fn remove_account(&mut self, email: &str) -> Result<()> {
        if self.metadata.accounts.remove(email).is_none() {
            return Err(Error::NotFound(format!("account '{email}'")));
        }
        if self.metadata.active_account.as_deref() == Some(email) {
            self.metadata.active_account = None;
        }
        self.save()
    }

    pub fn set_active_account(&mut self, email: &str) -> Result<()> {
        self.require_account(email)?;
        self.metadata.active_account = Some(email.to_string());
        self.save()
    }

    pub fn update_account_credentials(&mut self, email: &str, credential: Credential) -> Result<()> {
        self.account_mut(email)?.oauth = credential;
        self.save()
    }

    /// Return the account's credential, refreshing and persisting it first
    /// when it is stale. A second call right after sees a fresh token and
    /// does not hit the network.
    pub async fn get_refreshed_credentials<R: TokenRefresher>(
        &mut self,
        email: &str,
        refresher: &R,
        now: DateTime<Utc>,
    ) -> Result<Credential> {
        let current = self.require_account(email)?.oauth.clone();
        if !credential::is_stale(&current, now) {
            return Ok(current);
        }
        let fresh = credential::refresh(&current, refresher)
            .await
            .map_err(|err| match err {
                Error::AuthExpired(_) => Error::AuthExpired(email.to_string()),
                other => other,
            })?;
        self.update_account_credentials(email, fresh.clone())?;
        Ok(fresh)
    }

    // ── Spreadsheets ──────────────────────────────────────────────────────

    pub fn add_spreadsheet(&mut self, email: &str, name: &str, spreadsheet_id: &str) -> Result<()> {
        let account = self.account_mut(email)?;
        if account.spreadsheets.contains_key(name) {
            return Err(Error::AlreadyExists(format!(
                "spreadsheet '{name}' for account '{email}'"
            )));
        }
        account.spreadsheets.insert(
            name.to_string(),
            SpreadsheetEntry {
                spreadsheet_id: spreadsheet_id.to_string(),
                active_sheet: None,
            },
        );
        self.save()
    }

    pub fn remove_spreadsheet(&mut self, email: &str, name: &str) -> Result<()> {
        let account = self.account_mut(email)?;
        if account.spreadsheets.remove(name).is_none() {
            return Err(Error::NotFound(format!(
                "spreadsheet '{name}' for account '{email}'"
            )));
        }
        if account.active_spreadsheet.as_deref() == Some(name) {
            account.active_spreadsheet = None;
        }
        self.save()
    }

    pub fn list_spreadsheets(&self, email: &str) -> Result<Vec<SpreadsheetSummary>> {
        let account = self.require_account(email)?;
        Ok(account
            .spreadsheets
            .iter()
            .map(|(name, entry)| SpreadsheetSummary {
                name: name.clone(),
                spreadsheet_id: entry.spreadsheet_id.clone(),
                active_sheet: entry.active_sheet.clone(),
                is_active: account.active_spreadsheet.as_deref() == Some(name.as_str()),
            })
            .collect())
    }

    pub fn spreadsheet(&self, email: &str, name: &str) -> Option<&SpreadsheetEntry> {
        self.account(email)?.spreadsheets.get(name)
    }

    /// Look a registered spreadsheet up by its remote id.
    pub fn find_spreadsheet_by_id(&self, email: &str, spreadsheet_id: &str) -> Option<(&str, &SpreadsheetEntry)> {
        self.account(email)?
            .spreadsheets
            .iter()
            .find(|(_, entry)| entry.spreadsheet_id == spreadsheet_id)
            .map(|(name, entry)| (name.as_str(), entry))
    }

    pub fn set_active_spreadsheet(&mut self, email: &str, name: &str) -> Result<()> {
        let account = self.account_mut(email)?;
        if !account.spreadsheets.contains_key(name) {
            return Err(Error::NotFound(format!(
                "spreadsheet '{name}' for account '{email}'"
            )));
        }
        account.active_spreadsheet = Some(name.to_string());
        self.save()
    }

    pub fn active_spreadsheet_name(&self, email: &str) -> Option<&str> {
        self.account(email)?.active_spreadsheet.as_deref()
    }

    // ── Sheets ────────────────────────────────────────────────────────────

    /// Point the spreadsheet at a sheet/tab. The name is not checked remotely.
    pub fn set_active_sheet(&mut self, email: &str, spreadsheet: &str, sheet: &str) -> Result<()> {
        self.spreadsheet_mut(email, spreadsheet)?.active_sheet = Some(sheet.to_string());
        self.save()
    }

    pub fn clear_active_sheet(&mut self, email: &str, spreadsheet: &str) -> Result<()> {
        self.spreadsheet_mut(email, spreadsheet)?.active_sheet = None;
        self.save()
    }

    pub fn active_sheet_name(&self, email: &str, spreadsheet: &str) -> Option<&str> {
        self.spreadsheet(email, spreadsheet)?.active_sheet.as_deref()
    }

    fn spreadsheet_mut(&mut self, email: &str, name: &str) -> Result<&mut SpreadsheetEntry> {
        self.account_mut(email)?
            .spreadsheets
            .get_mut(name)
            .ok_or_else(|| Error::NotFound(format!("spreadsheet '{name}' for account '{email}'")))
    }

    // ── Settings ──────────────────────────────────────────────────────────

    fn settings_doc(&mut self) -> Result<&mut SettingsDocument> {
        if self.settings.is_none() {
            let path = self.settings_path();
            let doc = if path.exists() {
                read_json::<SettingsDocument>(&path)?
            } else {
                let fresh = SettingsDocument::with_defaults();
                write_json_atomic(&path, &fresh)?;
                debug!(path = %path.display(), "created settings");
                fresh
            };
            self.settings = Some(doc);
        }
        Ok(self.settings.get_or_insert_with(SettingsDocument::with_defaults))
    }

    /// Current preferences, loading or creating the settings document.
    pub fn settings(&mut self) -> Result<Settings> {
        Ok(self.settings_doc()?.settings.clone().unwrap_or_default())
    }

    pub fn is_completion_installed(&mut self) -> Result<bool> {
        Ok(self.settings()?.completion_installed == Some(true))
    }

    pub fn mark_completion_installed(&mut self) -> Result<()> {
        let path = self.settings_path();
        let doc = self.settings_doc()?;
        doc.settings
            .get_or_insert_with(Settings::default)
            .completion_installed = Some(true);
        write_json_atomic(&path, doc)
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

/// Replace `path` with the pretty-printed JSON of `value` via a sibling
/// temp file, so readers never observe a half-written document.
fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut body = serde_json::to_string_pretty(value)?;
    body.push('\n');
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    std::fs::write(&tmp, body)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}
