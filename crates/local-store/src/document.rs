//! On-disk shapes of `user_metadata.json` and `config.json`.
//!
//! Field names match the documents written by earlier releases, hence the
//! mixed `snake_case` / `camelCase` renames.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::credential::Credential;

pub const DEFAULT_MAX_RESULTS: u32 = 50;
pub const DEFAULT_COLUMNS: &str = "A:Z";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpreadsheetEntry {
    pub spreadsheet_id: String,
    #[serde(
        rename = "activeSheet",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub active_sheet: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub email: String,
    pub oauth: Credential,
    #[serde(
        rename = "activeSpreadsheet",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub active_spreadsheet: Option<String>,
    #[serde(default)]
    pub spreadsheets: BTreeMap<String, SpreadsheetEntry>,
}

impl Account {
    pub fn new(email: impl Into<String>, oauth: Credential) -> Self {
        Self {
            email: email.into(),
            oauth,
            active_spreadsheet: None,
            spreadsheets: BTreeMap::new(),
        }
    }
}

/// Root document: who is active and what each account has registered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserMetadata {
    pub config_path: String,
    #[serde(
        rename = "activeAccount",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub active_account: Option<String>,
    #[serde(default)]
    pub accounts: BTreeMap<String, Account>,
}

impl UserMetadata {
    pub fn empty(config_path: impl Into<String>) -> Self {
        Self {
            config_path: config_path.into(),
            active_account: None,
            accounts: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_max_results")]
    pub max_results: u32,
    #[serde(default = "default_columns")]
    pub default_columns: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completion_installed: Option<bool>,
}

fn default_max_results() -> u32 {
    DEFAULT_MAX_RESULTS
}

fn default_columns() -> String {
    DEFAULT_COLUMNS.to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            max_results: default_max_results(),
            default_columns: default_columns(),
            completion_installed: None,
        }
    }
}

/// Secondary preferences document found at `UserMetadata::config_path`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingsDocument {
    #[serde(rename = "$schema", default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<Settings>,
}

impl SettingsDocument {
    pub fn with_defaults() -> Self {
        Self {
            schema: None,
            settings: Some(Settings::default()),
        }
    }
}
