use serde::Deserialize;
use sheet_cmd_core::Result;

use crate::http::{default_client, parse_response};
use crate::retry::{RetryConfig, send_with_retry};

pub const DRIVE_BASE_URL: &str = "https://www.googleapis.com";

const SPREADSHEET_QUERY: &str =
    "mimeType='application/vnd.google-apps.spreadsheet' and trashed=false";

/// A spreadsheet visible to the signed-in account.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriveFile {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub modified_time: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FileList {
    #[serde(default)]
    files: Vec<DriveFile>,
}

pub struct DriveClient {
    client: reqwest::Client,
    base_url: String,
    access_token: String,
    retry: RetryConfig,
}

impl DriveClient {
    pub fn new(access_token: &str) -> Result<Self> {
        Ok(Self::with_client(default_client()?, DRIVE_BASE_URL, access_token))
    }

    pub fn with_client(client: reqwest::Client, base_url: &str, access_token: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            access_token: access_token.to_string(),
            retry: RetryConfig::default(),
        }
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Most recently modified spreadsheets first, at most `limit` of them.
    pub async fn list_spreadsheets(&self, limit: u32) -> Result<Vec<DriveFile>> {
        let page_size = limit.clamp(1, 1000).to_string();
        let request = self
            .client
            .get(format!("{}/drive/v3/files", self.base_url))
            .bearer_auth(&self.access_token)
            .query(&[
                ("q", SPREADSHEET_QUERY),
                ("pageSize", page_size.as_str()),
                ("orderBy", "modifiedTime desc"),
                ("fields", "files(id,name,modifiedTime)"),
            ]);
        let list: FileList = parse_response(send_with_retry(request, &self.retry).await?).await?;
        Ok(list.files)
    }
}
