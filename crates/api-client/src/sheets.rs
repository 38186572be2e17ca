//! Google Sheets API v4 client.
//!
//! Values go through `values.*` with `USER_ENTERED` input so formulas typed
//! by the user stay formulas. Structural edits go through `:batchUpdate`.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use sheet_cmd_core::address::qualify;
use sheet_cmd_core::rows::RowSpan;
use sheet_cmd_core::{Error, Result};
use tracing::debug;

use crate::http::{default_client, expect_success, parse_response};
use crate::retry::{RetryConfig, send_with_retry};

pub const SHEETS_BASE_URL: &str = "https://sheets.googleapis.com";

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridProperties {
    #[serde(default)]
    pub row_count: u64,
    #[serde(default)]
    pub column_count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetProperties {
    #[serde(default)]
    pub sheet_id: i64,
    pub title: String,
    #[serde(default)]
    pub index: u32,
    #[serde(default)]
    pub grid_properties: Option<GridProperties>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpreadsheetInfo {
    pub title: String,
    pub sheets: Vec<SheetProperties>,
}

impl SpreadsheetInfo {
    pub fn sheet(&self, title: &str) -> Result<&SheetProperties> {
        self.sheets
            .iter()
            .find(|s| s.title == title)
            .ok_or_else(|| Error::NotFound(format!("sheet '{title}' in spreadsheet '{}'", self.title)))
    }
}

#[derive(Debug, Deserialize)]
struct SpreadsheetResponse {
    properties: SpreadsheetTitle,
    #[serde(default)]
    sheets: Vec<SheetEnvelope>,
}

#[derive(Debug, Deserialize)]
struct SpreadsheetTitle {
    title: String,
}

#[derive(Debug, Deserialize)]
struct SheetEnvelope {
    properties: SheetProperties,
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

/// A block of values destined for one A1 range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RangeWrite {
    pub range: String,
    pub values: Vec<Vec<String>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Render {
    Formatted,
    Formula,
}

impl Render {
    pub fn from_formulas(formulas: bool) -> Self {
        if formulas { Self::Formula } else { Self::Formatted }
    }

    fn as_param(self) -> &'static str {
        match self {
            Self::Formatted => "FORMATTED_VALUE",
            Self::Formula => "FORMULA",
        }
    }
}

fn cell_to_string(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Typed client bound to one spreadsheet and one access token.
pub struct SheetsClient {
    client: reqwest::Client,
    base_url: String,
    spreadsheet_id: String,
    access_token: String,
    retry: RetryConfig,
}

impl SheetsClient {
    pub fn new(spreadsheet_id: &str, access_token: &str) -> Result<Self> {
        Ok(Self::with_client(
            default_client()?,
            SHEETS_BASE_URL,
            spreadsheet_id,
            access_token,
        ))
    }

    pub fn with_client(
        client: reqwest::Client,
        base_url: &str,
        spreadsheet_id: &str,
        access_token: &str,
    ) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            spreadsheet_id: spreadsheet_id.to_string(),
            access_token: access_token.to_string(),
            retry: RetryConfig::default(),
        }
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    fn url(&self, suffix: &str) -> String {
        format!(
            "{}/v4/spreadsheets/{}{}",
            self.base_url,
            urlencoding::encode(&self.spreadsheet_id),
            suffix
        )
    }

    fn values_url(&self, range: &str, suffix: &str) -> String {
        self.url(&format!("/values/{}{}", urlencoding::encode(range), suffix))
    }

    async fn get<T: serde::de::DeserializeOwned>(&self, url: String) -> Result<T> {
        let request = self.client.get(url).bearer_auth(&self.access_token);
        parse_response(send_with_retry(request, &self.retry).await?).await
    }

    async fn send_json(&self, request: reqwest::RequestBuilder, body: &Value) -> Result<()> {
        let request = request.bearer_auth(&self.access_token).json(body);
        expect_success(send_with_retry(request, &self.retry).await?).await
    }

    // ── Metadata ──────────────────────────────────────────────────────────

    pub async fn spreadsheet_info(&self) -> Result<SpreadsheetInfo> {
        let resp: SpreadsheetResponse = self
            .get(self.url("?fields=properties.title,sheets.properties"))
            .await?;
        let mut sheets: Vec<SheetProperties> = resp.sheets.into_iter().map(|s| s.properties).collect();
        sheets.sort_by_key(|s| s.index);
        Ok(SpreadsheetInfo {
            title: resp.properties.title,
            sheets,
        })
    }

    async fn sheet_id(&self, title: &str) -> Result<i64> {
        Ok(self.spreadsheet_info().await?.sheet(title)?.sheet_id)
    }

    // ── Values ────────────────────────────────────────────────────────────

    /// Read an A1 range on `sheet` (the whole used area when `range` is `None`).
    pub async fn read_values(
        &self,
        sheet: &str,
        range: Option<&str>,
        render: Render,
    ) -> Result<Vec<Vec<String>>> {
        let a1 = match range {
            Some(r) => qualify(sheet, r),
            None => sheet_cmd_core::address::quote_sheet_name(sheet),
        };
        let resp: ValueRange = self
            .get(self.values_url(
                &a1,
                &format!("?valueRenderOption={}&majorDimension=ROWS", render.as_param()),
            ))
            .await?;
        Ok(resp
            .values
            .into_iter()
            .map(|row| row.into_iter().map(cell_to_string).collect())
            .collect())
    }

    /// The whole used area of `sheet`.
    pub async fn read_sheet(&self, sheet: &str, render: Render) -> Result<Vec<Vec<String>>> {
        self.read_values(sheet, None, render).await
    }

    /// Overwrite the block starting at (or covering) `range`.
    pub async fn write_values(&self, sheet: &str, range: &str, values: &[Vec<String>]) -> Result<()> {
        let a1 = qualify(sheet, range);
        let body = json!({ "range": a1, "majorDimension": "ROWS", "values": values });
        let request = self
            .client
            .put(self.values_url(&a1, "?valueInputOption=USER_ENTERED"));
        self.send_json(request, &body).await?;
        debug!(range = %a1, rows = values.len(), "wrote values");
        Ok(())
    }

    /// Write several ranges in one round trip.
    pub async fn batch_write_values(&self, sheet: &str, writes: &[RangeWrite]) -> Result<()> {
        if writes.is_empty() {
            return Ok(());
        }
        let data: Vec<Value> = writes
            .iter()
            .map(|w| json!({ "range": qualify(sheet, &w.range), "values": w.values }))
            .collect();
        let body = json!({ "valueInputOption": "USER_ENTERED", "data": data });
        let request = self.client.post(self.url("/values:batchUpdate"));
        self.send_json(request, &body).await?;
        debug!(ranges = writes.len(), "batch wrote values");
        Ok(())
    }

    /// Append rows after the last row with data.
    pub async fn append_rows(&self, sheet: &str, rows: &[Vec<String>]) -> Result<()> {
        if rows.is_empty() {
            return Ok(());
        }
        let a1 = qualify(sheet, "A1");
        let body = json!({ "majorDimension": "ROWS", "values": rows });
        let request = self.client.post(self.values_url(
            &a1,
            ":append?valueInputOption=USER_ENTERED&insertDataOption=INSERT_ROWS",
        ));
        self.send_json(request, &body).await?;
        debug!(rows = rows.len(), "appended rows");
        Ok(())
    }

    pub async fn append_row(&self, sheet: &str, row: &[String]) -> Result<()> {
        self.append_rows(sheet, &[row.to_vec()]).await
    }

    // ── Structure ─────────────────────────────────────────────────────────

    async fn batch_update(&self, requests: Vec<Value>) -> Result<()> {
        let body = json!({ "requests": requests });
        let request = self.client.post(self.url(":batchUpdate"));
        self.send_json(request, &body).await
    }

    pub async fn add_sheet(&self, title: &str) -> Result<()> {
        self.batch_update(vec![json!({ "addSheet": { "properties": { "title": title } } })])
            .await
    }

    pub async fn delete_sheet(&self, title: &str) -> Result<()> {
        let sheet_id = self.sheet_id(title).await?;
        self.batch_update(vec![json!({ "deleteSheet": { "sheetId": sheet_id } })])
            .await
    }

    pub async fn rename_sheet(&self, title: &str, new_title: &str) -> Result<()> {
        let sheet_id = self.sheet_id(title).await?;
        self.batch_update(vec![json!({
            "updateSheetProperties": {
                "properties": { "sheetId": sheet_id, "title": new_title },
                "fields": "title"
            }
        })])
        .await
    }

    /// Copy a tab within the same spreadsheet, placed right after the source.
    pub async fn duplicate_sheet(&self, title: &str, new_title: &str) -> Result<()> {
        let info = self.spreadsheet_info().await?;
        let source = info.sheet(title)?;
        self.batch_update(vec![json!({
            "duplicateSheet": {
                "sourceSheetId": source.sheet_id,
                "insertSheetIndex": source.index + 1,
                "newSheetName": new_title
            }
        })])
        .await
    }

    pub async fn insert_rows(&self, sheet: &str, span: RowSpan, inherit_from_before: bool) -> Result<()> {
        let sheet_id = self.sheet_id(sheet).await?;
        self.batch_update(vec![json!({
            "insertDimension": {
                "range": {
                    "sheetId": sheet_id,
                    "dimension": "ROWS",
                    "startIndex": span.start,
                    "endIndex": span.end
                },
                "inheritFromBefore": inherit_from_before
            }
        })])
        .await?;
        debug!(%span, inherit_from_before, "inserted rows");
        Ok(())
    }

    pub async fn delete_rows(&self, sheet: &str, span: RowSpan) -> Result<()> {
        let sheet_id = self.sheet_id(sheet).await?;
        self.batch_update(vec![json!({
            "deleteDimension": {
                "range": {
                    "sheetId": sheet_id,
                    "dimension": "ROWS",
                    "startIndex": span.start,
                    "endIndex": span.end
                }
            }
        })])
        .await?;
        debug!(%span, "deleted rows");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{serve, Canned};

    const INFO: &str = r#"{
        "properties": {"title": "Budget"},
        "sheets": [
            {"properties": {"sheetId": 7, "title": "Feb", "index": 1}},
            {"properties": {"sheetId": 0, "title": "Jan", "index": 0,
                            "gridProperties": {"rowCount": 1000, "columnCount": 26}}}
        ]
    }"#;

    fn client(base: &str) -> SheetsClient {
        SheetsClient::with_client(reqwest::Client::new(), base, "xyz", "token")
            .with_retry(RetryConfig::none())
    }

    #[tokio::test]
    async fn info_lists_tabs_in_order() {
        let server = serve(vec![Canned::ok(INFO)]).await;
        let info = client(server.base_url()).spreadsheet_info().await.expect("info");
        assert_eq!(info.title, "Budget");
        let titles: Vec<&str> = info.sheets.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["Jan", "Feb"]);
        assert!(matches!(info.sheet("Mar"), Err(Error::NotFound(_))));
        assert!(server.request(0).starts_with("GET /v4/spreadsheets/xyz?fields="));
    }

    #[tokio::test]
    async fn read_values_stringifies_cells() {
        let server = serve(vec![Canned::ok(
            r#"{"range": "Jan!A1:C2", "values": [["a", 1, true], ["=SUM(B1:B1)"]]}"#,
        )])
        .await;
        let rows = client(server.base_url())
            .read_values("Jan", Some("A1:C2"), Render::Formula)
            .await
            .expect("read");
        assert_eq!(
            rows,
            vec![
                vec!["a".to_string(), "1".to_string(), "true".to_string()],
                vec!["=SUM(B1:B1)".to_string()],
            ]
        );
        let request = server.request(0);
        assert!(request.contains("/values/'Jan'!A1:C2?valueRenderOption=FORMULA"));
    }

    #[tokio::test]
    async fn empty_sheet_reads_as_no_rows() {
        let server = serve(vec![Canned::ok(r#"{"range": "Jan!A1:Z1000"}"#)]).await;
        let rows = client(server.base_url())
            .read_sheet("Jan", Render::Formatted)
            .await
            .expect("read");
        assert!(rows.is_empty());
        assert!(server.request(0).contains("/values/'Jan'?valueRenderOption=FORMATTED_VALUE"));
    }

    #[tokio::test]
    async fn insert_rows_resolves_sheet_id() {
        let server = serve(vec![Canned::ok(INFO), Canned::ok("{}")]).await;
        client(server.base_url())
            .insert_rows("Feb", RowSpan { start: 4, end: 6 }, true)
            .await
            .expect("insert");
        let request = server.request(1);
        assert!(request.starts_with("POST /v4/spreadsheets/xyz:batchUpdate"));
        let body: Value = serde_json::from_str(request.split("\r\n\r\n").nth(1).expect("body"))
            .expect("json body");
        let dim = &body["requests"][0]["insertDimension"];
        assert_eq!(dim["range"]["sheetId"], 7);
        assert_eq!(dim["range"]["startIndex"], 4);
        assert_eq!(dim["range"]["endIndex"], 6);
        assert_eq!(dim["inheritFromBefore"], true);
    }

    #[tokio::test]
    async fn structural_edit_on_missing_tab_fails_before_mutation() {
        let server = serve(vec![Canned::ok(INFO)]).await;
        let err = client(server.base_url())
            .delete_sheet("Nope")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
        assert_eq!(server.requests().len(), 1);
    }

    #[tokio::test]
    async fn remote_errors_carry_google_message() {
        let server = serve(vec![Canned::status(
            400,
            r#"{"error": {"code": 400, "message": "Unable to parse range", "status": "INVALID_ARGUMENT"}}"#,
        )])
        .await;
        let err = client(server.base_url())
            .write_values("Jan", "A1", &[vec!["x".to_string()]])
            .await
            .unwrap_err();
        match err {
            Error::Remote(msg) => assert!(msg.contains("Unable to parse range")),
            other => panic!("unexpected error: {other}"),
        }
    }
}
