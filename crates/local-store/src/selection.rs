//! Resolve the (account, spreadsheet, sheet) target a command operates on.

use chrono::{DateTime, Utc};
use sheet_cmd_core::{Error, Result};

use crate::credential::{Credential, TokenRefresher};
use crate::store::ConfigStore;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TargetRequest {
    /// `--name` on sheet commands; wins over the stored active sheet.
    pub sheet_override: Option<String>,
    pub require_sheet: bool,
}

impl TargetRequest {
    pub fn spreadsheet_only() -> Self {
        Self::default()
    }

    pub fn sheet(sheet_override: Option<String>) -> Self {
        Self {
            sheet_override,
            require_sheet: true,
        }
    }
}

/// Local half of a target: names and ids only, no credentials yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub email: String,
    pub spreadsheet_name: String,
    pub spreadsheet_id: String,
    pub sheet_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTarget {
    pub email: String,
    pub spreadsheet_name: String,
    pub spreadsheet_id: String,
    pub sheet_name: Option<String>,
    pub credentials: Credential,
}

impl ResolvedTarget {
    /// The sheet name, which is always present when the request required one.
    pub fn sheet(&self) -> Result<&str> {
        self.sheet_name.as_deref().ok_or(Error::NoActiveSheet)
    }
}

/// Walk the active pointers down to the requested depth.
pub fn resolve_selection(store: &ConfigStore, request: &TargetRequest) -> Result<Selection> {
    let email = store.active_account_email().ok_or(Error::NoActiveAccount)?;
    let account = store
        .account(email)
        .ok_or_else(|| Error::NotFound(format!("account '{email}'")))?;
    let spreadsheet_name = account
        .active_spreadsheet
        .as_deref()
        .ok_or(Error::NoActiveSpreadsheet)?;
    let entry = account.spreadsheets.get(spreadsheet_name).ok_or_else(|| {
        Error::NotFound(format!(
            "spreadsheet '{spreadsheet_name}' for account '{email}'"
        ))
    })?;

    let sheet_name = request
        .sheet_override
        .clone()
        .filter(|name| !name.is_empty())
        .or_else(|| entry.active_sheet.clone());
    if request.require_sheet && sheet_name.is_none() {
        return Err(Error::NoActiveSheet);
    }

    Ok(Selection {
        email: email.to_string(),
        spreadsheet_name: spreadsheet_name.to_string(),
        spreadsheet_id: entry.spreadsheet_id.clone(),
        sheet_name,
    })
}

/// Resolve the selection, then attach fresh credentials for its account.
///
/// Missing selections fail before any token exchange is attempted.
pub async fn resolve_target<R: TokenRefresher>(
    store: &mut ConfigStore,
    request: &TargetRequest,
    refresher: &R,
    now: DateTime<Utc>,
) -> Result<ResolvedTarget> {
    let selection = resolve_selection(store, request)?;
    let credentials = store
        .get_refreshed_credentials(&selection.email, refresher, now)
        .await?;
    Ok(ResolvedTarget {
        email: selection.email,
        spreadsheet_name: selection.spreadsheet_name,
        spreadsheet_id: selection.spreadsheet_id,
        sheet_name: selection.sheet_name,
        credentials,
    })
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use sheet_cmd_paths::ConfigPaths;

    use super::*;
    use crate::credential::testing::{credential_expiring_at, FakeRefresher};

    fn store_with_budget(tmp: &tempfile::TempDir) -> ConfigStore {
        let mut store = ConfigStore::open(ConfigPaths::in_dir(tmp.path())).expect("open");
        let cred = credential_expiring_at(Some(Utc::now() + Duration::hours(1)));
        store.add_account("a@x.com", cred).expect("add");
        store.set_active_account("a@x.com").expect("activate");
        store.add_spreadsheet("a@x.com", "Budget", "xyz").expect("add");
        store
            .set_active_spreadsheet("a@x.com", "Budget")
            .expect("select");
        store
    }

    #[tokio::test]
    async fn resolves_full_target() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let mut store = store_with_budget(&tmp);
        store.set_active_sheet("a@x.com", "Budget", "Jan").expect("sheet");
        let refresher = FakeRefresher::new(Utc::now());

        let target = resolve_target(&mut store, &TargetRequest::sheet(None), &refresher, Utc::now())
            .await
            .expect("resolve");
        assert_eq!(target.email, "a@x.com");
        assert_eq!(target.spreadsheet_name, "Budget");
        assert_eq!(target.spreadsheet_id, "xyz");
        assert_eq!(target.sheet().unwrap(), "Jan");
        assert_eq!(target.credentials.access_token.as_deref(), Some("old-access"));
        assert_eq!(refresher.calls(), 0);
    }

    #[test]
    fn override_beats_stored_sheet() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let mut store = store_with_budget(&tmp);
        store.set_active_sheet("a@x.com", "Budget", "Jan").expect("sheet");
        let selection =
            resolve_selection(&store, &TargetRequest::sheet(Some("Feb".to_string()))).unwrap();
        assert_eq!(selection.sheet_name.as_deref(), Some("Feb"));
    }

    #[test]
    fn missing_pointers_report_the_first_gap() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let mut store = ConfigStore::open(ConfigPaths::in_dir(tmp.path())).expect("open");
        let request = TargetRequest::sheet(None);
        assert!(matches!(
            resolve_selection(&store, &request),
            Err(Error::NoActiveAccount)
        ));

        store
            .add_account("a@x.com", credential_expiring_at(None))
            .expect("add");
        store.set_active_account("a@x.com").expect("activate");
        assert!(matches!(
            resolve_selection(&store, &request),
            Err(Error::NoActiveSpreadsheet)
        ));

        store.add_spreadsheet("a@x.com", "S", "id").expect("add");
        store.set_active_spreadsheet("a@x.com", "S").expect("select");
        assert!(matches!(
            resolve_selection(&store, &request),
            Err(Error::NoActiveSheet)
        ));
        assert!(resolve_selection(&store, &TargetRequest::spreadsheet_only()).is_ok());
    }

    #[tokio::test]
    async fn removing_active_spreadsheet_breaks_resolution() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let mut store = store_with_budget(&tmp);
        store.remove_spreadsheet("a@x.com", "Budget").expect("remove");
        let refresher = FakeRefresher::new(Utc::now());
        let err = resolve_target(
            &mut store,
            &TargetRequest::spreadsheet_only(),
            &refresher,
            Utc::now(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, Error::NoActiveSpreadsheet));
        assert_eq!(refresher.calls(), 0);
    }

    #[tokio::test]
    async fn dangling_spreadsheet_pointer_is_not_found() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let doc = serde_json::json!({
            "config_path": tmp.path().join("config.json").to_string_lossy(),
            "activeAccount": "a@x.com",
            "accounts": {
                "a@x.com": {
                    "email": "a@x.com",
                    "oauth": {
                        "client_id": "cid",
                        "client_secret": "secret",
                        "refresh_token": "rt"
                    },
                    "activeSpreadsheet": "Gone",
                    "spreadsheets": {}
                }
            }
        });
        std::fs::write(
            tmp.path().join("user_metadata.json"),
            serde_json::to_string_pretty(&doc).expect("serialize"),
        )
        .expect("write metadata");

        let mut store = ConfigStore::open(ConfigPaths::in_dir(tmp.path())).expect("open");
        let err = resolve_selection(&store, &TargetRequest::spreadsheet_only()).unwrap_err();
        assert!(matches!(&err, Error::NotFound(what) if what.contains("Gone")), "{err}");

        let refresher = FakeRefresher::new(Utc::now());
        let err = resolve_target(
            &mut store,
            &TargetRequest::spreadsheet_only(),
            &refresher,
            Utc::now(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
        assert_eq!(refresher.calls(), 0);
    }
}
