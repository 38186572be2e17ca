use serde_json::{Value, json};
use std::fs;
use std::path::Path;
use std::process::{Command, Output};

fn make_config_dir() -> tempfile::TempDir {
    tempfile::tempdir().expect("tempdir")
}

fn run(config_dir: &Path, args: &[&str]) -> Output {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_sheet-cmd"));
    cmd.args(args)
        .env("SHEET_CMD_CONFIG_DIR", config_dir)
        .env("HOME", config_dir)
        .env_remove("RUST_LOG");
    cmd.output().expect("run sheet-cmd")
}

fn assert_ok(output: &Output) {
    assert!(
        output.status.success(),
        "command failed\nstdout: {}\nstderr: {}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

/// One signed-in account whose access token is good for years.
fn seed_account(config_dir: &Path, email: &str) {
    let doc = json!({
        "config_path": config_dir.join("config.json").to_string_lossy(),
        "activeAccount": email,
        "accounts": {
            email: {
                "email": email,
                "oauth": {
                    "client_id": "cid",
                    "client_secret": "secret",
                    "refresh_token": "rt",
                    "access_token": "at",
                    "expiry_date": 4_102_444_800_000_i64
                },
                "spreadsheets": {}
            }
        }
    });
    fs::create_dir_all(config_dir).expect("create config dir");
    fs::write(
        config_dir.join("user_metadata.json"),
        serde_json::to_string_pretty(&doc).expect("serialize"),
    )
    .expect("write metadata");
}

fn read_metadata(config_dir: &Path) -> Value {
    let raw = fs::read_to_string(config_dir.join("user_metadata.json")).expect("read metadata");
    serde_json::from_str(&raw).expect("parse metadata")
}

#[test]
fn first_run_creates_empty_root_document() {
    let dir = make_config_dir();
    let output = run(dir.path(), &["account", "list"]);
    assert_ok(&output);
    assert!(stdout(&output).contains("No accounts"));

    let doc = read_metadata(dir.path());
    assert_eq!(doc["accounts"], json!({}));
    assert!(doc.get("activeAccount").is_none());
    assert!(
        doc["config_path"]
            .as_str()
            .expect("config_path")
            .ends_with("config.json")
    );
}

#[test]
fn add_select_and_show_active_spreadsheet() {
    let dir = make_config_dir();
    seed_account(dir.path(), "a@x.com");

    let output = run(
        dir.path(),
        &["spreadsheet", "add", "--id", "xyz", "--name", "Budget"],
    );
    assert_ok(&output);

    let doc = read_metadata(dir.path());
    let account = &doc["accounts"]["a@x.com"];
    assert_eq!(account["spreadsheets"]["Budget"]["spreadsheet_id"], "xyz");
    assert_eq!(account["activeSpreadsheet"], "Budget");

    let output = run(
        dir.path(),
        &["spreadsheet", "add", "--id", "abc", "--name", "Travel"],
    );
    assert_ok(&output);
    assert_eq!(
        read_metadata(dir.path())["accounts"]["a@x.com"]["activeSpreadsheet"],
        "Budget"
    );

    assert_ok(&run(dir.path(), &["spreadsheet", "select", "Travel"]));
    let output = run(dir.path(), &["spreadsheet", "active"]);
    assert_ok(&output);
    let text = stdout(&output);
    assert!(text.contains("Spreadsheet: Travel"), "{text}");
    assert!(text.contains("Id: abc"), "{text}");

    let output = run(dir.path(), &["spreadsheet", "list"]);
    assert_ok(&output);
    let text = stdout(&output);
    assert!(text.contains("* Travel"), "{text}");
    assert!(text.contains("  Budget"), "{text}");
}

#[test]
fn duplicate_spreadsheet_name_is_rejected() {
    let dir = make_config_dir();
    seed_account(dir.path(), "a@x.com");
    assert_ok(&run(
        dir.path(),
        &["spreadsheet", "add", "--id", "one", "--name", "S"],
    ));
    let output = run(
        dir.path(),
        &["spreadsheet", "add", "--id", "two", "--name", "S"],
    );
    assert!(!output.status.success());
    assert!(stderr(&output).contains("already exists"));
    assert_eq!(
        read_metadata(dir.path())["accounts"]["a@x.com"]["spreadsheets"]["S"]["spreadsheet_id"],
        "one"
    );
}

#[test]
fn sheet_select_by_name_is_persisted() {
    let dir = make_config_dir();
    seed_account(dir.path(), "a@x.com");
    assert_ok(&run(
        dir.path(),
        &["spreadsheet", "add", "--id", "xyz", "--name", "Budget"],
    ));
    let output = run(dir.path(), &["sheet", "select", "--name", "Jan"]);
    assert_ok(&output);
    assert!(stdout(&output).contains("Active sheet: Jan"));

    let doc = read_metadata(dir.path());
    assert_eq!(
        doc["accounts"]["a@x.com"]["spreadsheets"]["Budget"]["activeSheet"],
        "Jan"
    );

    let output = run(dir.path(), &["config", "show"]);
    assert_ok(&output);
    let text = stdout(&output);
    assert!(text.contains("active_account: a@x.com"), "{text}");
    assert!(text.contains("active_spreadsheet: Budget"), "{text}");
    assert!(text.contains("active_sheet: Jan"), "{text}");
}

#[test]
fn removing_active_spreadsheet_clears_selection() {
    let dir = make_config_dir();
    seed_account(dir.path(), "a@x.com");
    assert_ok(&run(
        dir.path(),
        &["spreadsheet", "add", "--id", "xyz", "--name", "Budget"],
    ));
    assert_ok(&run(dir.path(), &["spreadsheet", "remove", "Budget"]));

    let doc = read_metadata(dir.path());
    assert!(doc["accounts"]["a@x.com"].get("activeSpreadsheet").is_none());

    let output = run(dir.path(), &["sheet", "read"]);
    assert!(!output.status.success());
    assert!(
        stderr(&output).contains("no active spreadsheet"),
        "{}",
        stderr(&output)
    );
}

#[test]
fn account_select_and_remove() {
    let dir = make_config_dir();
    seed_account(dir.path(), "a@x.com");

    let output = run(dir.path(), &["account", "select", "ghost@x.com"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("not found"));

    let output = run(dir.path(), &["account", "list"]);
    assert_ok(&output);
    assert!(stdout(&output).contains("* a@x.com"));

    assert_ok(&run(dir.path(), &["account", "remove", "a@x.com"]));
    let doc = read_metadata(dir.path());
    assert_eq!(doc["accounts"], json!({}));
    assert!(doc.get("activeAccount").is_none());
}

#[test]
fn dangling_active_spreadsheet_is_reported_as_not_found() {
    let dir = make_config_dir();
    seed_account(dir.path(), "a@x.com");
    let mut doc = read_metadata(dir.path());
    doc["accounts"]["a@x.com"]["activeSpreadsheet"] = json!("Gone");
    fs::write(
        dir.path().join("user_metadata.json"),
        serde_json::to_string_pretty(&doc).expect("serialize"),
    )
    .expect("write metadata");

    for args in [&["spreadsheet", "active"][..], &["sheet", "read"][..]] {
        let output = run(dir.path(), args);
        assert!(!output.status.success());
        let err = stderr(&output);
        assert!(err.contains("not found"), "{err}");
        assert!(err.contains("Gone"), "{err}");
        assert!(!err.contains("no active spreadsheet"), "{err}");
    }
}
