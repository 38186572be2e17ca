//! Argument mistakes must be reported before any selection lookup or
//! network call, so these run against an empty config directory.

use std::path::Path;
use std::process::{Command, Output};

fn run(config_dir: &Path, args: &[&str]) -> Output {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_sheet-cmd"));
    cmd.args(args)
        .env("SHEET_CMD_CONFIG_DIR", config_dir)
        .env("HOME", config_dir)
        .env_remove("RUST_LOG");
    cmd.output().expect("run sheet-cmd")
}

fn failure_text(output: &Output) -> String {
    assert!(
        !output.status.success(),
        "expected failure\nstdout: {}",
        String::from_utf8_lossy(&output.stdout)
    );
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn write_dimension_mismatch_fails_before_selection() {
    let dir = tempfile::tempdir().expect("tempdir");
    let output = run(
        dir.path(),
        &["sheet", "write", "--range", "A1:B2", "--value", "1,2,3;4,5,6"],
    );
    let err = failure_text(&output);
    assert!(err.contains("expects 2x2"), "{err}");
    assert!(err.contains("got 2x3"), "{err}");
    assert!(err.contains("Tip: provide 2 row(s) with 2 column(s)"), "{err}");
    assert!(!err.contains("no active account"), "{err}");
}

#[test]
fn write_rejects_malformed_range() {
    let dir = tempfile::tempdir().expect("tempdir");
    let err = failure_text(&run(
        dir.path(),
        &["sheet", "write", "--range", "A1", "--value", "x"],
    ));
    assert!(err.contains("invalid address"), "{err}");
}

#[test]
fn write_needs_cell_or_range() {
    let dir = tempfile::tempdir().expect("tempdir");
    let output = run(dir.path(), &["sheet", "write", "--value", "x"]);
    assert!(!output.status.success());
}

#[test]
fn row_add_rejects_both_directions() {
    let dir = tempfile::tempdir().expect("tempdir");
    let err = failure_text(&run(
        dir.path(),
        &["sheet", "row-add", "--row", "3", "--above", "--below"],
    ));
    assert!(err.contains("cannot use both --above and --below"), "{err}");
}

#[test]
fn row_remove_above_first_row_is_out_of_range() {
    let dir = tempfile::tempdir().expect("tempdir");
    let err = failure_text(&run(
        dir.path(),
        &["sheet", "row-remove", "--row", "1", "--above", "--count", "2"],
    ));
    assert!(err.contains("out of range"), "{err}");
}

#[test]
fn row_zero_is_invalid() {
    let dir = tempfile::tempdir().expect("tempdir");
    let err = failure_text(&run(dir.path(), &["sheet", "row-add", "--row", "0"]));
    assert!(err.contains("positive integer"), "{err}");
}

#[test]
fn valid_write_without_account_names_the_fix() {
    let dir = tempfile::tempdir().expect("tempdir");
    let err = failure_text(&run(
        dir.path(),
        &["sheet", "write", "--cell", "B2", "--value", "x"],
    ));
    assert!(err.contains("no active account"), "{err}");
    assert!(err.contains("sheet-cmd account add"), "{err}");
}

#[test]
fn completion_generate_prints_script() {
    let dir = tempfile::tempdir().expect("tempdir");
    let output = run(dir.path(), &["completion", "generate", "bash"]);
    assert!(output.status.success());
    let script = String::from_utf8_lossy(&output.stdout);
    assert!(script.contains("sheet-cmd"));
    assert!(script.contains("spreadsheet"));
}

#[test]
fn config_show_creates_settings_with_defaults() {
    let dir = tempfile::tempdir().expect("tempdir");
    let output = run(dir.path(), &["config", "show"]);
    assert!(output.status.success());
    let text = String::from_utf8_lossy(&output.stdout);
    assert!(text.contains("max_results: 50"), "{text}");
    assert!(text.contains("default_columns: A:Z"), "{text}");
    assert!(text.contains("active_account: (none)"), "{text}");
    assert!(dir.path().join("config.json").exists());
}

#[test]
fn help_lists_command_groups() {
    let output = Command::new(env!("CARGO_BIN_EXE_sheet-cmd"))
        .arg("--help")
        .output()
        .expect("run help");
    assert!(output.status.success());
    let text = String::from_utf8_lossy(&output.stdout);
    for group in ["account", "spreadsheet", "sheet", "completion", "config"] {
        assert!(text.contains(group), "missing {group}");
    }
}

#[test]
fn row_add_past_last_row_is_out_of_range() {
    let dir = tempfile::tempdir().expect("tempdir");
    let last = usize::MAX.to_string();
    let err = failure_text(&run(
        dir.path(),
        &["sheet", "row-add", "--row", last.as_str(), "--below"],
    ));
    assert!(err.contains("out of range"), "{err}");
    assert!(!err.contains("no active account"), "{err}");
}
