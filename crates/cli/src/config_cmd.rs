use anyhow::Result;
use clap::{Args, Subcommand};

use crate::target::open_store;

#[derive(Debug, Clone, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Debug, Clone, Subcommand)]
pub enum ConfigAction {
    /// Show config file locations, settings, and the active selection
    Show,
}

pub fn run(args: ConfigArgs) -> Result<()> {
    match args.action {
        ConfigAction::Show => run_show(),
    }
}

fn run_show() -> Result<()> {
    let mut store = open_store()?;
    let settings = store.settings()?;
    let paths = store.paths().clone();

    println!("config_dir: {}", paths.config_dir.display());
    println!("user_metadata: {}", paths.user_metadata_file.display());
    println!("settings: {}", store.settings_path().display());
    println!("max_results: {}", settings.max_results);
    println!("default_columns: {}", settings.default_columns);
    println!(
        "completion_installed: {}",
        settings.completion_installed.unwrap_or(false)
    );

    let email = store.active_account_email();
    println!("active_account: {}", email.unwrap_or("(none)"));
    if let Some(email) = email {
        let spreadsheet = store.active_spreadsheet_name(email);
        println!("active_spreadsheet: {}", spreadsheet.unwrap_or("(none)"));
        if let Some(spreadsheet) = spreadsheet {
            println!(
                "active_sheet: {}",
                store
                    .active_sheet_name(email, spreadsheet)
                    .unwrap_or("(none)")
            );
        }
    }
    Ok(())
}
