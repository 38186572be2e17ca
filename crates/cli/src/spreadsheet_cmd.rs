use anyhow::{Result, bail};
use clap::{Args, Subcommand};
use sheet_cmd_api_client::SheetsClient;
use sheet_cmd_core::Error;
use sheet_cmd_local_store::ConfigStore;

use crate::prompt;
use crate::target::{self, open_store};

#[derive(Debug, Clone, Args)]
pub struct SpreadsheetArgs {
    #[command(subcommand)]
    pub action: SpreadsheetAction,
}

#[derive(Debug, Clone, Subcommand)]
pub enum SpreadsheetAction {
    /// Register a spreadsheet under the active account
    Add {
        /// Spreadsheet id from its URL (pick from Drive when omitted)
        #[arg(long)]
        id: Option<String>,
        /// Local name (defaults to the spreadsheet title)
        #[arg(long)]
        name: Option<String>,
    },
    /// List registered spreadsheets of the active account
    List,
    /// Show the active spreadsheet
    Active,
    /// Make a registered spreadsheet the active one
    Select {
        /// Local name (interactive when omitted)
        name: Option<String>,
    },
    /// Unregister a spreadsheet (nothing is deleted remotely)
    Remove {
        /// Local name (interactive when omitted)
        name: Option<String>,
    },
}

pub async fn run(args: SpreadsheetArgs) -> Result<()> {
    match args.action {
        SpreadsheetAction::Add { id, name } => run_add(id, name).await,
        SpreadsheetAction::List => run_list(),
        SpreadsheetAction::Active => run_active(),
        SpreadsheetAction::Select { name } => run_select(name),
        SpreadsheetAction::Remove { name } => run_remove(name),
    }
}

fn active_email(store: &ConfigStore) -> Result<String> {
    Ok(store
        .active_account_email()
        .ok_or(Error::NoActiveAccount)?
        .to_string())
}

async fn run_add(id: Option<String>, name: Option<String>) -> Result<()> {
    let mut store = open_store()?;
    let email = active_email(&store)?;

    let (spreadsheet_id, name) = match (id, name) {
        (Some(id), Some(name)) => (id, name),
        (Some(id), None) => {
            let (_, credential) = target::active_account(&mut store).await?;
            let client = SheetsClient::new(&id, target::access_token(&credential)?)?;
            let title = client.spreadsheet_info().await?.title;
            (id, title)
        }
        (None, name) => {
            let limit = store.settings()?.max_results;
            let (_, credential) = target::active_account(&mut store).await?;
            let files = target::drive_client(&credential)?
                .list_spreadsheets(limit)
                .await?;
            if files.is_empty() {
                bail!("no spreadsheets found in Google Drive for {email}");
            }
            let items: Vec<String> = files
                .iter()
                .map(|f| format!("{}  ({})", f.name, f.id))
                .collect();
            let idx = prompt::choose("Spreadsheet to add", &items, 0, "pass --id")?;
            let picked = &files[idx];
            (picked.id.clone(), name.unwrap_or_else(|| picked.name.clone()))
        }
    };

    if let Some((existing, _)) = store.find_spreadsheet_by_id(&email, &spreadsheet_id) {
        bail!("spreadsheet {spreadsheet_id} is already registered as '{existing}'");
    }
    store.add_spreadsheet(&email, &name, &spreadsheet_id)?;
    let activated = store.active_spreadsheet_name(&email).is_none();
    if activated {
        store.set_active_spreadsheet(&email, &name)?;
    }

    println!("Added spreadsheet '{name}' ({spreadsheet_id})");
    if activated {
        println!("Active spreadsheet: {name}");
    }
    Ok(())
}

fn run_list() -> Result<()> {
    let store = open_store()?;
    let email = active_email(&store)?;
    let listed = store.list_spreadsheets(&email)?;
    if listed.is_empty() {
        println!("No spreadsheets for {email}. Run `sheet-cmd spreadsheet add`.");
        return Ok(());
    }
    for entry in listed {
        let marker = if entry.is_active { "*" } else { " " };
        match entry.active_sheet {
            Some(sheet) => println!(
                "{marker} {}  {}  [sheet: {sheet}]",
                entry.name, entry.spreadsheet_id
            ),
            None => println!("{marker} {}  {}", entry.name, entry.spreadsheet_id),
        }
    }
    Ok(())
}

fn run_active() -> Result<()> {
    let store = open_store()?;
    let email = active_email(&store)?;
    let name = store
        .active_spreadsheet_name(&email)
        .ok_or(Error::NoActiveSpreadsheet)?;
    let entry = store
        .spreadsheet(&email, name)
        .ok_or_else(|| Error::NotFound(format!("spreadsheet '{name}' for account '{email}'")))?;
    println!("Account: {email}");
    println!("Spreadsheet: {name}");
    println!("Id: {}", entry.spreadsheet_id);
    println!(
        "Sheet: {}",
        entry.active_sheet.as_deref().unwrap_or("(none)")
    );
    Ok(())
}

fn pick_spreadsheet(store: &ConfigStore, email: &str, name: Option<String>, verb: &str) -> Result<String> {
    if let Some(name) = name {
        return Ok(name);
    }
    let listed = store.list_spreadsheets(email)?;
    if listed.is_empty() {
        bail!("No spreadsheets for {email}. Run `sheet-cmd spreadsheet add`.");
    }
    let names: Vec<String> = listed.iter().map(|s| s.name.clone()).collect();
    let current = listed.iter().position(|s| s.is_active).unwrap_or(0);
    let idx = prompt::choose(
        &format!("Spreadsheet to {verb}"),
        &names,
        current,
        "pass the spreadsheet name",
    )?;
    Ok(names[idx].clone())
}

fn run_select(name: Option<String>) -> Result<()> {
    let mut store = open_store()?;
    let email = active_email(&store)?;
    let name = pick_spreadsheet(&store, &email, name, "select")?;
    store.set_active_spreadsheet(&email, &name)?;
    println!("Active spreadsheet: {name}");
    Ok(())
}

fn run_remove(name: Option<String>) -> Result<()> {
    let mut store = open_store()?;
    let email = active_email(&store)?;
    let name = pick_spreadsheet(&store, &email, name, "remove")?;
    if store.spreadsheet(&email, &name).is_none() {
        return Err(Error::NotFound(format!("spreadsheet '{name}' for account '{email}'")).into());
    }
    if !prompt::confirm(&format!("Unregister '{name}'?"))? {
        println!("Cancelled");
        return Ok(());
    }
    store.remove_spreadsheet(&email, &name)?;
    println!("Removed spreadsheet '{name}'");
    Ok(())
}
