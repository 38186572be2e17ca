mod account_cmd;
mod completion_cmd;
mod config_cmd;
mod oauth_flow;
mod output;
mod prompt;
mod sheet_cmd;
mod spreadsheet_cmd;
mod target;

use clap::{Parser, Subcommand};
use sheet_cmd_core::Error;

#[derive(Parser)]
#[command(
    name = "sheet-cmd",
    version,
    about = "Google Sheets from the command line, across multiple accounts"
)]
pub struct Cli {
    /// Log debug output to stderr
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage authorized Google accounts
    Account(account_cmd::AccountArgs),
    /// Manage registered spreadsheets of the active account
    Spreadsheet(spreadsheet_cmd::SpreadsheetArgs),
    /// Work with tabs and cells of the active spreadsheet
    Sheet(sheet_cmd::SheetArgs),
    /// Shell completion scripts
    Completion(completion_cmd::CompletionArgs),
    /// Inspect local configuration
    Config(config_cmd::ConfigArgs),
}

fn hint(err: &anyhow::Error) -> Option<String> {
    match err.downcast_ref::<Error>()? {
        Error::DimensionMismatch {
            expected_rows,
            expected_cols,
            ..
        } => Some(format!(
            "Tip: provide {expected_rows} row(s) with {expected_cols} column(s) each, e.g. \"a,b;c,d\""
        )),
        Error::Remote(msg) if msg.starts_with("401") => {
            Some("Tip: the stored authorization may be stale; try `sheet-cmd account reauth`".to_string())
        }
        _ => None,
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .init();

    let result = match cli.command {
        Commands::Account(args) => account_cmd::run(args).await,
        Commands::Spreadsheet(args) => spreadsheet_cmd::run(args).await,
        Commands::Sheet(args) => sheet_cmd::run(args).await,
        Commands::Completion(args) => completion_cmd::run(args),
        Commands::Config(args) => config_cmd::run(args),
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        if let Some(tip) = hint(&e) {
            eprintln!("{tip}");
        }
        std::process::exit(1);
    }
}
