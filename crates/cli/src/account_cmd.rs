use anyhow::{Result, bail};
use clap::{Args, Subcommand};
use sheet_cmd_api_client::OAuthApp;
use sheet_cmd_core::Error;

use crate::oauth_flow;
use crate::prompt;
use crate::target::open_store;

#[derive(Debug, Clone, Args)]
pub struct AccountArgs {
    #[command(subcommand)]
    pub action: AccountAction,
}

#[derive(Debug, Clone, Subcommand)]
pub enum AccountAction {
    /// Authorize a Google account with your own OAuth client
    Add {
        /// OAuth client id (prompted when omitted)
        #[arg(long)]
        client_id: Option<String>,
        /// OAuth client secret (prompted when omitted)
        #[arg(long)]
        client_secret: Option<String>,
    },
    /// List authorized accounts
    List,
    /// Make an account the active one
    Select {
        /// Account email (interactive when omitted)
        email: Option<String>,
    },
    /// Forget an account and its registered spreadsheets
    Remove {
        /// Account email (interactive when omitted)
        email: Option<String>,
    },
    /// Re-run the consent flow for the active account
    Reauth,
}

pub async fn run(args: AccountArgs) -> Result<()> {
    match args.action {
        AccountAction::Add {
            client_id,
            client_secret,
        } => run_add(client_id, client_secret).await,
        AccountAction::List => run_list(),
        AccountAction::Select { email } => run_select(email),
        AccountAction::Remove { email } => run_remove(email),
        AccountAction::Reauth => run_reauth().await,
    }
}

async fn run_add(client_id: Option<String>, client_secret: Option<String>) -> Result<()> {
    let mut store = open_store()?;
    let client_id = match client_id {
        Some(id) => id,
        None => prompt::text("OAuth client id", "pass --client-id")?,
    };
    let client_secret = match client_secret {
        Some(secret) => secret,
        None => prompt::secret("OAuth client secret", "pass --client-secret")?,
    };
    if client_id.is_empty() || client_secret.is_empty() {
        bail!("client id and client secret are both required");
    }

    let app = OAuthApp {
        client_id,
        client_secret,
    };
    let authorized = oauth_flow::authorize(&app).await?;
    let email = authorized.email;

    store.add_account(&email, authorized.credential)?;
    let activated = store.active_account_email().is_none();
    if activated {
        store.set_active_account(&email)?;
    }

    println!("Added account {email}");
    if activated {
        println!("Active account: {email}");
    }
    Ok(())
}

fn run_list() -> Result<()> {
    let store = open_store()?;
    let active = store.active_account_email();
    let mut any = false;
    for account in store.accounts() {
        any = true;
        let marker = if active == Some(account.email.as_str()) {
            "*"
        } else {
            " "
        };
        println!(
            "{marker} {}  ({} spreadsheet{})",
            account.email,
            account.spreadsheets.len(),
            if account.spreadsheets.len() == 1 { "" } else { "s" }
        );
    }
    if !any {
        println!("No accounts. Run `sheet-cmd account add`.");
    }
    Ok(())
}

fn pick_account(
    store: &sheet_cmd_local_store::ConfigStore,
    email: Option<String>,
    verb: &str,
) -> Result<String> {
    if let Some(email) = email {
        return Ok(email);
    }
    let emails: Vec<String> = store.accounts().map(|a| a.email.clone()).collect();
    if emails.is_empty() {
        bail!("No accounts. Run `sheet-cmd account add`.");
    }
    let current = store
        .active_account_email()
        .and_then(|active| emails.iter().position(|e| e == active))
        .unwrap_or(0);
    let idx = prompt::choose(
        &format!("Account to {verb}"),
        &emails,
        current,
        "pass the account email",
    )?;
    Ok(emails[idx].clone())
}

fn run_select(email: Option<String>) -> Result<()> {
    let mut store = open_store()?;
    let email = pick_account(&store, email, "select")?;
    store.set_active_account(&email)?;
    println!("Active account: {email}");
    Ok(())
}

fn run_remove(email: Option<String>) -> Result<()> {
    let mut store = open_store()?;
    let email = pick_account(&store, email, "remove")?;
    if store.account(&email).is_none() {
        return Err(Error::NotFound(format!("account '{email}'")).into());
    }
    if !prompt::confirm(&format!("Remove {email} and its registered spreadsheets?"))? {
        println!("Cancelled");
        return Ok(());
    }
    store.remove_account(&email)?;
    println!("Removed account {email}");
    Ok(())
}

async fn run_reauth() -> Result<()> {
    let mut store = open_store()?;
    let email = store
        .active_account_email()
        .ok_or(Error::NoActiveAccount)?
        .to_string();
    let current = store
        .account(&email)
        .ok_or_else(|| Error::NotFound(format!("account '{email}'")))?
        .oauth
        .clone();

    let app = OAuthApp {
        client_id: current.client_id,
        client_secret: current.client_secret,
    };
    let authorized = oauth_flow::authorize(&app).await?;
    if authorized.email != email {
        bail!(
            "signed in as {} but the active account is {email}; sign in with {email}",
            authorized.email
        );
    }
    store.update_account_credentials(&email, authorized.credential)?;
    println!("Re-authorized {email}");
    Ok(())
}
