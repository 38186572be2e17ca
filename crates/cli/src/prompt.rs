use std::io::IsTerminal;

use anyhow::{Context, Result, bail};
use dialoguer::{Confirm, Input, Password, Select};

pub fn can_prompt() -> bool {
    std::io::stdin().is_terminal() && std::io::stdout().is_terminal()
}

/// Pick one of `items`, or fail with `hint` when there is no terminal.
pub fn choose(prompt: &str, items: &[String], default: usize, hint: &str) -> Result<usize> {
    if items.is_empty() {
        bail!("nothing to choose from");
    }
    if !can_prompt() {
        bail!("{hint}");
    }
    Select::new()
        .with_prompt(prompt)
        .items(items)
        .default(default.min(items.len() - 1))
        .interact()
        .context("selection cancelled")
}

pub fn confirm(prompt: &str) -> Result<bool> {
    if !can_prompt() {
        return Ok(true);
    }
    Confirm::new()
        .with_prompt(prompt)
        .default(false)
        .interact()
        .context("confirmation cancelled")
}

pub fn text(prompt: &str, hint: &str) -> Result<String> {
    if !can_prompt() {
        bail!("{hint}");
    }
    let value: String = Input::new()
        .with_prompt(prompt)
        .interact_text()
        .context("input cancelled")?;
    Ok(value.trim().to_string())
}

pub fn secret(prompt: &str, hint: &str) -> Result<String> {
    if !can_prompt() {
        bail!("{hint}");
    }
    let value = Password::new()
        .with_prompt(prompt)
        .interact()
        .context("input cancelled")?;
    Ok(value.trim().to_string())
}
