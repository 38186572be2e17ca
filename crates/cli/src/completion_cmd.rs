use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Args, CommandFactory, Subcommand};
use clap_complete::Shell;
use tracing::debug;

use crate::Cli;
use crate::target::open_store;

const BIN_NAME: &str = "sheet-cmd";

#[derive(Debug, Clone, Args)]
pub struct CompletionArgs {
    #[command(subcommand)]
    pub action: CompletionAction,
}

#[derive(Debug, Clone, Subcommand)]
pub enum CompletionAction {
    /// Install the completion script for your shell
    Install {
        /// Shell to install for (detected from $SHELL when omitted)
        #[arg(long, value_enum)]
        shell: Option<Shell>,
    },
    /// Print the completion script to stdout
    Generate {
        #[arg(value_enum)]
        shell: Shell,
    },
}

pub fn run(args: CompletionArgs) -> Result<()> {
    match args.action {
        CompletionAction::Install { shell } => run_install(shell),
        CompletionAction::Generate { shell } => {
            print!("{}", script(shell)?);
            Ok(())
        }
    }
}

pub fn script(shell: Shell) -> Result<String> {
    let mut buf = Vec::new();
    clap_complete::generate(shell, &mut Cli::command(), BIN_NAME, &mut buf);
    String::from_utf8(buf).context("completion script is not utf-8")
}

/// Where each supported shell picks completion scripts up from.
fn install_path(shell: Shell, home: &Path) -> Result<PathBuf> {
    let path = match shell {
        Shell::Bash => home
            .join(".local/share/bash-completion/completions")
            .join(BIN_NAME),
        Shell::Zsh => home.join(".zfunc").join(format!("_{BIN_NAME}")),
        Shell::Fish => home
            .join(".config/fish/completions")
            .join(format!("{BIN_NAME}.fish")),
        other => bail!(
            "automatic install is not supported for {other}; run `sheet-cmd completion generate {other}` and source the output"
        ),
    };
    Ok(path)
}

fn run_install(shell: Option<Shell>) -> Result<()> {
    let shell = match shell.or_else(Shell::from_env) {
        Some(shell) => shell,
        None => bail!("could not detect your shell; pass --shell"),
    };
    let home = directories::BaseDirs::new()
        .context("could not determine home directory")?
        .home_dir()
        .to_path_buf();
    let path = install_path(shell, &home)?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
    }
    std::fs::write(&path, script(shell)?).with_context(|| format!("write {}", path.display()))?;
    debug!(path = %path.display(), "wrote completion script");

    let mut store = open_store()?;
    store.mark_completion_installed()?;

    println!("Installed {shell} completion to {}", path.display());
    if shell == Shell::Zsh {
        println!("Make sure ~/.zshrc has: fpath=(~/.zfunc $fpath); autoload -Uz compinit && compinit");
    }
    println!("Restart your shell to enable it.");
    Ok(())
}
