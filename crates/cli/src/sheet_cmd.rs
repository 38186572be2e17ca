//! Tab-level and cell-level operations on the active spreadsheet.
//!
//! Every handler validates its arguments before touching the store or the
//! network, so shape and range mistakes never cost a round trip.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Args, Subcommand};
use sheet_cmd_api_client::{RangeWrite, Render, SheetsClient};
use sheet_cmd_core::formula::formulas_in_row;
use sheet_cmd_core::rows::{Direction, formula_fill, plan_delete, plan_insert};
use sheet_cmd_core::validate::validate_block;
use sheet_cmd_core::values::{parse_row_values, parse_value_block};
use sheet_cmd_core::{CellAddress, CellRange, Error};
use sheet_cmd_local_store::{ResolvedTarget, TargetRequest};
use tracing::debug;

use crate::output::{self, ExportFormat, ReadFormat};
use crate::prompt;
use crate::target::{self, open_store};

#[derive(Debug, Clone, Args)]
pub struct SheetArgs {
    #[command(subcommand)]
    pub action: SheetAction,
}

/// `-n/--name`: act on this tab instead of the active one.
#[derive(Debug, Clone, Args)]
pub struct TabOverride {
    /// Sheet (tab) name; defaults to the active sheet
    #[arg(short, long)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Subcommand)]
pub enum SheetAction {
    /// List tabs of the active spreadsheet
    List,
    /// Make a tab the active sheet
    Select {
        /// Tab name (pick from the spreadsheet when omitted)
        #[arg(short, long)]
        name: Option<String>,
    },
    /// Print a tab's contents
    Read {
        #[command(flatten)]
        tab: TabOverride,
        /// Output format
        #[arg(short, long, value_enum, default_value = "markdown")]
        output: ReadFormat,
        /// Show formulas instead of computed values
        #[arg(short, long)]
        formulas: bool,
        /// Write the output to this file instead of stdout
        #[arg(short, long)]
        export: Option<PathBuf>,
        /// A1 range to read (e.g. A1:D20)
        #[arg(short, long)]
        range: Option<String>,
    },
    /// Create a new tab
    Add {
        /// Name of the new tab
        #[arg(short, long)]
        name: String,
    },
    /// Delete a tab
    Remove {
        #[command(flatten)]
        tab: TabOverride,
    },
    /// Rename a tab
    Rename {
        #[command(flatten)]
        tab: TabOverride,
        /// New tab name
        #[arg(long)]
        new_name: String,
    },
    /// Duplicate a tab within the spreadsheet
    Copy {
        #[command(flatten)]
        tab: TabOverride,
        /// Name of the copy
        #[arg(long)]
        to: String,
    },
    /// Write a cell or a rectangular range (`,` separates columns, `;` rows)
    Write {
        #[command(flatten)]
        tab: TabOverride,
        /// Single cell, e.g. B3
        #[arg(short, long, conflicts_with = "range", required_unless_present = "range")]
        cell: Option<String>,
        /// Range, e.g. A1:C2
        #[arg(short, long)]
        range: Option<String>,
        /// Value(s) to write
        #[arg(short, long)]
        value: String,
    },
    /// Append one row after the last row with data
    Append {
        #[command(flatten)]
        tab: TabOverride,
        /// Comma separated cell values
        #[arg(short, long)]
        value: String,
    },
    /// Load a CSV file into a tab
    Import {
        #[command(flatten)]
        tab: TabOverride,
        /// CSV file to import
        #[arg(short, long)]
        file: PathBuf,
        /// Drop the first CSV line
        #[arg(long)]
        skip_header: bool,
    },
    /// Export a tab as JSON or CSV
    Export {
        #[command(flatten)]
        tab: TabOverride,
        /// A1 range to export
        #[arg(short, long)]
        range: Option<String>,
        /// Export format
        #[arg(short = 'F', long, value_enum)]
        format: ExportFormat,
        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Insert blank rows next to a row
    RowAdd {
        #[command(flatten)]
        tab: TabOverride,
        #[command(flatten)]
        rows: RowArgs,
        /// Copy formulas and formatting from the adjacent row
        #[arg(long)]
        formulas: bool,
    },
    /// Delete rows relative to a row
    RowRemove {
        #[command(flatten)]
        tab: TabOverride,
        #[command(flatten)]
        rows: RowArgs,
    },
}

#[derive(Debug, Clone, Args)]
pub struct RowArgs {
    /// 1-based row number
    #[arg(long)]
    pub row: usize,
    /// Act above the row
    #[arg(long)]
    pub above: bool,
    /// Act below the row
    #[arg(long)]
    pub below: bool,
    /// Number of rows
    #[arg(long, default_value_t = 1)]
    pub count: usize,
}

pub async fn run(args: SheetArgs) -> Result<()> {
    match args.action {
        SheetAction::List => run_list().await,
        SheetAction::Select { name } => run_select(name).await,
        SheetAction::Read {
            tab,
            output,
            formulas,
            export,
            range,
        } => run_read(tab, output, formulas, export, range).await,
        SheetAction::Add { name } => run_add(name).await,
        SheetAction::Remove { tab } => run_remove(tab).await,
        SheetAction::Rename { tab, new_name } => run_rename(tab, new_name).await,
        SheetAction::Copy { tab, to } => run_copy(tab, to).await,
        SheetAction::Write {
            tab,
            cell,
            range,
            value,
        } => run_write(tab, cell, range, value).await,
        SheetAction::Append { tab, value } => run_append(tab, value).await,
        SheetAction::Import {
            tab,
            file,
            skip_header,
        } => run_import(tab, file, skip_header).await,
        SheetAction::Export {
            tab,
            range,
            format,
            output,
        } => run_export(tab, range, format, output).await,
        SheetAction::RowAdd {
            tab,
            rows,
            formulas,
        } => run_row_add(tab, rows, formulas).await,
        SheetAction::RowRemove { tab, rows } => run_row_remove(tab, rows).await,
    }
}

/// Resolve the tab target and an authenticated client for it.
async fn open_tab(tab: &TabOverride) -> Result<(ResolvedTarget, SheetsClient)> {
    let mut store = open_store()?;
    let resolved = target::resolve(&mut store, &TargetRequest::sheet(tab.name.clone())).await?;
    let client = target::sheets_client(&resolved)?;
    Ok((resolved, client))
}

async fn open_spreadsheet() -> Result<(ResolvedTarget, SheetsClient)> {
    let mut store = open_store()?;
    let resolved = target::resolve(&mut store, &TargetRequest::spreadsheet_only()).await?;
    let client = target::sheets_client(&resolved)?;
    Ok((resolved, client))
}

fn plural(n: usize) -> &'static str {
    if n == 1 { "row" } else { "rows" }
}

async fn run_list() -> Result<()> {
    let (resolved, client) = open_spreadsheet().await?;
    let info = client.spreadsheet_info().await?;
    println!("{} ({})", info.title, resolved.spreadsheet_name);
    for sheet in &info.sheets {
        let marker = if resolved.sheet_name.as_deref() == Some(sheet.title.as_str()) {
            "*"
        } else {
            " "
        };
        match &sheet.grid_properties {
            Some(grid) => println!(
                "{marker} {}  ({}x{})",
                sheet.title, grid.row_count, grid.column_count
            ),
            None => println!("{marker} {}", sheet.title),
        }
    }
    Ok(())
}

async fn run_select(name: Option<String>) -> Result<()> {
    let mut store = open_store()?;
    let name = match name.filter(|n| !n.is_empty()) {
        Some(name) => name,
        None => {
            let resolved = target::resolve(&mut store, &TargetRequest::spreadsheet_only()).await?;
            let info = target::sheets_client(&resolved)?.spreadsheet_info().await?;
            let titles: Vec<String> = info.sheets.iter().map(|s| s.title.clone()).collect();
            let current = resolved
                .sheet_name
                .as_deref()
                .and_then(|active| titles.iter().position(|t| t == active))
                .unwrap_or(0);
            let idx = prompt::choose("Sheet to select", &titles, current, "pass --name")?;
            titles[idx].clone()
        }
    };
    let selection = sheet_cmd_local_store::resolve_selection(&store, &TargetRequest::spreadsheet_only())?;
    store.set_active_sheet(&selection.email, &selection.spreadsheet_name, &name)?;
    println!("Active sheet: {name}");
    Ok(())
}

async fn run_read(
    tab: TabOverride,
    format: ReadFormat,
    formulas: bool,
    export: Option<PathBuf>,
    range: Option<String>,
) -> Result<()> {
    let (resolved, client) = open_tab(&tab).await?;
    let sheet = resolved.sheet()?;
    let render = Render::from_formulas(formulas);
    let rows = match range.as_deref() {
        Some(range) => client.read_values(sheet, Some(range), render).await?,
        None => client.read_sheet(sheet, render).await?,
    };
    let body = output::render_read(&rows, format)?;
    match export {
        Some(path) => {
            output::write_output(&path, &body)?;
            println!("Wrote {} {} to {}", rows.len(), plural(rows.len()), path.display());
        }
        None if rows.is_empty() => println!("Sheet '{sheet}' is empty"),
        None => println!("{body}"),
    }
    Ok(())
}

async fn run_add(name: String) -> Result<()> {
    if name.trim().is_empty() {
        return Err(Error::InvalidArgument("sheet name cannot be empty".to_string()).into());
    }
    let (resolved, client) = open_spreadsheet().await?;
    client.add_sheet(&name).await?;
    println!("Added sheet '{name}' to {}", resolved.spreadsheet_name);
    Ok(())
}

async fn run_remove(tab: TabOverride) -> Result<()> {
    let (resolved, client) = open_tab(&tab).await?;
    let sheet = resolved.sheet()?;
    if !prompt::confirm(&format!("Delete sheet '{sheet}' and all its data?"))? {
        println!("Cancelled");
        return Ok(());
    }
    client.delete_sheet(sheet).await?;

    let mut store = open_store()?;
    if store.active_sheet_name(&resolved.email, &resolved.spreadsheet_name) == Some(sheet) {
        store.clear_active_sheet(&resolved.email, &resolved.spreadsheet_name)?;
    }
    println!("Removed sheet '{sheet}'");
    Ok(())
}

async fn run_rename(tab: TabOverride, new_name: String) -> Result<()> {
    if new_name.trim().is_empty() {
        return Err(Error::InvalidArgument("new sheet name cannot be empty".to_string()).into());
    }
    let (resolved, client) = open_tab(&tab).await?;
    let sheet = resolved.sheet()?;
    client.rename_sheet(sheet, &new_name).await?;

    let mut store = open_store()?;
    if store.active_sheet_name(&resolved.email, &resolved.spreadsheet_name) == Some(sheet) {
        store.set_active_sheet(&resolved.email, &resolved.spreadsheet_name, &new_name)?;
    }
    println!("Renamed sheet '{sheet}' to '{new_name}'");
    Ok(())
}

async fn run_copy(tab: TabOverride, to: String) -> Result<()> {
    if to.trim().is_empty() {
        return Err(Error::InvalidArgument("copy name cannot be empty".to_string()).into());
    }
    let (resolved, client) = open_tab(&tab).await?;
    let sheet = resolved.sheet()?;
    client.duplicate_sheet(sheet, &to).await?;
    println!("Copied sheet '{sheet}' to '{to}'");
    Ok(())
}

/// A validated write request: where it lands and what goes there.
#[derive(Debug, PartialEq, Eq)]
pub(crate) struct WritePlan {
    pub range: String,
    pub values: Vec<Vec<String>>,
}

pub(crate) fn plan_write(cell: Option<&str>, range: Option<&str>, value: &str) -> Result<WritePlan> {
    match (cell, range) {
        (Some(cell), None) => {
            let address = CellAddress::parse(cell)?;
            Ok(WritePlan {
                range: address.to_string(),
                values: vec![vec![value.to_string()]],
            })
        }
        (None, Some(range)) => {
            let parsed = CellRange::parse(range)?;
            let values = parse_value_block(value);
            validate_block(&parsed, &values).with_context(|| {
                format!(
                    "range {parsed} expects {}x{} values",
                    parsed.rows(),
                    parsed.cols()
                )
            })?;
            Ok(WritePlan {
                range: parsed.to_string(),
                values,
            })
        }
        (Some(_), Some(_)) => bail!("use either --cell or --range, not both"),
        (None, None) => bail!("either --cell or --range is required"),
    }
}

async fn run_write(
    tab: TabOverride,
    cell: Option<String>,
    range: Option<String>,
    value: String,
) -> Result<()> {
    let plan = plan_write(cell.as_deref(), range.as_deref(), &value)?;
    let (resolved, client) = open_tab(&tab).await?;
    let sheet = resolved.sheet()?;
    client.write_values(sheet, &plan.range, &plan.values).await?;
    println!("Updated {} in '{sheet}'", plan.range);
    Ok(())
}

async fn run_append(tab: TabOverride, value: String) -> Result<()> {
    let row = parse_row_values(&value);
    let (resolved, client) = open_tab(&tab).await?;
    let sheet = resolved.sheet()?;
    client.append_row(sheet, &row).await?;
    println!("Appended 1 row to '{sheet}'");
    Ok(())
}

async fn run_import(tab: TabOverride, file: PathBuf, skip_header: bool) -> Result<()> {
    let mut rows = output::read_csv_file(&file)?;
    if skip_header && !rows.is_empty() {
        rows.remove(0);
    }
    let Some((first, rest)) = rows.split_first() else {
        bail!("{} has no rows to import", file.display());
    };

    let (resolved, client) = open_tab(&tab).await?;
    let sheet = resolved.sheet()?;
    client.write_values(sheet, "A1", &[first.clone()]).await?;
    client.append_rows(sheet, rest).await?;
    println!(
        "Imported {} {} from {} into '{sheet}'",
        rows.len(),
        plural(rows.len()),
        file.display()
    );
    Ok(())
}

async fn run_export(
    tab: TabOverride,
    range: Option<String>,
    format: ExportFormat,
    output_path: Option<PathBuf>,
) -> Result<()> {
    let (resolved, client) = open_tab(&tab).await?;
    let sheet = resolved.sheet()?;
    let rows = match range.as_deref() {
        Some(range) => client.read_values(sheet, Some(range), Render::Formatted).await?,
        None => client.read_sheet(sheet, Render::Formatted).await?,
    };
    let body = output::render_export(&rows, format)?;
    match output_path {
        Some(path) => {
            output::write_output(&path, &body)?;
            println!("Exported '{sheet}' to {}", path.display());
        }
        None => println!("{body}"),
    }
    Ok(())
}

async fn run_row_add(tab: TabOverride, rows: RowArgs, formulas: bool) -> Result<()> {
    let direction = Direction::from_flags(rows.above, rows.below)?;
    let plan = plan_insert(rows.row, direction, rows.count, formulas)?;
    let (resolved, client) = open_tab(&tab).await?;
    let sheet = resolved.sheet()?;

    let source = match (formulas, plan.formula_source) {
        (true, Some(source)) => {
            let a1 = format!("{0}:{0}", source + 1);
            let row = client
                .read_values(sheet, Some(a1.as_str()), Render::Formula)
                .await?
                .into_iter()
                .next()
                .unwrap_or_default();
            Some((source, formulas_in_row(&row)))
        }
        _ => None,
    };

    client
        .insert_rows(sheet, plan.span, plan.inherit_from_before)
        .await?;

    let side = direction.unwrap_or(Direction::Above).as_str();
    println!(
        "Added {} {} {side} row {} in '{sheet}'",
        rows.count,
        plural(rows.count),
        rows.row
    );

    if let Some((source_row, map)) = source {
        let writes: Vec<RangeWrite> = formula_fill(source_row, &map, plan.span)
            .into_iter()
            .map(|w| RangeWrite {
                range: w.a1(),
                values: vec![vec![w.formula]],
            })
            .collect();
        debug!(source_row, formulas = writes.len(), "copying formulas");
        client.batch_write_values(sheet, &writes).await?;
        println!("Copied formulas from row {}", source_row + 1);
    } else if formulas {
        println!("No row above row {} to copy formulas from", rows.row);
    }
    Ok(())
}

async fn run_row_remove(tab: TabOverride, rows: RowArgs) -> Result<()> {
    let direction = Direction::from_flags(rows.above, rows.below)?;
    let span = plan_delete(rows.row, direction, rows.count)?;
    let (resolved, client) = open_tab(&tab).await?;
    let sheet = resolved.sheet()?;
    client.delete_rows(sheet, span).await?;
    println!(
        "Removed {} {} (rows {}-{}) from '{sheet}'",
        span.len(),
        plural(span.len()),
        span.start + 1,
        span.end
    );
    Ok(())
}
