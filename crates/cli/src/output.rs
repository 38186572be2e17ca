//! Rendering of cell blocks for `sheet read` / `sheet export`, and CSV input
//! for `sheet import`.

use std::path::Path;

use anyhow::{Context, Result};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ReadFormat {
    Markdown,
    Csv,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ExportFormat {
    Json,
    Csv,
}

fn width(cell: &str) -> usize {
    cell.chars().count()
}

fn markdown_cell(cell: &str) -> String {
    cell.replace('|', "\\|").replace('\n', " ")
}

/// Markdown table with the first row as header. Ragged rows are padded.
pub fn to_markdown(rows: &[Vec<String>]) -> String {
    let Some(cols) = rows.iter().map(Vec::len).max().filter(|&c| c > 0) else {
        return String::new();
    };
    let escaped: Vec<Vec<String>> = rows
        .iter()
        .map(|row| row.iter().map(|cell| markdown_cell(cell)).collect())
        .collect();
    let mut widths = vec![3usize; cols];
    for row in &escaped {
        for (i, cell) in row.iter().enumerate() {
            widths[i] = widths[i].max(width(cell));
        }
    }

    let render = |row: &[String]| {
        let cells: Vec<String> = (0..cols)
            .map(|i| {
                let cell = row.get(i).map(String::as_str).unwrap_or("");
                format!("{cell}{}", " ".repeat(widths[i].saturating_sub(width(cell))))
            })
            .collect();
        format!("| {} |", cells.join(" | "))
    };

    let mut lines = Vec::with_capacity(escaped.len() + 1);
    lines.push(render(&escaped[0]));
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    lines.push(format!("| {} |", rule.join(" | ")));
    lines.extend(escaped[1..].iter().map(|row| render(row)));
    lines.join("\n")
}

pub fn to_csv(rows: &[Vec<String>]) -> Result<String> {
    let mut writer = csv::WriterBuilder::new()
        .flexible(true)
        .from_writer(Vec::new());
    for row in rows {
        writer.write_record(row).context("encode csv row")?;
    }
    let bytes = writer.into_inner().context("flush csv")?;
    let text = String::from_utf8(bytes).context("csv output is not utf-8")?;
    Ok(text.trim_end_matches('\n').to_string())
}

/// JSON array with one object per data row, keyed by the header row.
pub fn to_json(rows: &[Vec<String>]) -> Result<String> {
    let Some((header, data)) = rows.split_first() else {
        return Ok("[]".to_string());
    };
    let objects: Vec<Value> = data
        .iter()
        .map(|row| {
            let mut obj = Map::new();
            for (i, key) in header.iter().enumerate() {
                let cell = row.get(i).cloned().unwrap_or_default();
                obj.insert(key.clone(), Value::String(cell));
            }
            Value::Object(obj)
        })
        .collect();
    Ok(serde_json::to_string_pretty(&objects)?)
}

pub fn render_read(rows: &[Vec<String>], format: ReadFormat) -> Result<String> {
    match format {
        ReadFormat::Markdown => Ok(to_markdown(rows)),
        ReadFormat::Csv => to_csv(rows),
    }
}

pub fn render_export(rows: &[Vec<String>], format: ExportFormat) -> Result<String> {
    match format {
        ExportFormat::Json => to_json(rows),
        ExportFormat::Csv => to_csv(rows),
    }
}

/// Parse CSV text into rows without treating the first line as special.
pub fn parse_csv(text: &str) -> Result<Vec<Vec<String>>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.context("parse csv")?;
        rows.push(record.iter().map(str::to_string).collect());
    }
    Ok(rows)
}

pub fn read_csv_file(path: &Path) -> Result<Vec<Vec<String>>> {
    let text =
        std::fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    parse_csv(&text).with_context(|| format!("parse {}", path.display()))
}

pub fn write_output(path: &Path, body: &str) -> Result<()> {
    let mut body = body.to_string();
    if !body.ends_with('\n') {
        body.push('\n');
    }
    std::fs::write(path, body).with_context(|| format!("write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(rows: &[&[&str]]) -> Vec<Vec<String>> {
        rows.iter()
            .map(|r| r.iter().map(|c| c.to_string()).collect())
            .collect()
    }

    #[test]
    fn markdown_pads_columns() {
        let rows = grid(&[&["Name", "Age"], &["John", "30"], &["Jane"]]);
        assert_eq!(
            to_markdown(&rows),
            "| Name | Age |\n| ---- | --- |\n| John | 30  |\n| Jane |     |"
        );
    }

    #[test]
    fn markdown_aligns_escaped_pipes() {
        let rows = grid(&[&["Expr", "Note"], &["a|b", "x"], &["cd", "line\nbreak"]]);
        assert_eq!(
            to_markdown(&rows),
            "| Expr | Note       |\n| ---- | ---------- |\n| a\\|b | x          |\n| cd   | line break |"
        );
    }

    #[test]
    fn markdown_of_nothing_is_empty() {
        assert_eq!(to_markdown(&[]), "");
    }

    #[test]
    fn csv_quotes_when_needed() {
        let rows = grid(&[&["a,b", "say \"hi\""], &["plain"]]);
        assert_eq!(to_csv(&rows).unwrap(), "\"a,b\",\"say \"\"hi\"\"\"\nplain");
    }

    #[test]
    fn json_keys_rows_by_header() {
        let rows = grid(&[&["Name", "Age"], &["John", "30"], &["Jane"]]);
        let parsed: Value = serde_json::from_str(&to_json(&rows).unwrap()).unwrap();
        assert_eq!(
            parsed,
            serde_json::json!([
                {"Name": "John", "Age": "30"},
                {"Name": "Jane", "Age": ""}
            ])
        );
        assert_eq!(to_json(&[]).unwrap(), "[]");
    }

    #[test]
    fn csv_input_keeps_quoted_separators() {
        let rows = parse_csv("h1,h2\n\"x, y\",2\nlone\n").unwrap();
        assert_eq!(rows, grid(&[&["h1", "h2"], &["x, y", "2"], &["lone"]]));
    }
}
