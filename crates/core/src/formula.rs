//! Best-effort row shifting of A1 references inside formula text.
//!
//! This is string rewriting, not parsing. It shifts the row of every
//! `LETTERS+DIGITS` token by a fixed delta and leaves column letters alone.
//! Known gaps: `$` markers are kept but not honored (absolute rows still
//! move), references into other sheets shift like local ones, and a token
//! whose shifted row would fall below 1 is left as written. Double-quoted
//! string literals and single-quoted sheet names are copied verbatim, and
//! tokens glued to other identifier characters or followed by `(` (function
//! names such as `LOG10(`) are skipped.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;

static REF_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\$?[A-Za-z]{1,3})(\$?)([0-9]+)").unwrap());

/// Formulas of one source row, keyed by zero-based column.
pub type RowFormulaMap = BTreeMap<usize, String>;

/// Collect the cells of `row` that hold a formula (text starting with `=`).
pub fn formulas_in_row<S: AsRef<str>>(row: &[S]) -> RowFormulaMap {
    row.iter()
        .enumerate()
        .filter(|(_, cell)| cell.as_ref().starts_with('='))
        .map(|(col, cell)| (col, cell.as_ref().to_string()))
        .collect()
}

/// Add `delta` to the row number of every cell reference in `formula`.
pub fn shift_formula(formula: &str, delta: i64) -> String {
    if delta == 0 {
        return formula.to_string();
    }
    let mut out = String::with_capacity(formula.len() + 8);
    let mut rest = formula;
    while let Some(open) = rest.find(['"', '\'']) {
        out.push_str(&shift_segment(&rest[..open], delta));
        let quote = rest.as_bytes()[open] as char;
        // Doubled quotes inside a literal split it into adjacent quoted runs.
        let end = match rest[open + 1..].find(quote) {
            Some(close) => open + 1 + close + 1,
            None => rest.len(),
        };
        out.push_str(&rest[open..end]);
        rest = &rest[end..];
    }
    out.push_str(&shift_segment(rest, delta));
    out
}

fn is_identifier_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_' || ch == '.'
}

fn shift_segment(segment: &str, delta: i64) -> String {
    let mut out = String::with_capacity(segment.len() + 8);
    let mut last = 0;
    for caps in REF_RE.captures_iter(segment) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        let before = segment[..whole.start()].chars().next_back();
        let after = segment[whole.end()..].chars().next();
        if before.is_some_and(is_identifier_char)
            || after.is_some_and(|c| is_identifier_char(c) || c == '(')
        {
            continue;
        }
        let Ok(row) = caps[3].parse::<i64>() else {
            continue;
        };
        let shifted = row.saturating_add(delta);
        if shifted < 1 {
            continue;
        }
        out.push_str(&segment[last..whole.start()]);
        out.push_str(&caps[1]);
        out.push_str(&caps[2]);
        out.push_str(&shifted.to_string());
        last = whole.end();
    }
    out.push_str(&segment[last..]);
    out
}
