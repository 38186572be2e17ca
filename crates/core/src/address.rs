//! A1 notation: column letters, cell addresses, and rectangular ranges.
//!
//! Columns are a bijective base-26 numeral ("A" = 0, "Z" = 25, "AA" = 26).
//! Rows are 1-based in text and 0-based in [`CellAddress`].

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::{Error, Result};

static CELL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([A-Za-z]+)([0-9]+)$").unwrap());

/// Convert column letters to a zero-based column index. Case-insensitive.
pub fn column_letter_to_index(letters: &str) -> Result<usize> {
    if letters.is_empty() {
        return Err(Error::InvalidAddress(letters.to_string()));
    }
    let invalid = || Error::InvalidAddress(letters.to_string());
    // The letters for `usize::MAX` encode `usize::MAX + 1`, so accumulate wide.
    let mut value: u128 = 0;
    for ch in letters.chars() {
        if !ch.is_ascii_alphabetic() {
            return Err(invalid());
        }
        let digit = u128::from(ch.to_ascii_uppercase() as u8 - b'A') + 1;
        value = value
            .checked_mul(26)
            .and_then(|v| v.checked_add(digit))
            .ok_or_else(invalid)?;
    }
    usize::try_from(value - 1).map_err(|_| invalid())
}

/// Convert a zero-based column index to upper-case column letters.
pub fn index_to_column_letter(index: usize) -> String {
    let mut out = Vec::new();
    let mut n = index as u128 + 1;
    while n > 0 {
        n -= 1;
        out.push(b'A' + (n % 26) as u8);
        n /= 26;
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}

/// Quote a sheet title for use in an A1 reference (`'Q1 Budget'`).
pub fn quote_sheet_name(sheet: &str) -> String {
    format!("'{}'", sheet.replace('\'', "''"))
}

/// Prefix an A1 cell or range with its sheet: `'Sheet 1'!A1:B2`.
pub fn qualify(sheet: &str, a1: &str) -> String {
    format!("{}!{}", quote_sheet_name(sheet), a1)
}

/// Zero-based cell coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CellAddress {
    pub row: usize,
    pub col: usize,
}

impl CellAddress {
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    pub fn parse(input: &str) -> Result<Self> {
        let caps = CELL_RE
            .captures(input.trim())
            .ok_or_else(|| Error::InvalidAddress(input.to_string()))?;
        let col = column_letter_to_index(&caps[1])?;
        let row_number: usize = caps[2]
            .parse()
            .map_err(|_| Error::InvalidAddress(input.to_string()))?;
        if row_number == 0 {
            return Err(Error::InvalidAddress(input.to_string()));
        }
        Ok(Self {
            row: row_number - 1,
            col,
        })
    }
}

impl fmt::Display for CellAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", index_to_column_letter(self.col), self.row + 1)
    }
}

impl FromStr for CellAddress {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Inclusive rectangle of cells with `start <= end` on both axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellRange {
    pub start: CellAddress,
    pub end: CellAddress,
}

impl CellRange {
    /// Build a range from two corners in any order.
    pub fn new(a: CellAddress, b: CellAddress) -> Self {
        Self {
            start: CellAddress::new(a.row.min(b.row), a.col.min(b.col)),
            end: CellAddress::new(a.row.max(b.row), a.col.max(b.col)),
        }
    }

    pub fn parse(input: &str) -> Result<Self> {
        let parts: Vec<&str> = input.trim().split(':').collect();
        if parts.len() != 2 {
            return Err(Error::InvalidAddress(input.to_string()));
        }
        let start = CellAddress::parse(parts[0])
            .map_err(|_| Error::InvalidAddress(input.to_string()))?;
        let end = CellAddress::parse(parts[1])
            .map_err(|_| Error::InvalidAddress(input.to_string()))?;
        Ok(Self::new(start, end))
    }

    pub fn rows(&self) -> usize {
        self.end.row - self.start.row + 1
    }

    pub fn cols(&self) -> usize {
        self.end.col - self.start.col + 1
    }
}

impl fmt::Display for CellRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.start, self.end)
    }
}

impl FromStr for CellRange {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
