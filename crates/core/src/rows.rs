//! Row insertion and deletion planning.
//!
//! Users type 1-based row numbers plus an optional `--above`/`--below`
//! flag and a count. The remote API wants zero-based half-open spans.

use std::fmt;

use crate::address::{index_to_column_letter, CellAddress};
use crate::error::{Error, Result};
use crate::formula::{shift_formula, RowFormulaMap};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Above,
    Below,
}

impl Direction {
    /// Fold the two CLI flags into one optional direction.
    pub fn from_flags(above: bool, below: bool) -> Result<Option<Self>> {
        match (above, below) {
            (true, true) => Err(Error::InvalidArgument(
                "cannot use both --above and --below; choose one".to_string(),
            )),
            (true, false) => Ok(Some(Self::Above)),
            (false, true) => Ok(Some(Self::Below)),
            (false, false) => Ok(None),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Above => "above",
            Self::Below => "below",
        }
    }
}

/// Zero-based half-open row span `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowSpan {
    pub start: usize,
    pub end: usize,
}

impl RowSpan {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }
}

impl fmt::Display for RowSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InsertPlan {
    pub span: RowSpan,
    /// Zero-based row whose formulas seed the new rows: the row sitting
    /// directly above the inserted block. `None` when inserting above row 1.
    pub formula_source: Option<usize>,
    /// Ask the remote side to copy formatting from the row before the span.
    pub inherit_from_before: bool,
}

/// One formula to write into a freshly inserted row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormulaWrite {
    pub cell: CellAddress,
    pub formula: String,
}

impl FormulaWrite {
    pub fn a1(&self) -> String {
        format!("{}{}", index_to_column_letter(self.cell.col), self.cell.row + 1)
    }
}

fn check_row_and_count(row: usize, count: usize) -> Result<()> {
    if row < 1 {
        return Err(Error::InvalidArgument(
            "row number must be a positive integer".to_string(),
        ));
    }
    if count < 1 {
        return Err(Error::InvalidArgument(
            "count must be a positive integer".to_string(),
        ));
    }
    Ok(())
}

fn span_from(start: usize, count: usize) -> Result<RowSpan> {
    let end = start.checked_add(count).ok_or_else(|| {
        Error::OutOfRange(format!(
            "{count} rows starting at row {} run past the last addressable row",
            start.saturating_add(1)
        ))
    })?;
    Ok(RowSpan { start, end })
}

/// Plan inserting `count` rows next to 1-based `row`.
///
/// Without a direction the rows go above, matching `--above`.
pub fn plan_insert(
    row: usize,
    direction: Option<Direction>,
    count: usize,
    with_formulas: bool,
) -> Result<InsertPlan> {
    check_row_and_count(row, count)?;
    let plan = match direction.unwrap_or(Direction::Above) {
        Direction::Above => {
            let start = row - 1;
            let source = start.checked_sub(1);
            InsertPlan {
                span: span_from(start, count)?,
                formula_source: source,
                inherit_from_before: with_formulas && source.is_some(),
            }
        }
        Direction::Below => InsertPlan {
            span: span_from(row, count)?,
            formula_source: Some(row - 1),
            inherit_from_before: false,
        },
    };
    Ok(plan)
}

/// Plan deleting `count` rows relative to 1-based `row`.
///
/// Without a direction the deletion starts at `row` itself.
pub fn plan_delete(row: usize, direction: Option<Direction>, count: usize) -> Result<RowSpan> {
    check_row_and_count(row, count)?;
    let span = match direction {
        Some(Direction::Above) => {
            let end = row - 1;
            let start = end.checked_sub(count).ok_or_else(|| {
                Error::OutOfRange(format!(
                    "cannot remove {count} rows above row {row} (would go above row 1)"
                ))
            })?;
            RowSpan { start, end }
        }
        Some(Direction::Below) => span_from(row, count)?,
        None => span_from(row - 1, count)?,
    };
    Ok(span)
}

/// Derive the formulas for every new row from the single `source_row`.
///
/// Each target row is shifted by its own distance from the source; rows are
/// never chained off each other.
pub fn formula_fill(
    source_row: usize,
    formulas: &RowFormulaMap,
    span: RowSpan,
) -> Vec<FormulaWrite> {
    let mut writes = Vec::new();
    for target in span.start..span.end {
        let delta = target as i64 - source_row as i64;
        for (&col, formula) in formulas {
            writes.push(FormulaWrite {
                cell: CellAddress::new(target, col),
                formula: shift_formula(formula, delta),
            });
        }
    }
    writes
}
