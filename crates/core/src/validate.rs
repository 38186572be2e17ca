use crate::address::CellRange;
use crate::error::{Error, Result};

/// Check that `block` has exactly the shape of `range`.
///
/// Rows may be ragged; the widest row decides the column count. This is a
/// pure gate meant to run before anything is sent to the remote sheet.
pub fn validate_block<T>(range: &CellRange, block: &[Vec<T>]) -> Result<()> {
    let expected_rows = range.rows();
    let expected_cols = range.cols();
    let actual_rows = block.len();
    let actual_cols = block.iter().map(Vec::len).max().unwrap_or(0);

    if expected_rows != actual_rows || expected_cols != actual_cols {
        return Err(Error::DimensionMismatch {
            expected_rows,
            expected_cols,
            actual_rows,
            actual_cols,
        });
    }
    Ok(())
}
