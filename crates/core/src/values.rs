//! Inline value text typed on the command line.
//!
//! `,` separates columns and `;` separates rows: `"a, b; c, d"` is a 2x2 block.

/// Split `"v1,v2;v3,v4"` into rows of trimmed cells.
pub fn parse_value_block(text: &str) -> Vec<Vec<String>> {
    text.split(';').map(parse_row_values).collect()
}

/// Split `"v1,v2,v3"` into trimmed cells.
pub fn parse_row_values(text: &str) -> Vec<String> {
    text.split(',').map(|cell| cell.trim().to_string()).collect()
}
