pub mod address;
pub mod error;
pub mod formula;
pub mod rows;
pub mod validate;
pub mod values;

pub use address::{CellAddress, CellRange};
pub use error::{Error, Result};
