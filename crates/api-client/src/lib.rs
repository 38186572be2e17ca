pub mod drive;
pub mod http;
pub mod oauth;
pub mod retry;
pub mod sheets;

#[cfg(test)]
pub(crate) mod testing;

pub use drive::{DriveClient, DriveFile};
pub use oauth::{OAuthApp, OAuthClient, OAuthEndpoints};
pub use retry::RetryConfig;
pub use sheets::{RangeWrite, Render, SheetProperties, SheetsClient, SpreadsheetInfo};
