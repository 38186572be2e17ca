//! Local persistence for accounts, registered spreadsheets, and the
//! active-selection chain.

pub mod credential;
pub mod document;
pub mod selection;
pub mod store;

pub use credential::{Credential, RefreshedToken, TokenRefresher};
pub use document::{Account, Settings, SpreadsheetEntry, UserMetadata};
pub use selection::{resolve_selection, resolve_target, ResolvedTarget, Selection, TargetRequest};
pub use store::{ConfigStore, SpreadsheetSummary};
