/// Every failure the sheet-cmd libraries report.
///
/// The first group is detected locally before any remote call is made. The
/// selection errors carry the command that fixes them, and `AuthExpired` is
/// kept separate from `Auth` because it needs re-authorization, not a retry.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid address '{0}'")]
    InvalidAddress(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("out of range: {0}")]
    OutOfRange(String),

    #[error(
        "dimension mismatch: expected {expected_rows}x{expected_cols}, got {actual_rows}x{actual_cols}"
    )]
    DimensionMismatch {
        expected_rows: usize,
        expected_cols: usize,
        actual_rows: usize,
        actual_cols: usize,
    },

    #[error("{0} not found")]
    NotFound(String),

    #[error("{0} already exists")]
    AlreadyExists(String),

    #[error("no active account set (run `sheet-cmd account add` or `sheet-cmd account select`)")]
    NoActiveAccount,

    #[error("no active spreadsheet set (run `sheet-cmd spreadsheet select <name>`)")]
    NoActiveSpreadsheet,

    #[error("no active sheet set (run `sheet-cmd sheet select` or pass --name)")]
    NoActiveSheet,

    #[error(
        "refresh token for '{0}' was rejected (expired or revoked); run `sheet-cmd account reauth`"
    )]
    AuthExpired(String),

    #[error("authorization failed: {0}")]
    Auth(String),

    #[error("remote request failed: {0}")]
    Remote(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// True for errors caught before any remote call.
    pub fn is_local_validation(&self) -> bool {
        matches!(
            self,
            Self::InvalidAddress(_)
                | Self::InvalidArgument(_)
                | Self::OutOfRange(_)
                | Self::DimensionMismatch { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
