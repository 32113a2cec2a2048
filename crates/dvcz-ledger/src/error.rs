use std::io;
use std::path::PathBuf;

use dvcz_store::StoreError;

/// Fatal errors from ledger operations.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("builds file at {} does not exist", .0.display())]
    LedgerNotFound(PathBuf),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Why a single ledger line could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("expected 'YYYY-MM-DD HH:MM:SS vMAJOR.MINOR.PATCH DIGEST'")]
    Malformed,

    #[error("invalid timestamp '{0}'")]
    Timestamp(String),

    #[error("invalid version '{0}'")]
    Version(String),

    #[error("line is not UTF-8: {0}")]
    NotUtf8(String),
}

pub type LedgerResult<T> = Result<T, LedgerError>;
