use std::io;

use dvcz_crypto::KeyError;
use dvcz_types::TypeError;

/// Errors from identity operations.
#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    #[error(transparent)]
    Validation(#[from] TypeError),

    /// A serialized identity block is malformed.
    #[error("malformed identity block: {0}")]
    Format(String),

    #[error("key error: {0}")]
    Key(#[from] KeyError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

pub type IdentityResult<T> = Result<T, IdentityError>;
