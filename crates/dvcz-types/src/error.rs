use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("not a valid {kind}: '{name}' ({reason})")]
    InvalidName {
        kind: &'static str,
        name: String,
        reason: String,
    },

    #[error("unknown hash algorithm: '{0}'")]
    UnknownAlgorithm(String),

    #[error("unknown directory structure: '{0}'")]
    UnknownStructure(String),

    #[error("invalid digest length for {algorithm}: expected {expected}, got {actual}")]
    InvalidDigestLength {
        algorithm: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("invalid hex string: {0}")]
    InvalidHex(String),

    #[error("invalid descriptor: {0}")]
    InvalidDescriptor(String),
}
