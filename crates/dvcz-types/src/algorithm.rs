use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Hash algorithm used to key a content-addressed store.
///
/// Fixed when a store is created. SHA1 digests are 40 hex characters, the
/// other three are 64.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HashAlgorithm {
    Sha1,
    Sha2,
    Sha3,
    Blake2b,
}

impl HashAlgorithm {
    /// Every supported algorithm, in label order.
    pub const ALL: [Self; 4] = [Self::Sha1, Self::Sha2, Self::Sha3, Self::Blake2b];

    /// The persisted label (`SHA1`, `SHA2`, `SHA3`, `BLAKE2B`).
    pub fn name(&self) -> &'static str {
        match self {
            Self::Sha1 => "SHA1",
            Self::Sha2 => "SHA2",
            Self::Sha3 => "SHA3",
            Self::Blake2b => "BLAKE2B",
        }
    }

    /// Length in hex characters of a digest produced by this algorithm.
    pub fn hex_len(&self) -> usize {
        match self {
            Self::Sha1 => 40,
            Self::Sha2 | Self::Sha3 | Self::Blake2b => 64,
        }
    }

    /// Digest size in bytes.
    pub fn digest_bytes(&self) -> usize {
        self.hex_len() / 2
    }

    /// The algorithm implied by a bare digest length, if any.
    ///
    /// A 64-character digest cannot distinguish SHA2, SHA3 and BLAKE2b, so
    /// the 64-character family reports `Sha2`.
    pub fn from_hex_len(len: usize) -> Option<Self> {
        match len {
            40 => Some(Self::Sha1),
            64 => Some(Self::Sha2),
            _ => None,
        }
    }

    /// Whether `other` produces digests of the same length.
    pub fn same_family(&self, other: &Self) -> bool {
        self.hex_len() == other.hex_len()
    }

    /// Check that `digest` is a hex string of the right length.
    pub fn validate_digest(&self, digest: &str) -> Result<(), TypeError> {
        if digest.len() != self.hex_len() {
            return Err(TypeError::InvalidDigestLength {
                algorithm: self.name(),
                expected: self.hex_len(),
                actual: digest.len(),
            });
        }
        hex::decode(digest).map_err(|e| TypeError::InvalidHex(e.to_string()))?;
        Ok(())
    }
}

impl Default for HashAlgorithm {
    fn default() -> Self {
        Self::Sha2
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for HashAlgorithm {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|a| a.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| TypeError::UnknownAlgorithm(s.to_string()))
    }
}
