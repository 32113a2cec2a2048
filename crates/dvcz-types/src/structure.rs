use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Directory sharding strategy of a content-addressed store.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DirStructure {
    /// Objects named directly by their full hex digest.
    #[serde(rename = "FLAT")]
    Flat,
    /// First hex digit selects one of 16 subdirectories.
    #[serde(rename = "DIR16x16")]
    Dir16x16,
    /// First two hex digits select one of 256 subdirectories.
    #[serde(rename = "DIR256x256")]
    Dir256x256,
}

impl DirStructure {
    pub const ALL: [Self; 3] = [Self::Flat, Self::Dir16x16, Self::Dir256x256];

    /// The persisted label.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Flat => "FLAT",
            Self::Dir16x16 => "DIR16x16",
            Self::Dir256x256 => "DIR256x256",
        }
    }

    /// Number of leading hex characters consumed by the shard directory.
    pub fn prefix_len(&self) -> usize {
        match self {
            Self::Flat => 0,
            Self::Dir16x16 => 1,
            Self::Dir256x256 => 2,
        }
    }

    /// The structure whose shard directories are `len` hex characters long.
    pub fn from_prefix_len(len: usize) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.prefix_len() == len)
    }
}

impl Default for DirStructure {
    fn default() -> Self {
        Self::Flat
    }
}

impl fmt::Display for DirStructure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DirStructure {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Older descriptors spell the flat layout `DIR_FLAT`.
        if s.eq_ignore_ascii_case("DIR_FLAT") {
            return Ok(Self::Flat);
        }
        Self::ALL
            .into_iter()
            .find(|d| d.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| TypeError::UnknownStructure(s.to_string()))
    }
}
