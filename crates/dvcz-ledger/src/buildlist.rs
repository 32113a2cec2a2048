use dvcz_types::HashAlgorithm;
use serde::{Deserialize, Serialize};

/// One file named by a build list.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildListEntry {
    pub path: String,
    pub digest: String,
}

impl BuildListEntry {
    pub fn new(path: impl Into<String>, digest: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            digest: digest.into(),
        }
    }
}

/// A build list could not be decoded.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("line {line}: {reason}")]
pub struct DecodeError {
    pub line: usize,
    pub reason: String,
}

/// Turns build-list text into the files it names, in order.
pub trait BuildListDecoder: Send + Sync {
    fn decode(&self, text: &str, algorithm: HashAlgorithm)
        -> Result<Vec<BuildListEntry>, DecodeError>;
}

/// Decoder for `<digest> <path>` lines.
///
/// Blank lines and lines starting with `#` are skipped. The path is the rest
/// of the line after the first run of whitespace, so it may contain spaces.
#[derive(Clone, Copy, Debug, Default)]
pub struct PlainBuildListDecoder;

impl PlainBuildListDecoder {
    /// Render entries in the form [`decode`](BuildListDecoder::decode)
    /// accepts.
    pub fn encode(entries: &[BuildListEntry]) -> String {
        entries
            .iter()
            .map(|e| format!("{} {}\n", e.digest, e.path))
            .collect()
    }
}

impl BuildListDecoder for PlainBuildListDecoder {
    fn decode(
        &self,
        text: &str,
        algorithm: HashAlgorithm,
    ) -> Result<Vec<BuildListEntry>, DecodeError> {
        let mut entries = Vec::new();
        for (i, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let err = |reason: String| DecodeError {
                line: i + 1,
                reason,
            };
            let (digest, path) = line
                .split_once(char::is_whitespace)
                .ok_or_else(|| err("expected '<digest> <path>'".to_string()))?;
            let path = path.trim_start();
            algorithm
                .validate_digest(digest)
                .map_err(|e| err(e.to_string()))?;
            entries.push(BuildListEntry::new(path, digest.to_ascii_lowercase()));
        }
        Ok(entries)
    }
}
