//! On-disk layout of a content-keyed store.
//!
//! ```text
//! ROOT/
//!     .dvcz-store.toml    # structure + algorithm marker
//!     in/                 # per-committer staging stores
//!     tmp/                # scratch space for atomic writes
//!     --hash--            # FLAT: full digest
//!     a/--hash--          # DIR16x16: first hex digit, remainder
//!     ab/--hash--         # DIR256x256: first two hex digits, remainder
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use dvcz_types::{DirStructure, HashAlgorithm, TypeError};
use serde::{Deserialize, Serialize};

use crate::error::{StoreError, StoreResult};

/// Scratch directory holding per-committer staging stores.
pub const IN_DIR: &str = "in";
/// Scratch directory for in-flight writes.
pub const TMP_DIR: &str = "tmp";
/// File recording a store's structure and algorithm.
pub const MARKER_FILE: &str = ".dvcz-store.toml";

/// Map a digest to its path relative to the store root.
///
/// The digest must be a hex string of exactly `algorithm.hex_len()`
/// characters. Joining the returned components reconstructs the digest.
pub fn locate(
    digest: &str,
    structure: DirStructure,
    algorithm: HashAlgorithm,
) -> Result<PathBuf, TypeError> {
    algorithm.validate_digest(digest)?;
    let n = structure.prefix_len();
    if n == 0 {
        return Ok(PathBuf::from(digest));
    }
    let (shard, rest) = digest.split_at(n);
    Ok(Path::new(shard).join(rest))
}

/// Returns `true` for names reserved by the layout itself.
pub fn is_reserved(name: &str) -> bool {
    name == IN_DIR || name == TMP_DIR || name == MARKER_FILE
}

/// Persisted description of a store's layout.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutMarker {
    pub structure: DirStructure,
    pub algorithm: HashAlgorithm,
}

impl LayoutMarker {
    /// Read the marker below `root`, if there is one.
    pub fn read(root: &Path) -> StoreResult<Option<Self>> {
        let path = root.join(MARKER_FILE);
        if !path.is_file() {
            return Ok(None);
        }
        let text = fs::read_to_string(&path).map_err(|e| StoreError::io(&path, e))?;
        let marker = toml::from_str(&text).map_err(|e| StoreError::CorruptMarker {
            path: path.clone(),
            reason: e.to_string(),
        })?;
        Ok(Some(marker))
    }

    /// Write the marker below `root`, replacing any existing one.
    pub fn write(&self, root: &Path) -> StoreResult<()> {
        let path = root.join(MARKER_FILE);
        let text = toml::to_string(self).map_err(|e| StoreError::CorruptMarker {
            path: path.clone(),
            reason: e.to_string(),
        })?;
        fs::write(&path, text).map_err(|e| StoreError::io(&path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const SHA2_DIGEST: &str = "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad";

    #[test]
    fn flat_is_the_digest() {
        let path = locate(SHA2_DIGEST, DirStructure::Flat, HashAlgorithm::Sha2).unwrap();
        assert_eq!(path, PathBuf::from(SHA2_DIGEST));
    }

    #[test]
    fn dir16_uses_first_digit() {
        let path = locate(SHA2_DIGEST, DirStructure::Dir16x16, HashAlgorithm::Sha2).unwrap();
        assert_eq!(path, Path::new("b").join(&SHA2_DIGEST[1..]));
    }

    #[test]
    fn dir256_uses_first_two_digits() {
        let sha1 = "a9993e364706816aba3e25717850c26c9cd0d89d";
        let path = locate(sha1, DirStructure::Dir256x256, HashAlgorithm::Sha1).unwrap();
        assert_eq!(path, Path::new("a9").join("993e364706816aba3e25717850c26c9cd0d89d"));
    }

    #[test]
    fn wrong_length_is_a_caller_error() {
        let err = locate(SHA2_DIGEST, DirStructure::Flat, HashAlgorithm::Sha1).unwrap_err();
        assert!(matches!(err, TypeError::InvalidDigestLength { expected: 40, actual: 64, .. }));
        assert!(locate("", DirStructure::Dir16x16, HashAlgorithm::Sha2).is_err());
    }

    #[test]
    fn marker_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        assert!(LayoutMarker::read(dir.path()).unwrap().is_none());
        let marker = LayoutMarker {
            structure: DirStructure::Dir256x256,
            algorithm: HashAlgorithm::Sha3,
        };
        marker.write(dir.path()).unwrap();
        let text = fs::read_to_string(dir.path().join(MARKER_FILE)).unwrap();
        assert!(text.contains("DIR256x256"));
        assert!(text.contains("SHA3"));
        assert_eq!(LayoutMarker::read(dir.path()).unwrap(), Some(marker));
    }

    #[test]
    fn corrupt_marker_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(MARKER_FILE), "structure = 42").unwrap();
        assert!(matches!(
            LayoutMarker::read(dir.path()),
            Err(StoreError::CorruptMarker { .. })
        ));
    }

    proptest! {
        #[test]
        fn components_reconstruct_digest(
            digest in "[0-9a-f]{64}",
            idx in 0usize..3,
        ) {
            let structure = DirStructure::ALL[idx];
            let path = locate(&digest, structure, HashAlgorithm::Blake2b).unwrap();
            let rebuilt: String = path
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect();
            prop_assert_eq!(rebuilt, digest);
            prop_assert_eq!(path.components().count(), if idx == 0 { 1 } else { 2 });
        }

        #[test]
        fn sha1_components_reconstruct_digest(digest in "[0-9A-Fa-f]{40}") {
            for structure in DirStructure::ALL {
                let path = locate(&digest, structure, HashAlgorithm::Sha1).unwrap();
                let rebuilt: String = path
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy().into_owned())
                    .collect();
                prop_assert_eq!(&rebuilt, &digest);
            }
        }
    }
}
