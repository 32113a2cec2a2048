use std::fs;
use std::path::Path;

use dvcz_types::{DirStructure, HashAlgorithm};
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::layout::{is_reserved, LayoutMarker};

/// What probing a candidate store root found.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Probe {
    /// Nothing exists at the root path.
    Missing,
    /// The root exists but holds no marker and nothing shaped like an
    /// object or shard directory.
    Empty,
    /// The root carries a layout marker.
    Marked(LayoutMarker),
    /// The root holds objects but no marker; the layout was inferred.
    Inferred {
        structure: DirStructure,
        /// `None` if no object file was found to measure.
        algorithm: Option<HashAlgorithm>,
    },
}

/// Inspect `root` without modifying anything.
///
/// A marker file wins when present. Otherwise single-hex-digit
/// subdirectories mean DIR16x16, two-hex-digit subdirectories mean
/// DIR256x256, and top-level digest-named files mean FLAT. The algorithm
/// family comes from the length of the first object file found. Entries
/// matching none of these, such as a stray `README`, are ignored.
pub fn probe(root: &Path) -> StoreResult<Probe> {
    if !root.exists() {
        return Ok(Probe::Missing);
    }
    if !root.is_dir() {
        return Err(StoreError::NotADirectory(root.to_path_buf()));
    }
    if let Some(marker) = LayoutMarker::read(root)? {
        return Ok(Probe::Marked(marker));
    }

    let mut shard_dirs = Vec::new();
    let mut flat_algorithm = None;
    for entry in fs::read_dir(root).map_err(|e| StoreError::io(root, e))? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if is_reserved(&name) || name.starts_with('.') {
            continue;
        }
        let file_type = entry.file_type()?;
        if file_type.is_dir() && is_hex(&name) && (name.len() == 1 || name.len() == 2) {
            shard_dirs.push(name);
        } else if file_type.is_file() && flat_algorithm.is_none() {
            flat_algorithm = algorithm_of(&name, 0);
        }
    }
    if shard_dirs.is_empty() && flat_algorithm.is_none() {
        return Ok(Probe::Empty);
    }

    let structure = if shard_dirs.iter().any(|d| d.len() == 2) {
        DirStructure::Dir256x256
    } else if !shard_dirs.is_empty() {
        DirStructure::Dir16x16
    } else {
        DirStructure::Flat
    };

    let algorithm = match structure {
        DirStructure::Flat => flat_algorithm,
        _ => {
            let prefix = structure.prefix_len();
            let mut found = None;
            for dir in shard_dirs.iter().filter(|d| d.len() == prefix) {
                let path = root.join(dir);
                for entry in fs::read_dir(&path).map_err(|e| StoreError::io(&path, e))? {
                    let entry = entry?;
                    if !entry.file_type()?.is_file() {
                        continue;
                    }
                    let name = entry.file_name().to_string_lossy().into_owned();
                    if let Some(alg) = algorithm_of(&name, prefix) {
                        found = Some(alg);
                        break;
                    }
                }
                if found.is_some() {
                    break;
                }
            }
            found
        }
    };

    debug!(root = %root.display(), %structure, ?algorithm, "inferred store layout");
    Ok(Probe::Inferred {
        structure,
        algorithm,
    })
}

fn is_hex(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_hexdigit())
}

fn algorithm_of(file_name: &str, prefix_len: usize) -> Option<HashAlgorithm> {
    if !is_hex(file_name) {
        return None;
    }
    HashAlgorithm::from_hex_len(file_name.len() + prefix_len)
}
