use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use dvcz_types::{DirStructure, HashAlgorithm};

use crate::error::{StoreError, StoreResult};
use crate::store::{Store, StoreConfig};

/// Serialized form of a store: `name::path::STRUCTURE::ALGORITHM`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoreDescriptor {
    pub name: String,
    pub path: PathBuf,
    pub structure: DirStructure,
    pub algorithm: HashAlgorithm,
}

impl StoreDescriptor {
    /// Open or create the described store.
    pub fn open(&self, mode: u32) -> StoreResult<Store> {
        Store::open_or_create(
            &self.name,
            &self.path,
            StoreConfig::new(self.structure, self.algorithm),
            mode,
        )
    }
}

impl fmt::Display for StoreDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}::{}::{}::{}",
            self.name,
            self.path.display(),
            self.structure,
            self.algorithm
        )
    }
}

impl FromStr for StoreDescriptor {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split("::").collect();
        let [name, path, structure, algorithm] = parts.as_slice() else {
            return Err(StoreError::Format(format!(
                "expected 4 '::'-separated fields, found {}",
                parts.len()
            )));
        };
        dvcz_types::validate_name("store name", name)?;
        Ok(Self {
            name: name.to_string(),
            path: PathBuf::from(path),
            structure: structure.parse()?,
            algorithm: algorithm.parse()?,
        })
    }
}
