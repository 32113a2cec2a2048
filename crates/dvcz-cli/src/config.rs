use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use dvcz_crypto::KEY_BITS;
use dvcz_store::StoreConfig;
use dvcz_types::{DirStructure, HashAlgorithm, DVCZ_DIR};
use serde::{Deserialize, Serialize};

pub const CONFIG_FILE: &str = "config.toml";

/// Defaults for the `dvcz` command, read from `~/.dvcz/config.toml`.
/// Command-line flags override every field.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub store_root: Option<PathBuf>,
    pub structure: DirStructure,
    pub algorithm: HashAlgorithm,
    pub key_bits: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store_root: None,
            structure: DirStructure::Dir256x256,
            algorithm: HashAlgorithm::Sha2,
            key_bits: KEY_BITS,
        }
    }
}

impl Config {
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(DVCZ_DIR).join(CONFIG_FILE))
    }

    /// Load `explicit` if given (it must exist), else the default file if it
    /// exists, else the built-in defaults.
    pub fn load(explicit: Option<&Path>) -> anyhow::Result<Self> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => match Self::default_path() {
                Some(path) if path.is_file() => path,
                _ => return Ok(Self::default()),
            },
        };
        let text = fs::read_to_string(&path)
            .with_context(|| format!("cannot read config {}", path.display()))?;
        Self::from_toml(&text).with_context(|| format!("invalid config {}", path.display()))
    }

    pub fn from_toml(text: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Layout for stores whose own layout cannot be discovered.
    pub fn store_config(&self) -> StoreConfig {
        StoreConfig::new(self.structure, self.algorithm)
    }

    /// The store root from `flag`, falling back to the configured one.
    pub fn store_root(&self, flag: Option<PathBuf>) -> anyhow::Result<PathBuf> {
        flag.or_else(|| self.store_root.clone())
            .context("no store given: pass --store or set store_root in the config")
    }
}
