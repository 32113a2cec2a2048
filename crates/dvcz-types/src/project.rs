use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;
use crate::names::validate_name;

/// Name of the per-project (and per-user) metadata directory.
pub const DVCZ_DIR: &str = ".dvcz";

/// Name of the build ledger inside [`DVCZ_DIR`].
pub const BUILDS_FILE: &str = "builds";

/// Descriptor for a collection of code below a project root directory.
///
/// Purely descriptive: constructing a `Project` never touches the
/// filesystem. Serialized as a single `name::path::mainLanguage` line.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    name: String,
    path: PathBuf,
    main_lang: Option<String>,
}

impl Project {
    /// Create a project descriptor. `name` and, if given, `main_lang` must be
    /// valid names.
    pub fn new(
        name: impl Into<String>,
        path: impl Into<PathBuf>,
        main_lang: Option<String>,
    ) -> Result<Self, TypeError> {
        let name = name.into();
        validate_name("project name", &name)?;
        if let Some(lang) = &main_lang {
            validate_name("language name", lang)?;
        }
        Ok(Self {
            name,
            path: path.into(),
            main_lang,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Path to the project's root directory, relative or absolute.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Short language name such as `rs` or `py`.
    pub fn main_lang(&self) -> Option<&str> {
        self.main_lang.as_deref()
    }

    /// `<root>/.dvcz/builds`, the project's build ledger.
    pub fn builds_path(&self) -> PathBuf {
        builds_path(&self.path)
    }
}

/// The build ledger location for a project rooted at `root`.
pub fn builds_path(root: &Path) -> PathBuf {
    root.join(DVCZ_DIR).join(BUILDS_FILE)
}

impl fmt::Display for Project {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}::{}::{}",
            self.name,
            self.path.display(),
            self.main_lang.as_deref().unwrap_or("")
        )
    }
}

impl FromStr for Project {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.trim_end_matches('\n').split("::").collect();
        match parts.as_slice() {
            [name, path] => Self::new(*name, *path, None),
            [name, path, lang] => {
                let lang = (!lang.is_empty()).then(|| lang.to_string());
                Self::new(*name, *path, lang)
            }
            _ => Err(TypeError::InvalidDescriptor(format!(
                "project descriptor needs 2 or 3 fields, got {}: '{s}'",
                parts.len()
            ))),
        }
    }
}
