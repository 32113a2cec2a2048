use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use dvcz_types::{validate_name, DVCZ_DIR};
use tracing::debug;

use crate::error::{IdentityError, IdentityResult};
use crate::user::{block_lines, expect_line, PubUser, User};

pub const COMMITTER_START: &str = "-----START DVCZ COMMITTER-----";
pub const COMMITTER_END: &str = "-----END DVCZ COMMITTER-----";

/// Directory below `<home>/.dvcz/` holding committer blocks.
pub const COMMITTERS_DIR: &str = "committers";

/// A [`User`] that may commit to a store, known by a cluster-unique handle.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Committer {
    handle: String,
    user: User,
}

impl Committer {
    pub fn new(handle: &str, user: User) -> IdentityResult<Self> {
        validate_name("handle", handle)?;
        Ok(Self {
            handle: handle.to_string(),
            user,
        })
    }

    /// Create a committer with a freshly generated user.
    pub fn generate(handle: &str, login: &str, key_bits: u32) -> IdentityResult<Self> {
        validate_name("handle", handle)?;
        Self::new(handle, User::generate(login, key_bits)?)
    }

    pub fn handle(&self) -> &str {
        &self.handle
    }

    pub fn user(&self) -> &User {
        &self.user
    }

    pub fn to_public(&self) -> PubCommitter {
        PubCommitter {
            handle: self.handle.clone(),
            user: self.user.to_public(),
        }
    }

    /// Render the committer block, newline-terminated.
    pub fn serialize(&self) -> IdentityResult<String> {
        Ok(format!(
            "{COMMITTER_START}\n{}\n{}{COMMITTER_END}\n",
            self.handle,
            self.user.serialize()?
        ))
    }

    /// Where the block for `handle` lives below `home`.
    pub fn path_in(home: &Path, handle: &str) -> PathBuf {
        home.join(DVCZ_DIR).join(COMMITTERS_DIR).join(handle)
    }

    /// Write this committer's block below `home`, readable only by the
    /// owner. Returns the file path.
    pub fn write_to(&self, home: &Path) -> IdentityResult<PathBuf> {
        let path = Self::path_in(home, &self.handle);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut options = fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }
        let mut file = options.open(&path)?;
        file.write_all(self.serialize()?.as_bytes())?;
        debug!(handle = %self.handle, path = %path.display(), "wrote committer");
        Ok(path)
    }

    /// Read the committer `handle` from below `home`.
    pub fn read_from(home: &Path, handle: &str) -> IdentityResult<Self> {
        validate_name("handle", handle)?;
        let text = fs::read_to_string(Self::path_in(home, handle))?;
        text.parse()
    }
}

impl FromStr for Committer {
    type Err = IdentityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lines = block_lines(s)?;
        if lines.len() < 5 {
            return Err(IdentityError::Format(format!(
                "too few lines ({}) in committer block",
                lines.len()
            )));
        }
        expect_line(lines[0], COMMITTER_START)?;
        let handle = lines[1];
        expect_line(lines[lines.len() - 1], COMMITTER_END)?;
        let user = User::from_lines(&lines[2..lines.len() - 1])?;
        Self::new(handle, user)
    }
}

/// The public view of a [`Committer`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PubCommitter {
    handle: String,
    user: PubUser,
}

impl PubCommitter {
    pub fn handle(&self) -> &str {
        &self.handle
    }

    pub fn user(&self) -> &PubUser {
        &self.user
    }
}
