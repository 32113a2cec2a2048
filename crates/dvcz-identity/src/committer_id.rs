use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, UNIX_EPOCH};

use dvcz_crypto::{ContentHasher, PublicKey};
use dvcz_types::{HashAlgorithm, DVCZ_DIR};
use tracing::info;

use crate::clock::Clock;
use crate::error::{IdentityError, IdentityResult};

/// Name of the committer-ID file below `<home>/.dvcz/`.
pub const ID_FILE: &str = "id";

/// Derive a fresh committer ID.
///
/// Hashes the public key's PEM text followed by the clock's current time as
/// `<secs>.<micros>`. Two calls at different instants give different IDs, so
/// the first value must be persisted; see [`CommitterIdFile`].
pub fn derive_committer_id(
    public: &PublicKey,
    algorithm: HashAlgorithm,
    clock: &dyn Clock,
) -> IdentityResult<String> {
    let since_epoch = clock
        .now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO);
    let mut state = ContentHasher::new(algorithm).start();
    state.update(public.to_pem()?.as_bytes());
    state.update(render_time(since_epoch).as_bytes());
    Ok(state.finalize_hex())
}

fn render_time(since_epoch: Duration) -> String {
    format!("{}.{:06}", since_epoch.as_secs(), since_epoch.subsec_micros())
}

/// The persisted committer ID at `<home>/.dvcz/id`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommitterIdFile {
    path: PathBuf,
}

impl CommitterIdFile {
    /// The ID file for the given home directory.
    pub fn in_home(home: &Path) -> Self {
        Self {
            path: home.join(DVCZ_DIR).join(ID_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the stored ID, if the file exists.
    pub fn load(&self) -> IdentityResult<Option<String>> {
        if !self.path.is_file() {
            return Ok(None);
        }
        let text = fs::read_to_string(&self.path)?;
        let id = text.trim();
        match HashAlgorithm::from_hex_len(id.len()) {
            Some(alg) => alg.validate_digest(id)?,
            None => {
                return Err(IdentityError::Format(format!(
                    "{} does not hold a committer ID",
                    self.path.display()
                )))
            }
        }
        Ok(Some(id.to_string()))
    }

    /// Return the stored ID, deriving and writing one first if none exists.
    pub fn load_or_create(
        &self,
        public: &PublicKey,
        algorithm: HashAlgorithm,
        clock: &dyn Clock,
    ) -> IdentityResult<String> {
        if let Some(id) = self.load()? {
            return Ok(id);
        }
        let id = derive_committer_id(public, algorithm, clock)?;
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, &id)?;
        info!(path = %self.path.display(), "created committer ID");
        Ok(id)
    }
}
