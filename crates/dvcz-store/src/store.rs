use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use dvcz_crypto::ContentHasher;
use dvcz_types::{is_valid_name, validate_name, DirStructure, HashAlgorithm};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::descriptor::StoreDescriptor;
use crate::discover::{probe, Probe};
use crate::error::{StoreError, StoreResult};
use crate::layout::{is_reserved, locate, LayoutMarker, IN_DIR, TMP_DIR};
use crate::traits::ContentStore;

/// Permission bits for directories a store creates.
pub const DEFAULT_MODE: u32 = 0o755;

/// Name for a store known only by its root: the final path component if it
/// is a valid name, else `"store"`.
pub fn default_name(root: &Path) -> String {
    root.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .filter(|n| is_valid_name(n))
        .unwrap_or_else(|| "store".to_string())
}

/// Directory structure and hash algorithm of a store.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    pub structure: DirStructure,
    pub algorithm: HashAlgorithm,
}

impl StoreConfig {
    pub fn new(structure: DirStructure, algorithm: HashAlgorithm) -> Self {
        Self {
            structure,
            algorithm,
        }
    }

    /// Decide the effective configuration from what is on disk. The caller's
    /// request only fills in what the disk does not say.
    fn effective(probe: Probe, requested: StoreConfig) -> StoreConfig {
        match probe {
            Probe::Missing | Probe::Empty => requested,
            Probe::Marked(marker) => StoreConfig::new(marker.structure, marker.algorithm),
            Probe::Inferred {
                structure,
                algorithm,
            } => {
                let algorithm = match algorithm {
                    None => requested.algorithm,
                    // Length alone cannot tell the 64-char family apart; keep
                    // the caller's label when it is in the right family.
                    Some(found) if found.same_family(&requested.algorithm) => requested.algorithm,
                    Some(found) => found,
                };
                StoreConfig::new(structure, algorithm)
            }
        }
    }
}

/// A named, self-describing content-keyed store rooted at a directory.
///
/// If the root already holds a store, its structure and algorithm are
/// discovered and override whatever the caller asked for; both are kept so
/// callers can tell when that happened.
#[derive(Clone, Debug)]
pub struct Store {
    name: String,
    root: PathBuf,
    config: StoreConfig,
    requested: StoreConfig,
}

impl Store {
    /// Open the store at `root`, creating it with `requested` if nothing is
    /// there yet.
    ///
    /// On return the root, `in/`, `tmp/` and the layout marker all exist.
    pub fn open_or_create(
        name: &str,
        root: impl AsRef<Path>,
        requested: StoreConfig,
        mode: u32,
    ) -> StoreResult<Self> {
        validate_name("store name", name)?;
        let root = root.as_ref().to_path_buf();

        let found = probe(&root)?;
        let config = StoreConfig::effective(found, requested);
        if config != requested {
            debug!(
                root = %root.display(),
                requested_structure = %requested.structure,
                requested_algorithm = %requested.algorithm,
                structure = %config.structure,
                algorithm = %config.algorithm,
                "on-disk layout overrides requested configuration"
            );
        }

        create_dir(&root, mode)?;
        create_dir(&root.join(IN_DIR), mode)?;
        create_dir(&root.join(TMP_DIR), mode)?;
        if !matches!(found, Probe::Marked(_)) {
            LayoutMarker {
                structure: config.structure,
                algorithm: config.algorithm,
            }
            .write(&root)?;
        }
        if matches!(found, Probe::Missing | Probe::Empty) {
            info!(
                name,
                root = %root.display(),
                structure = %config.structure,
                algorithm = %config.algorithm,
                "initialized store"
            );
        }

        Ok(Self {
            name: name.to_string(),
            root,
            config,
            requested,
        })
    }

    /// Open an existing store read-only, discovering its layout.
    ///
    /// Nothing is created or written. A store without objects or a marker
    /// reports the default configuration.
    pub fn open(name: &str, root: impl AsRef<Path>) -> StoreResult<Self> {
        Self::open_with(name, root, StoreConfig::default())
    }

    /// Like [`Store::open`], but a store whose layout cannot be discovered
    /// takes `fallback`.
    pub fn open_with(name: &str, root: impl AsRef<Path>, fallback: StoreConfig) -> StoreResult<Self> {
        validate_name("store name", name)?;
        let root = root.as_ref().to_path_buf();
        let found = probe(&root)?;
        if found == Probe::Missing {
            return Err(StoreError::RootNotFound(root));
        }
        let requested = fallback;
        Ok(Self {
            name: name.to_string(),
            config: StoreConfig::effective(found, requested),
            requested,
            root,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn structure(&self) -> DirStructure {
        self.config.structure
    }

    pub fn algorithm(&self) -> HashAlgorithm {
        self.config.algorithm
    }

    /// The configuration in effect.
    pub fn config(&self) -> StoreConfig {
        self.config
    }

    /// The configuration the caller asked for.
    pub fn requested(&self) -> StoreConfig {
        self.requested
    }

    /// Whether discovery overrode the caller's request.
    pub fn was_overridden(&self) -> bool {
        self.config != self.requested
    }

    /// Descriptor naming this store and its effective layout.
    pub fn descriptor(&self) -> StoreDescriptor {
        StoreDescriptor {
            name: self.name.clone(),
            path: self.root.clone(),
            structure: self.config.structure,
            algorithm: self.config.algorithm,
        }
    }

    /// Absolute path where `digest` lives, whether or not it exists.
    ///
    /// Digests are case-insensitive; objects are filed under the lowercase
    /// spelling.
    pub fn path_for(&self, digest: &str) -> StoreResult<PathBuf> {
        let digest = digest.to_ascii_lowercase();
        let rel = locate(&digest, self.config.structure, self.config.algorithm)?;
        Ok(self.root.join(rel))
    }

    /// Absolute path of an existing object.
    pub fn resolve(&self, digest: &str) -> StoreResult<PathBuf> {
        let path = self.path_for(digest)?;
        if !path.is_file() {
            return Err(StoreError::NotFound(digest.to_string()));
        }
        Ok(path)
    }

    /// Read an object's bytes.
    pub fn get(&self, digest: &str) -> StoreResult<Vec<u8>> {
        let path = self.resolve(digest)?;
        fs::read(&path).map_err(|e| StoreError::io(&path, e))
    }

    /// Whether an object is present. Malformed digests are simply absent.
    pub fn exists(&self, digest: &str) -> bool {
        self.path_for(digest).map(|p| p.is_file()).unwrap_or(false)
    }

    /// Write `data` under `digest`, creating the shard directory if needed.
    ///
    /// The caller vouches that `digest` is the hash of `data`; an existing
    /// object is simply replaced. Data is staged in `tmp/` and renamed into
    /// place.
    pub fn put(&self, digest: &str, data: &[u8]) -> StoreResult<()> {
        let path = self.path_for(digest)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;
        }
        let tmp_dir = self.root.join(TMP_DIR);
        fs::create_dir_all(&tmp_dir).map_err(|e| StoreError::io(&tmp_dir, e))?;

        let mut staged = NamedTempFile::new_in(&tmp_dir).map_err(|e| StoreError::io(&tmp_dir, e))?;
        staged.write_all(data)?;
        staged
            .persist(&path)
            .map_err(|e| StoreError::io(&path, e.error))?;
        debug!(digest, len = data.len(), "stored object");
        Ok(())
    }

    /// Hash `data` with the store's algorithm, store it, and return the
    /// digest.
    pub fn put_data(&self, data: &[u8]) -> StoreResult<String> {
        let digest = ContentHasher::new(self.config.algorithm).hash(data);
        self.put(&digest, data)?;
        Ok(digest)
    }

    /// Open or create the FLAT staging store `in/<committer_id>/`.
    pub fn staging_store(&self, committer_id: &str) -> StoreResult<Store> {
        self.config.algorithm.validate_digest(committer_id)?;
        let root = self.root.join(IN_DIR).join(committer_id.to_ascii_lowercase());
        Store::open_or_create(
            &format!("{}_in", self.name),
            root,
            StoreConfig::new(DirStructure::Flat, self.config.algorithm),
            DEFAULT_MODE,
        )
    }

    /// Digests of every object in the store, sorted.
    pub fn digests(&self) -> StoreResult<Vec<String>> {
        let depth = if self.config.structure == DirStructure::Flat { 1 } else { 2 };
        let walker = WalkDir::new(&self.root)
            .min_depth(1)
            .max_depth(depth)
            .into_iter()
            .filter_entry(|e| {
                e.depth() != 1 || !is_reserved(&e.file_name().to_string_lossy())
            });

        let mut digests = Vec::new();
        for entry in walker {
            let entry = entry.map_err(|e| {
                StoreError::Io(e.into_io_error().unwrap_or_else(|| {
                    std::io::Error::new(std::io::ErrorKind::Other, "filesystem loop")
                }))
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            let rel = match entry.path().strip_prefix(&self.root) {
                Ok(rel) => rel,
                Err(_) => continue,
            };
            let digest: String = rel
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect();
            if self.config.algorithm.validate_digest(&digest).is_ok()
                && locate(&digest, self.config.structure, self.config.algorithm).ok()
                    == Some(rel.to_path_buf())
            {
                digests.push(digest);
            }
        }
        digests.sort();
        Ok(digests)
    }
}

impl ContentStore for Store {
    fn algorithm(&self) -> HashAlgorithm {
        Store::algorithm(self)
    }

    fn check_available(&self) -> StoreResult<()> {
        if !self.root.is_dir() {
            return Err(StoreError::RootNotFound(self.root.clone()));
        }
        Ok(())
    }

    fn get(&self, digest: &str) -> StoreResult<Vec<u8>> {
        Store::get(self, digest)
    }

    fn exists(&self, digest: &str) -> bool {
        Store::exists(self, digest)
    }

    fn put(&self, digest: &str, data: &[u8]) -> StoreResult<()> {
        Store::put(self, digest, data)
    }
}

fn create_dir(path: &Path, mode: u32) -> StoreResult<()> {
    if path.is_dir() {
        return Ok(());
    }
    let mut builder = fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(mode);
    }
    #[cfg(not(unix))]
    let _ = mode;
    builder.create(path).map_err(|e| StoreError::io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryStore;

    fn sha2_dir256() -> StoreConfig {
        StoreConfig::new(DirStructure::Dir256x256, HashAlgorithm::Sha2)
    }

    #[test]
    fn create_lays_out_scratch_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("U");
        let store = Store::open_or_create("U", &root, sha2_dir256(), DEFAULT_MODE).unwrap();
        assert!(root.join(IN_DIR).is_dir());
        assert!(root.join(TMP_DIR).is_dir());
        assert_eq!(store.config(), sha2_dir256());
        assert!(!store.was_overridden());
        assert_eq!(
            LayoutMarker::read(&root).unwrap(),
            Some(LayoutMarker {
                structure: DirStructure::Dir256x256,
                algorithm: HashAlgorithm::Sha2,
            })
        );
    }

    #[test]
    fn invalid_name_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let err = Store::open_or_create("bad-name", dir.path(), sha2_dir256(), DEFAULT_MODE)
            .unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));
        assert!(!dir.path().join(IN_DIR).exists());
    }

    #[test]
    fn reopen_keeps_on_disk_configuration() {
        let dir = tempfile::tempdir().unwrap();
        let first = Store::open_or_create(
            "first",
            dir.path(),
            StoreConfig::new(DirStructure::Dir16x16, HashAlgorithm::Sha3),
            DEFAULT_MODE,
        )
        .unwrap();
        let second = Store::open_or_create(
            "second",
            dir.path(),
            StoreConfig::new(DirStructure::Flat, HashAlgorithm::Sha1),
            DEFAULT_MODE,
        )
        .unwrap();
        assert_eq!(first.config(), second.config());
        assert_eq!(second.structure(), DirStructure::Dir16x16);
        assert_eq!(second.algorithm(), HashAlgorithm::Sha3);
        assert!(second.was_overridden());
        assert_eq!(
            second.requested(),
            StoreConfig::new(DirStructure::Flat, HashAlgorithm::Sha1)
        );
    }

    #[test]
    fn unmarked_store_is_discovered() {
        let dir = tempfile::tempdir().unwrap();
        let digest = ContentHasher::SHA1.hash(b"legacy");
        let shard = dir.path().join(&digest[..2]);
        fs::create_dir(&shard).unwrap();
        fs::write(shard.join(&digest[2..]), b"legacy").unwrap();

        let store = Store::open_or_create(
            "legacy",
            dir.path(),
            StoreConfig::new(DirStructure::Flat, HashAlgorithm::Blake2b),
            DEFAULT_MODE,
        )
        .unwrap();
        assert_eq!(store.structure(), DirStructure::Dir256x256);
        assert_eq!(store.algorithm(), HashAlgorithm::Sha1);
        assert_eq!(store.get(&digest).unwrap(), b"legacy");
    }

    #[test]
    fn put_get_exists() {
        let dir = tempfile::tempdir().unwrap();
        for structure in DirStructure::ALL {
            let root = dir.path().join(structure.name());
            let store = Store::open_or_create(
                "s",
                &root,
                StoreConfig::new(structure, HashAlgorithm::Sha2),
                DEFAULT_MODE,
            )
            .unwrap();
            let digest = store.put_data(b"hello world").unwrap();
            assert_eq!(digest, ContentHasher::SHA2.hash(b"hello world"));
            assert!(store.exists(&digest));
            assert_eq!(store.get(&digest).unwrap(), b"hello world");
            assert_eq!(
                store.resolve(&digest).unwrap(),
                root.join(locate(&digest, structure, HashAlgorithm::Sha2).unwrap())
            );
            assert_eq!(fs::read_dir(root.join(TMP_DIR)).unwrap().count(), 0);
        }
    }

    #[test]
    fn put_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open_or_create("s", dir.path(), sha2_dir256(), DEFAULT_MODE).unwrap();
        let d1 = store.put_data(b"same").unwrap();
        let d2 = store.put_data(b"same").unwrap();
        assert_eq!(d1, d2);
        assert_eq!(store.digests().unwrap(), vec![d1]);
    }

    #[test]
    fn missing_object() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open_or_create("s", dir.path(), sha2_dir256(), DEFAULT_MODE).unwrap();
        let digest = ContentHasher::SHA2.hash(b"never stored");
        assert!(!store.exists(&digest));
        assert!(matches!(store.get(&digest), Err(StoreError::NotFound(d)) if d == digest));
        assert!(matches!(store.resolve(&digest), Err(StoreError::NotFound(_))));
    }

    #[test]
    fn malformed_digest() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open_or_create("s", dir.path(), sha2_dir256(), DEFAULT_MODE).unwrap();
        let sha1 = ContentHasher::SHA1.hash(b"x");
        assert!(!store.exists(&sha1));
        assert!(matches!(store.get(&sha1), Err(StoreError::Validation(_))));
        assert!(matches!(store.put(&sha1, b"x"), Err(StoreError::Validation(_))));
    }

    #[test]
    fn open_does_not_create() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("absent");
        assert!(matches!(
            Store::open("absent", &root),
            Err(StoreError::RootNotFound(p)) if p == root
        ));
        assert!(!root.exists());

        fs::create_dir(&root).unwrap();
        let store = Store::open("absent", &root).unwrap();
        assert_eq!(store.config(), StoreConfig::default());
        assert!(!root.join(IN_DIR).exists());
    }

    #[test]
    fn open_with_applies_fallback_only_when_nothing_is_known() {
        let dir = tempfile::tempdir().unwrap();
        let empty = Store::open_with("s", dir.path(), sha2_dir256()).unwrap();
        assert_eq!(empty.config(), sha2_dir256());
        let digest = empty.put_data(b"sharded").unwrap();
        assert!(dir.path().join(&digest[..2]).join(&digest[2..]).is_file());

        let marked = tempfile::tempdir().unwrap();
        let config = StoreConfig::new(DirStructure::Flat, HashAlgorithm::Sha1);
        Store::open_or_create("m", marked.path(), config, DEFAULT_MODE).unwrap();
        let reopened = Store::open_with("m", marked.path(), sha2_dir256()).unwrap();
        assert_eq!(reopened.config(), config);
        assert!(reopened.was_overridden());
    }

    #[test]
    fn digest_case_matches_in_memory_store() {
        let dir = tempfile::tempdir().unwrap();
        let disk = Store::open_or_create("disk", dir.path(), sha2_dir256(), DEFAULT_MODE).unwrap();
        let mem = InMemoryStore::new(HashAlgorithm::Sha2);
        let lower = ContentHasher::SHA2.hash(b"mixed case");
        let upper = lower.to_ascii_uppercase();

        let stores: [&dyn ContentStore; 2] = [&disk, &mem];
        for store in stores {
            store.put(&upper, b"mixed case").unwrap();
            assert!(store.exists(&lower));
            assert!(store.exists(&upper));
            assert_eq!(store.get(&lower).unwrap(), b"mixed case");
        }
        assert!(dir.path().join(&lower[..2]).join(&lower[2..]).is_file());
        assert_eq!(disk.digests().unwrap(), vec![lower]);
    }

    #[cfg(unix)]
    #[test]
    fn unwritable_parent_is_permission_denied() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let parent = dir.path().join("locked");
        fs::create_dir(&parent).unwrap();
        fs::set_permissions(&parent, fs::Permissions::from_mode(0o500)).unwrap();
        // Root ignores permission bits.
        if fs::write(parent.join("canary"), b"").is_ok() {
            return;
        }

        let result = Store::open_or_create("s", parent.join("U"), sha2_dir256(), DEFAULT_MODE);
        fs::set_permissions(&parent, fs::Permissions::from_mode(0o755)).unwrap();
        assert!(matches!(result, Err(StoreError::PermissionDenied(_))));
    }

    #[test]
    fn stray_file_does_not_pin_flat_layout() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("README"), b"notes").unwrap();
        let store = Store::open_or_create("s", dir.path(), sha2_dir256(), DEFAULT_MODE).unwrap();
        assert_eq!(store.config(), sha2_dir256());
        assert!(!store.was_overridden());
        assert_eq!(
            LayoutMarker::read(dir.path()).unwrap().map(|m| m.structure),
            Some(DirStructure::Dir256x256)
        );
    }

    #[test]
    fn open_reads_marker() {
        let dir = tempfile::tempdir().unwrap();
        let config = StoreConfig::new(DirStructure::Dir16x16, HashAlgorithm::Blake2b);
        Store::open_or_create("s", dir.path(), config, DEFAULT_MODE).unwrap();
        let reopened = Store::open("s", dir.path()).unwrap();
        assert_eq!(reopened.config(), config);
    }

    #[test]
    fn staging_store_is_flat_with_same_algorithm() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open_or_create("main", dir.path(), sha2_dir256(), DEFAULT_MODE).unwrap();
        let committer_id = ContentHasher::SHA2.hash(b"committer");
        let staging = store.staging_store(&committer_id).unwrap();
        assert_eq!(staging.root(), dir.path().join(IN_DIR).join(&committer_id));
        assert_eq!(staging.structure(), DirStructure::Flat);
        assert_eq!(staging.algorithm(), HashAlgorithm::Sha2);

        let digest = staging.put_data(b"staged").unwrap();
        assert!(staging.root().join(&digest).is_file());
        assert!(!store.exists(&digest));
        assert!(store.digests().unwrap().is_empty());
    }

    #[test]
    fn digests_skip_scratch_areas() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open_or_create(
            "s",
            dir.path(),
            StoreConfig::new(DirStructure::Flat, HashAlgorithm::Sha1),
            DEFAULT_MODE,
        )
        .unwrap();
        let a = store.put_data(b"a").unwrap();
        let b = store.put_data(b"b").unwrap();
        fs::write(dir.path().join(TMP_DIR).join("leftover"), b"junk").unwrap();
        fs::write(dir.path().join("README"), b"not an object").unwrap();
        let mut expected = vec![a, b];
        expected.sort();
        assert_eq!(store.digests().unwrap(), expected);
    }

    #[test]
    fn default_name_from_root() {
        assert_eq!(default_name(Path::new("/var/app/sharedev/U")), "U");
        assert_eq!(default_name(Path::new("/tmp/my-store")), "store");
        assert_eq!(default_name(Path::new("/")), "store");
    }

    #[test]
    fn vanished_root_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("gone");
        let store = Store::open_or_create("g", &root, sha2_dir256(), DEFAULT_MODE).unwrap();
        assert!(store.check_available().is_ok());
        fs::remove_dir_all(&root).unwrap();
        assert!(matches!(store.check_available(), Err(StoreError::RootNotFound(_))));
    }

    #[cfg(unix)]
    #[test]
    fn created_dirs_use_mode() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("moded");
        Store::open_or_create("m", &root, sha2_dir256(), 0o700).unwrap();
        let mode = fs::metadata(root.join(TMP_DIR)).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o700);
    }
}
