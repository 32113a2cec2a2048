use std::collections::HashMap;
use std::sync::RwLock;

use dvcz_types::HashAlgorithm;

use crate::error::{StoreError, StoreResult};
use crate::traits::ContentStore;

/// In-memory, HashMap-based content store.
///
/// Intended for tests and embedding. Digests are validated against the
/// algorithm exactly as the on-disk store does.
pub struct InMemoryStore {
    algorithm: HashAlgorithm,
    objects: RwLock<HashMap<String, Vec<u8>>>,
}

impl InMemoryStore {
    /// Create a new empty store keyed by `algorithm`.
    pub fn new(algorithm: HashAlgorithm) -> Self {
        Self {
            algorithm,
            objects: RwLock::new(HashMap::new()),
        }
    }

    /// Number of objects currently stored.
    pub fn len(&self) -> usize {
        self.objects.read().expect("lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.read().expect("lock poisoned").is_empty()
    }

    /// Remove an object. Returns `true` if it was present.
    pub fn remove(&self, digest: &str) -> bool {
        self.objects
            .write()
            .expect("lock poisoned")
            .remove(&digest.to_ascii_lowercase())
            .is_some()
    }

    /// Sorted digests of all stored objects.
    pub fn digests(&self) -> Vec<String> {
        let map = self.objects.read().expect("lock poisoned");
        let mut digests: Vec<String> = map.keys().cloned().collect();
        digests.sort();
        digests
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new(HashAlgorithm::default())
    }
}

impl ContentStore for InMemoryStore {
    fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    fn get(&self, digest: &str) -> StoreResult<Vec<u8>> {
        self.algorithm.validate_digest(digest)?;
        let map = self.objects.read().expect("lock poisoned");
        map.get(&digest.to_ascii_lowercase())
            .cloned()
            .ok_or_else(|| StoreError::NotFound(digest.to_string()))
    }

    fn exists(&self, digest: &str) -> bool {
        let map = self.objects.read().expect("lock poisoned");
        map.contains_key(&digest.to_ascii_lowercase())
    }

    fn put(&self, digest: &str, data: &[u8]) -> StoreResult<()> {
        self.algorithm.validate_digest(digest)?;
        let mut map = self.objects.write().expect("lock poisoned");
        map.insert(digest.to_ascii_lowercase(), data.to_vec());
        Ok(())
    }
}

impl std::fmt::Debug for InMemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryStore")
            .field("algorithm", &self.algorithm)
            .field("object_count", &self.len())
            .finish()
    }
}
