use dvcz_types::HashAlgorithm;

use crate::error::StoreResult;

/// Digest-keyed byte store.
///
/// Implementations never interpret object contents and never check that a
/// digest matches the bytes handed to [`put`](ContentStore::put).
pub trait ContentStore: Send + Sync {
    /// Algorithm that names objects in this store.
    fn algorithm(&self) -> HashAlgorithm;

    /// Fail if the store's backing storage has gone away.
    fn check_available(&self) -> StoreResult<()> {
        Ok(())
    }

    /// Read an object. Returns `NotFound` if it is absent.
    fn get(&self, digest: &str) -> StoreResult<Vec<u8>>;

    /// Whether an object is present. Never fails.
    fn exists(&self, digest: &str) -> bool;

    /// Write an object under `digest`. Overwriting is allowed.
    fn put(&self, digest: &str, data: &[u8]) -> StoreResult<()>;

    /// Hash `data` with [`algorithm`](ContentStore::algorithm), store it,
    /// and return the digest.
    fn put_data(&self, data: &[u8]) -> StoreResult<String> {
        let digest = dvcz_crypto::ContentHasher::new(self.algorithm()).hash(data);
        self.put(&digest, data)?;
        Ok(digest)
    }
}
