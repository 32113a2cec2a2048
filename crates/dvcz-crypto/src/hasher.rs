use blake2::digest::consts::U32;
use dvcz_types::HashAlgorithm;
use sha2::Digest;

type Blake2b256 = blake2::Blake2b<U32>;

/// Content hasher for one of the store algorithms.
///
/// Produces lowercase hex digests: 40 characters for SHA1, 64 for the
/// others. Hashing is plain (no domain separation) so digests match what any
/// other tool computes for the same bytes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ContentHasher {
    algorithm: HashAlgorithm,
}

impl ContentHasher {
    pub const SHA1: Self = Self::new(HashAlgorithm::Sha1);
    pub const SHA2: Self = Self::new(HashAlgorithm::Sha2);
    pub const SHA3: Self = Self::new(HashAlgorithm::Sha3);
    pub const BLAKE2B: Self = Self::new(HashAlgorithm::Blake2b);

    pub const fn new(algorithm: HashAlgorithm) -> Self {
        Self { algorithm }
    }

    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    /// Hex digest of `data`.
    pub fn hash(&self, data: &[u8]) -> String {
        let mut state = self.start();
        state.update(data);
        state.finalize_hex()
    }

    /// Begin an incremental hash.
    pub fn start(&self) -> HashState {
        let inner = match self.algorithm {
            HashAlgorithm::Sha1 => Inner::Sha1(sha1::Sha1::new()),
            HashAlgorithm::Sha2 => Inner::Sha2(sha2::Sha256::new()),
            HashAlgorithm::Sha3 => Inner::Sha3(sha3::Sha3_256::new()),
            HashAlgorithm::Blake2b => Inner::Blake2b(Blake2b256::new()),
        };
        HashState { inner }
    }

    /// Verify that `data` hashes to `expected` (hex, case-insensitive).
    pub fn verify(&self, data: &[u8], expected: &str) -> bool {
        self.hash(data).eq_ignore_ascii_case(expected)
    }
}

enum Inner {
    Sha1(sha1::Sha1),
    Sha2(sha2::Sha256),
    Sha3(sha3::Sha3_256),
    Blake2b(Blake2b256),
}

/// In-progress hash computation returned by [`ContentHasher::start`].
pub struct HashState {
    inner: Inner,
}

impl HashState {
    pub fn update(&mut self, data: &[u8]) {
        match &mut self.inner {
            Inner::Sha1(h) => h.update(data),
            Inner::Sha2(h) => h.update(data),
            Inner::Sha3(h) => h.update(data),
            Inner::Blake2b(h) => h.update(data),
        }
    }

    pub fn finalize_hex(self) -> String {
        match self.inner {
            Inner::Sha1(h) => hex::encode(h.finalize()),
            Inner::Sha2(h) => hex::encode(h.finalize()),
            Inner::Sha3(h) => hex::encode(h.finalize()),
            Inner::Blake2b(h) => hex::encode(h.finalize()),
        }
    }
}
