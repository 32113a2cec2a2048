//! Cryptographic primitives for dvcz.
//!
//! Provides content hashing over the four store algorithms and Ed25519
//! keypairs with PEM import/export.
//!
//! All crypto operations wrap established libraries.

pub mod hasher;
pub mod keys;

pub use hasher::{ContentHasher, HashState};
pub use keys::{KeyError, KeyPair, PublicKey, KEY_BITS, PRIVATE_KEY_PEM_END};
