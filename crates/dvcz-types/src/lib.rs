//! Foundation types for dvcz.
//!
//! This crate provides the small vocabulary every other dvcz crate shares.
//!
//! # Key Types
//!
//! - [`HashAlgorithm`] -- SHA1, SHA2-256, SHA3-256 or BLAKE2b-256 keying of a store
//! - [`DirStructure`] -- directory sharding strategy of a store
//! - [`Project`] -- descriptor of a project root and its language
//! - [`names`] -- the identifier grammar used for every user-visible name

pub mod algorithm;
pub mod error;
pub mod names;
pub mod project;
pub mod structure;

pub use algorithm::HashAlgorithm;
pub use error::TypeError;
pub use names::{is_valid_name, validate_name};
pub use project::{builds_path, Project, BUILDS_FILE, DVCZ_DIR};
pub use structure::DirStructure;
