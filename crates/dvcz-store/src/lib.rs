//! Self-describing content-keyed file store for dvcz.
//!
//! Objects are files named by the hex digest of their contents, optionally
//! sharded one or two hex digits deep. A store records its own structure and
//! hash algorithm so that reopening it never depends on the caller's
//! defaults; stores created by older tools are recognised from the shape of
//! their directories instead.
//!
//! - [`Store`] -- the on-disk store
//! - [`InMemoryStore`] -- `HashMap`-backed store for tests
//! - [`ContentStore`] -- the trait both implement
//! - [`StoreDescriptor`] -- `name::path::STRUCTURE::ALGORITHM`

pub mod descriptor;
pub mod discover;
pub mod error;
pub mod layout;
pub mod memory;
pub mod store;
pub mod traits;

pub use descriptor::StoreDescriptor;
pub use discover::{probe, Probe};
pub use error::{StoreError, StoreResult};
pub use layout::{locate, LayoutMarker, IN_DIR, MARKER_FILE, TMP_DIR};
pub use memory::InMemoryStore;
pub use store::{default_name, Store, StoreConfig, DEFAULT_MODE};
pub use traits::ContentStore;
