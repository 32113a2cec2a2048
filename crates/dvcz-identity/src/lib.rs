//! Committer identities for dvcz.
//!
//! A [`User`] holds a login and two private keys (signing and encryption); a
//! [`Committer`] adds a handle. Both serialize to line-oriented blocks that
//! embed the PEM text of their keys. [`PubUser`] and [`PubCommitter`] are the
//! public views.
//!
//! Committer IDs are hashes of a public key and the moment of creation, so
//! they are derived once and persisted with [`CommitterIdFile`].

pub mod clock;
pub mod committer;
pub mod committer_id;
pub mod error;
pub mod user;

pub use clock::{Clock, FixedClock, SystemClock};
pub use committer::{Committer, PubCommitter, COMMITTERS_DIR, COMMITTER_END, COMMITTER_START};
pub use committer_id::{derive_committer_id, CommitterIdFile, ID_FILE};
pub use error::{IdentityError, IdentityResult};
pub use user::{PubUser, User, USER_END, USER_START};
