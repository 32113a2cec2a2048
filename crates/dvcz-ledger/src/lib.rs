//! Build ledgers and their verification.
//!
//! A project's ledger at `<project>/.dvcz/builds` holds one line per build:
//!
//! ```text
//! 2024-01-01 00:00:00 v1.0.0 <digest of the build list>
//! ```
//!
//! Each build list is itself an object in a content-keyed store naming the
//! files of that build by digest. The [`Verifier`] checks that every build
//! list and every file it names is present, reporting problems per record
//! instead of stopping at the first one.

pub mod buildlist;
pub mod error;
pub mod parser;
pub mod records;
pub mod verify;

pub use buildlist::{BuildListDecoder, BuildListEntry, DecodeError, PlainBuildListDecoder};
pub use error::{LedgerError, LedgerResult, ParseError};
pub use parser::{append_record, LedgerParser, ParsedLine};
pub use records::{BuildRecord, BuildVersion, TIMESTAMP_FORMAT};
pub use verify::{check_builds, MissingFile, Problem, RecordOutcome, VerificationReport, Verifier};
