use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use dvcz_store::{default_name, ContentStore, Store, StoreError};
use dvcz_types::{builds_path, HashAlgorithm};
use serde::Serialize;
use tracing::{debug, info};

use crate::buildlist::{BuildListDecoder, PlainBuildListDecoder};
use crate::error::{LedgerError, LedgerResult};
use crate::parser::LedgerParser;
use crate::records::BuildRecord;

/// A file named by a build list that the store does not hold.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MissingFile {
    pub path: String,
    pub digest: String,
}

/// What is wrong with one ledger record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Problem {
    /// The line is not a build record.
    Unparseable { reason: String },
    /// The store has no build list under the record's digest.
    BuildListNotFound { digest: String },
    /// The build list is not UTF-8 text.
    NotUtf8 { digest: String, reason: String },
    /// The build list text could not be decoded.
    BuildListDecode { digest: String, reason: String },
    /// Files named by the build list are missing from the store.
    MissingFiles { digest: String, files: Vec<MissingFile> },
}

impl std::fmt::Display for Problem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Problem::Unparseable { reason } => write!(f, "cannot parse line: {reason}"),
            Problem::BuildListNotFound { digest } => {
                write!(f, "cannot find build list at {digest}")
            }
            Problem::NotUtf8 { digest, reason } => {
                write!(f, "build list {digest} is not UTF-8: {reason}")
            }
            Problem::BuildListDecode { digest, reason } => {
                write!(f, "cannot decode build list {digest}: {reason}")
            }
            Problem::MissingFiles { files, .. } => {
                write!(f, "{} build list file(s) not found", files.len())
            }
        }
    }
}

/// Outcome of verifying one ledger line.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RecordOutcome {
    pub line_no: usize,
    pub line: String,
    /// `None` if the line did not parse.
    pub record: Option<BuildRecord>,
    /// `None` if the record passed.
    pub problem: Option<Problem>,
}

impl RecordOutcome {
    pub fn passed(&self) -> bool {
        self.problem.is_none()
    }
}

/// Per-record results of checking a ledger against a store, in ledger
/// order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct VerificationReport {
    pub ledger: PathBuf,
    pub algorithm: HashAlgorithm,
    pub outcomes: Vec<RecordOutcome>,
    /// Set if the run stopped early; `outcomes` then covers a prefix of the
    /// ledger.
    pub cancelled: bool,
}

impl VerificationReport {
    /// `true` if every record verified passed and the run was not cancelled.
    pub fn is_clean(&self) -> bool {
        !self.cancelled && self.outcomes.iter().all(RecordOutcome::passed)
    }

    /// Outcomes that carry a problem.
    pub fn problems(&self) -> impl Iterator<Item = &RecordOutcome> {
        self.outcomes.iter().filter(|o| !o.passed())
    }

    pub fn passed_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.passed()).count()
    }
}

/// Read-only auditor checking that every build list named in a ledger, and
/// every file those lists name, is in a store.
pub struct Verifier<D = PlainBuildListDecoder> {
    decoder: D,
    cancel: Option<Arc<AtomicBool>>,
}

impl Verifier {
    pub fn new() -> Self {
        Self::with_decoder(PlainBuildListDecoder)
    }
}

impl Default for Verifier {
    fn default() -> Self {
        Self::new()
    }
}

impl<D: BuildListDecoder> Verifier<D> {
    pub fn with_decoder(decoder: D) -> Self {
        Self {
            decoder,
            cancel: None,
        }
    }

    /// Stop before the next record once `flag` is set.
    pub fn with_cancel(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    fn cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }

    /// Verify every record of the ledger at `ledger_path` against `store`.
    ///
    /// Fails only if the ledger or the store is missing; every per-record
    /// problem goes into the report. I/O errors reading the store are
    /// propagated.
    pub fn verify<S: ContentStore + ?Sized>(
        &self,
        store: &S,
        ledger_path: &Path,
    ) -> LedgerResult<VerificationReport> {
        let algorithm = store.algorithm();
        let lines = LedgerParser::new(algorithm).read(ledger_path)?;
        store.check_available()?;

        let mut report = VerificationReport {
            ledger: ledger_path.to_path_buf(),
            algorithm,
            outcomes: Vec::with_capacity(lines.len()),
            cancelled: false,
        };
        for parsed in lines {
            if self.cancelled() {
                report.cancelled = true;
                break;
            }
            let (record, problem) = match parsed.result {
                Ok(record) => {
                    let problem = self.verify_record(store, &record)?;
                    (Some(record), problem)
                }
                Err(err) => (
                    None,
                    Some(Problem::Unparseable {
                        reason: err.to_string(),
                    }),
                ),
            };
            debug!(line_no = parsed.line_no, passed = problem.is_none(), "verified record");
            report.outcomes.push(RecordOutcome {
                line_no: parsed.line_no,
                line: parsed.text,
                record,
                problem,
            });
        }

        info!(
            ledger = %ledger_path.display(),
            records = report.outcomes.len(),
            problems = report.problems().count(),
            cancelled = report.cancelled,
            "verified build ledger"
        );
        Ok(report)
    }

    fn verify_record<S: ContentStore + ?Sized>(
        &self,
        store: &S,
        record: &BuildRecord,
    ) -> LedgerResult<Option<Problem>> {
        let digest = record.digest.clone();
        let data = match store.get(&digest) {
            Ok(data) => data,
            Err(StoreError::NotFound(_)) => return Ok(Some(Problem::BuildListNotFound { digest })),
            Err(e) => return Err(e.into()),
        };
        let text = match String::from_utf8(data) {
            Ok(text) => text,
            Err(e) => {
                return Ok(Some(Problem::NotUtf8 {
                    digest,
                    reason: e.utf8_error().to_string(),
                }))
            }
        };
        let entries = match self.decoder.decode(&text, store.algorithm()) {
            Ok(entries) => entries,
            Err(e) => {
                return Ok(Some(Problem::BuildListDecode {
                    digest,
                    reason: e.to_string(),
                }))
            }
        };
        let files: Vec<MissingFile> = entries
            .into_iter()
            .filter(|e| !store.exists(&e.digest))
            .map(|e| MissingFile {
                path: e.path,
                digest: e.digest,
            })
            .collect();
        if files.is_empty() {
            Ok(None)
        } else {
            Ok(Some(Problem::MissingFiles { digest, files }))
        }
    }
}

/// Check the builds ledger of the project at `project_root` against the
/// store at `store_root`, discovering the store's layout.
pub fn check_builds(project_root: &Path, store_root: &Path) -> LedgerResult<VerificationReport> {
    let ledger = builds_path(project_root);
    if !ledger.is_file() {
        return Err(LedgerError::LedgerNotFound(ledger));
    }
    let store = Store::open(&default_name(store_root), store_root)?;
    debug!(
        project = %project_root.display(),
        ledger = %ledger.display(),
        structure = %store.structure(),
        algorithm = %store.algorithm(),
        "checking builds"
    );
    Verifier::new().verify(&store, &ledger)
}
