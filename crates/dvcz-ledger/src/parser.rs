use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::sync::LazyLock;

use chrono::NaiveDateTime;
use dvcz_types::HashAlgorithm;
use regex::Regex;
use tracing::{debug, warn};

use crate::error::{LedgerError, LedgerResult, ParseError};
use crate::records::{BuildRecord, TIMESTAMP_FORMAT};

/// Ledger line carrying a 40-character SHA1 digest.
static SHA1_LINE: LazyLock<Regex> = LazyLock::new(|| line_regex(40));
/// Ledger line carrying a 64-character digest.
static WIDE_LINE: LazyLock<Regex> = LazyLock::new(|| line_regex(64));

fn line_regex(hex_len: usize) -> Regex {
    let pattern = format!(
        r"^([0-9]{{4}}-[0-9]{{2}}-[0-9]{{2}} [0-9]{{2}}:[0-9]{{2}}:[0-9]{{2}}) v([0-9]+\.[0-9]+\.[0-9]+) ([0-9a-fA-F]{{{hex_len}}})$"
    );
    Regex::new(&pattern).expect("ledger line pattern is valid")
}

/// One ledger line and what parsing it produced.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParsedLine {
    /// 1-based line number.
    pub line_no: usize,
    /// The line as read; invalid UTF-8 is replaced with U+FFFD.
    pub text: String,
    pub result: Result<BuildRecord, ParseError>,
}

/// Parser for build ledgers of a store using one hash algorithm.
///
/// Digest length is fixed by the algorithm before any line is read: 40 hex
/// characters for SHA1, 64 otherwise.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LedgerParser {
    algorithm: HashAlgorithm,
}

impl LedgerParser {
    pub fn new(algorithm: HashAlgorithm) -> Self {
        Self { algorithm }
    }

    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    fn line_pattern(&self) -> &'static Regex {
        match self.algorithm {
            HashAlgorithm::Sha1 => &*SHA1_LINE,
            _ => &*WIDE_LINE,
        }
    }

    /// Parse one line, without its newline.
    pub fn parse_line(&self, line: &str) -> Result<BuildRecord, ParseError> {
        let caps = self
            .line_pattern()
            .captures(line)
            .ok_or(ParseError::Malformed)?;
        let stamp = &caps[1];
        let timestamp = NaiveDateTime::parse_from_str(stamp, TIMESTAMP_FORMAT)
            .map_err(|_| ParseError::Timestamp(stamp.to_string()))?;
        let version = caps[2].parse()?;
        Ok(BuildRecord::new(timestamp, version, &caps[3]))
    }

    /// Parse ledger text. See [`LedgerParser::parse_bytes`].
    pub fn parse(&self, text: &str) -> Vec<ParsedLine> {
        self.parse_bytes(text.as_bytes())
    }

    /// Parse raw ledger contents.
    ///
    /// Lines are `\n`-terminated; the empty segment after the final newline
    /// is dropped. A bad line, including one that is not UTF-8, is reported
    /// in its [`ParsedLine`] and does not stop parsing.
    pub fn parse_bytes(&self, bytes: &[u8]) -> Vec<ParsedLine> {
        let mut segments: Vec<&[u8]> = bytes.split(|b| *b == b'\n').collect();
        if segments.last().is_some_and(|s| s.is_empty()) {
            segments.pop();
        } else {
            warn!("ledger does not end with a newline");
        }

        segments
            .into_iter()
            .enumerate()
            .map(|(i, raw)| {
                let (text, result) = match std::str::from_utf8(raw) {
                    Ok(line) => (line.to_string(), self.parse_line(line)),
                    Err(e) => (
                        String::from_utf8_lossy(raw).into_owned(),
                        Err(ParseError::NotUtf8(e.to_string())),
                    ),
                };
                if let Err(err) = &result {
                    warn!(line_no = i + 1, line = %text, error = %err, "cannot parse ledger line");
                }
                ParsedLine {
                    line_no: i + 1,
                    text,
                    result,
                }
            })
            .collect()
    }

    /// Read and parse the ledger at `path`. A missing file is fatal.
    pub fn read(&self, path: &Path) -> LedgerResult<Vec<ParsedLine>> {
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(LedgerError::LedgerNotFound(path.to_path_buf()))
            }
            Err(e) => return Err(e.into()),
        };
        Ok(self.parse_bytes(&bytes))
    }
}

/// Append `record` to the ledger at `path`, creating the file and its
/// parent directory if needed.
///
/// A ledger whose last line lacks its newline gets one first, so every
/// record stays on its own line.
pub fn append_record(path: &Path, record: &BuildRecord) -> LedgerResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let needs_newline = match fs::read(path) {
        Ok(bytes) => !bytes.is_empty() && !bytes.ends_with(b"\n"),
        Err(e) if e.kind() == io::ErrorKind::NotFound => false,
        Err(e) => return Err(e.into()),
    };
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    if needs_newline {
        file.write_all(b"\n")?;
    }
    writeln!(file, "{record}")?;
    debug!(path = %path.display(), %record, "appended build record");
    Ok(())
}
