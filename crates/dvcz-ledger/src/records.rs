use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::error::ParseError;

/// `strftime` format of ledger timestamps.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A `MAJOR.MINOR.PATCH` build version.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BuildVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl BuildVersion {
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }
}

impl fmt::Display for BuildVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl FromStr for BuildVersion {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bad = || ParseError::Version(s.to_string());
        let parts: Vec<&str> = s.split('.').collect();
        let [major, minor, patch] = parts.as_slice() else {
            return Err(bad());
        };
        let number = |p: &str| -> Result<u32, ParseError> {
            if p.is_empty() || !p.bytes().all(|b| b.is_ascii_digit()) {
                return Err(bad());
            }
            p.parse().map_err(|_| bad())
        };
        Ok(Self::new(number(*major)?, number(*minor)?, number(*patch)?))
    }
}

/// One line of a build ledger.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildRecord {
    pub timestamp: NaiveDateTime,
    pub version: BuildVersion,
    /// Lowercase hex digest of the build list.
    pub digest: String,
}

impl BuildRecord {
    pub fn new(timestamp: NaiveDateTime, version: BuildVersion, digest: impl Into<String>) -> Self {
        Self {
            timestamp,
            version,
            digest: digest.into().to_ascii_lowercase(),
        }
    }
}

/// Renders the ledger line, without the newline.
impl fmt::Display for BuildRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} v{} {}",
            self.timestamp.format(TIMESTAMP_FORMAT),
            self.version,
            self.digest
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn version_parse() {
        assert_eq!("1.0.12".parse::<BuildVersion>().unwrap(), BuildVersion::new(1, 0, 12));
        for bad in ["1.0", "1.0.0.0", "a.b.c", "1..0", "1.0.-1", "+1.0.0", ""] {
            assert!(bad.parse::<BuildVersion>().is_err(), "{bad}");
        }
    }

    #[test]
    fn version_ordering() {
        assert!(BuildVersion::new(1, 10, 0) > BuildVersion::new(1, 9, 9));
    }

    #[test]
    fn record_renders_ledger_line() {
        let ts = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let digest = "A9993E364706816ABA3E25717850C26C9CD0D89D";
        let record = BuildRecord::new(ts, BuildVersion::new(1, 0, 0), digest);
        assert_eq!(
            record.to_string(),
            "2024-01-01 00:00:00 v1.0.0 a9993e364706816aba3e25717850c26c9cd0d89d"
        );
    }
}
