//! Paper store value types: program level, the `(level, subject, year)` key,
//! and the stored record.

use std::fmt;
use std::str::FromStr;

/// Program level. Parsed case-insensitively, stored lowercase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Level {
    Foundation,
    Diploma,
    Degree,
}

impl Level {
    /// All levels in menu order.
    pub const ALL: [Level; 3] = [Level::Foundation, Level::Diploma, Level::Degree];

    /// Canonical storage form, also used as the menu choice token.
    pub fn as_str(self) -> &'static str {
        match self {
            Level::Foundation => "foundation",
            Level::Diploma => "diploma",
            Level::Degree => "degree",
        }
    }

    /// Human-facing label.
    pub fn label(self) -> &'static str {
        match self {
            Level::Foundation => "Foundation",
            Level::Diploma => "Diploma",
            Level::Degree => "Degree",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseLevelError(pub String);

impl fmt::Display for ParseLevelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown level: {:?}", self.0)
    }
}

impl std::error::Error for ParseLevelError {}

impl FromStr for Level {
    type Err = ParseLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        Level::ALL
            .into_iter()
            .find(|level| level.as_str().eq_ignore_ascii_case(needle))
            .ok_or_else(|| ParseLevelError(s.to_string()))
    }
}

/// The unique key of a paper.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PaperKey {
    pub level: Level,
    pub subject: String,
    pub year: String,
}

impl PaperKey {
    /// Build a key; `subject` and `year` are trimmed.
    pub fn new(level: Level, subject: impl AsRef<str>, year: impl AsRef<str>) -> Self {
        Self {
            level,
            subject: subject.as_ref().trim().to_string(),
            year: year.as_ref().trim().to_string(),
        }
    }
}

impl fmt::Display for PaperKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.level.as_str(), self.subject, self.year)
    }
}

/// Write payload for [`PaperStore::upsert`](super::PaperStore::upsert).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPaper {
    pub key: PaperKey,
    /// Opaque transport token for the uploaded file.
    pub document_reference: String,
    pub display_name: Option<String>,
    pub uploaded_by: String,
}

/// A stored paper.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaperRecord {
    pub key: PaperKey,
    pub document_reference: String,
    pub display_name: Option<String>,
    pub uploaded_by: String,
    /// RFC 3339 UTC, second precision; set by the store on every write.
    pub uploaded_at: String,
}
