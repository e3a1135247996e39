//! Papers subsystem: the durable `(level, subject, year)` → document table.
//!
//! The conversation engine only sees the [`PaperStore`] trait. The shipped
//! implementation is [`SqlitePaperStore`]; levels and subjects are never
//! rows of their own, they are derived from the papers that exist.

mod store;
mod types;

pub use store::SqlitePaperStore;
pub use types::{Level, NewPaper, PaperKey, PaperRecord, ParseLevelError};

use crate::error::AppError;

/// Persistence boundary of the paper table.
///
/// Every call goes to durable storage; implementations keep no cache.
pub trait PaperStore: Send + Sync {
    /// Distinct subjects for `level`, ascending. Empty is not an error.
    fn list_subjects(&self, level: Level) -> Result<Vec<String>, AppError>;

    /// Distinct years for `level` + `subject`, descending by string order.
    ///
    /// Years are labels, not numbers: `"2024" > "2019"` holds for four-digit
    /// years, mixed formats sort lexicographically.
    fn list_years(&self, level: Level, subject: &str) -> Result<Vec<String>, AppError>;

    /// Look up one paper. A miss is `Ok(None)`.
    fn find(&self, key: &PaperKey) -> Result<Option<PaperRecord>, AppError>;

    /// Insert, or fully replace the paper with the same key.
    fn upsert(&self, paper: NewPaper) -> Result<PaperRecord, AppError>;

    /// Remove the paper with exactly this key; `true` if one existed.
    fn delete(&self, key: &PaperKey) -> Result<bool, AppError>;
}
