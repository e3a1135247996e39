//! Effects produced by state transitions.

use crate::subsystems::papers::{Level, NewPaper, PaperKey, PaperRecord};

/// Effects the engine carries out after a transition, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Ask the user for the next input.
    Prompt(Prompt),
    /// Terminal message; the flow has ended.
    Finish(Outcome),
    /// Send the stored document to the user.
    Deliver(PaperRecord),
    /// Query or mutate the paper store; the result comes back as an event.
    Store(StoreRequest),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreRequest {
    ListSubjects { level: Level },
    ListYears { level: Level, subject: String },
    FindPaper { key: PaperKey },
    UpsertPaper { paper: NewPaper },
    DeletePaper { key: PaperKey },
}

/// What the user is asked for. Rendering to text happens in `render`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Prompt {
    BrowseLevels,
    BrowseSubjects { level: Level, subjects: Vec<String> },
    BrowseYears { level: Level, subject: String, years: Vec<String> },
    AdminActions,
    UploadLevels,
    UploadSubjectText { level: Level },
    UploadYearText { level: Level, subject: String },
    UploadDocument { key: PaperKey },
    /// Re-prompt at the document stage after a non-document input.
    DocumentRequired,
    DeleteLevels,
    DeleteSubjects { level: Level, subjects: Vec<String> },
    DeleteYears { level: Level, subject: String, years: Vec<String> },
}

/// Terminal outcomes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    NotAuthorized,
    Cancelled,
    NothingToCancel,
    AdminClosed,
    NoPapersForLevel { level: Level },
    PaperFound { key: PaperKey },
    PaperUnavailable { key: PaperKey },
    Uploaded { record: PaperRecord },
    UploadFailed,
    NothingToDelete { level: Level },
    Deleted { key: PaperKey },
    DeleteMissed { key: PaperKey },
    DeleteFailed,
    StoreUnavailable,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::NotAuthorized => "not_authorized",
            Outcome::Cancelled => "cancelled",
            Outcome::NothingToCancel => "nothing_to_cancel",
            Outcome::AdminClosed => "admin_closed",
            Outcome::NoPapersForLevel { .. } => "no_papers_for_level",
            Outcome::PaperFound { .. } => "paper_found",
            Outcome::PaperUnavailable { .. } => "paper_unavailable",
            Outcome::Uploaded { .. } => "uploaded",
            Outcome::UploadFailed => "upload_failed",
            Outcome::NothingToDelete { .. } => "nothing_to_delete",
            Outcome::Deleted { .. } => "deleted",
            Outcome::DeleteMissed { .. } => "delete_missed",
            Outcome::DeleteFailed => "delete_failed",
            Outcome::StoreUnavailable => "store_unavailable",
        }
    }
}

#[cfg(test)]
impl Effect {
    pub(crate) fn list_subjects(level: Level) -> Self {
        Effect::Store(StoreRequest::ListSubjects { level })
    }

    pub(crate) fn list_years(level: Level, subject: impl Into<String>) -> Self {
        Effect::Store(StoreRequest::ListYears { level, subject: subject.into() })
    }

    pub(crate) fn is_store_write(&self) -> bool {
        matches!(
            self,
            Effect::Store(StoreRequest::UpsertPaper { .. } | StoreRequest::DeletePaper { .. })
        )
    }
}
