//! Conversation state types.
//!
//! Each variant is one stage of one flow and carries exactly the selections
//! made before it, so a stage can never hold a selection it has not earned.
//! Menu stages also keep the labels they listed; a pick token is an index
//! into that list.

use crate::subsystems::papers::{Level, PaperKey};

/// The three guided flows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Flow {
    Browse,
    AdminUpload,
    AdminDelete,
}

impl Flow {
    pub fn as_str(self) -> &'static str {
        match self {
            Flow::Browse => "browse",
            Flow::AdminUpload => "admin_upload",
            Flow::AdminDelete => "admin_delete",
        }
    }
}

/// Per-user state while a flow is active. Dropped at every terminal outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversationState {
    // Browse
    BrowseLevel,
    BrowseSubject { level: Level, subjects: Vec<String> },
    BrowseYear { level: Level, subject: String, years: Vec<String> },

    // Admin panel, shared entry of both admin flows
    ChooseAction,

    // Admin upload
    UploadLevel,
    UploadSubject { level: Level },
    UploadYear { level: Level, subject: String },
    UploadDocument { key: PaperKey },

    // Admin delete
    DeleteLevel,
    DeleteSubject { level: Level, subjects: Vec<String> },
    DeleteYear { level: Level, subject: String, years: Vec<String> },
}

/// Flat view of the choices accumulated so far.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selections {
    pub level: Option<Level>,
    pub subject: Option<String>,
    pub year: Option<String>,
}

impl ConversationState {
    /// The flow this state belongs to; `None` on the admin panel before an
    /// action is picked.
    pub fn flow(&self) -> Option<Flow> {
        use ConversationState as S;
        match self {
            S::BrowseLevel | S::BrowseSubject { .. } | S::BrowseYear { .. } => Some(Flow::Browse),
            S::ChooseAction => None,
            S::UploadLevel | S::UploadSubject { .. } | S::UploadYear { .. } | S::UploadDocument { .. } => {
                Some(Flow::AdminUpload)
            }
            S::DeleteLevel | S::DeleteSubject { .. } | S::DeleteYear { .. } => Some(Flow::AdminDelete),
        }
    }

    /// Stable stage name for logs and error messages.
    pub fn stage_name(&self) -> &'static str {
        use ConversationState as S;
        match self {
            S::BrowseLevel => "browse_level",
            S::BrowseSubject { .. } => "browse_subject",
            S::BrowseYear { .. } => "browse_year",
            S::ChooseAction => "choose_action",
            S::UploadLevel => "upload_level",
            S::UploadSubject { .. } => "upload_subject",
            S::UploadYear { .. } => "upload_year",
            S::UploadDocument { .. } => "upload_document",
            S::DeleteLevel => "delete_level",
            S::DeleteSubject { .. } => "delete_subject",
            S::DeleteYear { .. } => "delete_year",
        }
    }

    /// Labels a pick token indexes into, for the menu stages that list them.
    pub fn listed(&self) -> Option<&[String]> {
        use ConversationState as S;
        match self {
            S::BrowseSubject { subjects, .. } | S::DeleteSubject { subjects, .. } => Some(subjects.as_slice()),
            S::BrowseYear { years, .. } | S::DeleteYear { years, .. } => Some(years.as_slice()),
            _ => None,
        }
    }

    pub fn selections(&self) -> Selections {
        use ConversationState as S;
        match self {
            S::BrowseLevel | S::ChooseAction | S::UploadLevel | S::DeleteLevel => Selections::default(),
            S::BrowseSubject { level, .. }
            | S::UploadSubject { level }
            | S::DeleteSubject { level, .. } => {
                Selections { level: Some(*level), ..Selections::default() }
            }
            S::BrowseYear { level, subject, .. }
            | S::UploadYear { level, subject }
            | S::DeleteYear { level, subject, .. } => Selections {
                level: Some(*level),
                subject: Some(subject.clone()),
                year: None,
            },
            S::UploadDocument { key } => Selections {
                level: Some(key.level),
                subject: Some(key.subject.clone()),
                year: Some(key.year.clone()),
            },
        }
    }
}
