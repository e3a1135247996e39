//! Turns prompts and outcomes into transport-neutral [`Reply`] values.
//!
//! Channels decide how a reply looks (inline keyboard, numbered list, …);
//! the wording lives here so every channel says the same thing.

use super::effect::{Outcome, Prompt};
use super::event::{ADMIN_DELETE, ADMIN_UPLOAD, BACK, CANCEL, pick_token};
use super::transition::TransitionError;
use crate::subsystems::papers::{Level, PaperKey, PaperRecord};

/// One selectable option of a prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    pub label: String,
    /// Sent back verbatim as `Event::Choice`.
    pub token: String,
}

impl Button {
    fn new(label: impl Into<String>, token: impl Into<String>) -> Self {
        Self { label: label.into(), token: token.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Text plus an ordered list of choices (possibly empty for free-text input).
    Prompt { text: String, choices: Vec<Button> },
    /// A terminal message.
    Message { text: String },
    /// Deliver a stored document by its transport reference.
    Document { reference: String, caption: String },
    /// Input was not accepted at this point; the state is unchanged.
    Hint { text: String },
}

impl Reply {
    pub fn text(&self) -> &str {
        match self {
            Reply::Prompt { text, .. } | Reply::Message { text } | Reply::Hint { text } => text,
            Reply::Document { caption, .. } => caption,
        }
    }
}

pub fn prompt(prompt: &Prompt) -> Reply {
    match prompt {
        Prompt::BrowseLevels => menu(
            "🎓 Previous Year Question Papers\n\nSelect your program level:",
            level_buttons(),
        ),
        Prompt::BrowseSubjects { level, subjects } => menu(
            format!("📚 Level: {level}\n\nSelect a subject:"),
            labels_then(subjects, back()),
        ),
        Prompt::BrowseYears { level, subject, years } => menu(
            format!("📚 Level: {level}\n📖 Subject: {subject}\n\nSelect the year:"),
            labels_then(years, back()),
        ),
        Prompt::AdminActions => menu(
            "👑 Admin Panel\n\nWhat would you like to do?",
            vec![
                Button::new("📤 Upload Paper", ADMIN_UPLOAD),
                Button::new("🗑️ Delete Paper", ADMIN_DELETE),
                Button::new("❌ Cancel", CANCEL),
            ],
        ),
        Prompt::UploadLevels => menu(
            "📤 Upload New Paper\n\nSelect program level:",
            level_buttons().into_iter().chain([cancel()]).collect(),
        ),
        Prompt::UploadSubjectText { level } => menu(
            format!("📚 Level: {level}\n\nNow send the subject name (e.g., 'Mathematics I'):"),
            vec![],
        ),
        Prompt::UploadYearText { level, subject } => menu(
            format!(
                "📚 Level: {level}\n📖 Subject: {subject}\n\nNow send the year (e.g., '2024'):"
            ),
            vec![],
        ),
        Prompt::UploadDocument { key } => {
            menu(format!("{}\n\nNow send the PDF file:", summary(key)), vec![])
        }
        Prompt::DocumentRequired => {
            menu("❌ Please send a document file. Use /cancel to abort.", vec![])
        }
        Prompt::DeleteLevels => menu(
            "🗑️ Delete Paper\n\nSelect program level:",
            level_buttons().into_iter().chain([cancel()]).collect(),
        ),
        Prompt::DeleteSubjects { level, subjects } => menu(
            format!("📚 Level: {level}\n\nSelect subject to delete:"),
            labels_then(subjects, cancel()),
        ),
        Prompt::DeleteYears { level, subject, years } => menu(
            format!("📚 Level: {level}\n📖 Subject: {subject}\n\nSelect year to delete:"),
            labels_then(years, cancel()),
        ),
    }
}

pub fn outcome(outcome: &Outcome) -> Reply {
    let text = match outcome {
        Outcome::NotAuthorized => "⛔ You are not authorized to use admin commands.".to_string(),
        Outcome::Cancelled => "❌ Operation cancelled. Use /start to begin again.".to_string(),
        Outcome::NothingToCancel => {
            "Nothing to cancel. Use /start to search for a paper.".to_string()
        }
        Outcome::AdminClosed => "❌ Admin panel closed. Use /admin to open again.".to_string(),
        Outcome::NoPapersForLevel { level } => format!(
            "❌ No papers available for {level} level yet.\n\nUse /start to try another level."
        ),
        Outcome::PaperFound { key } => {
            format!("✅ Question Paper Found!\n\n{}\n\n📄 Sending file...", summary(key))
        }
        Outcome::PaperUnavailable { key } => format!(
            "❌ Sorry, question paper not available.\n\n{}\n\nUse /start to search for another paper.",
            summary(key)
        ),
        Outcome::Uploaded { record } => format!(
            "✅ Paper uploaded successfully!\n\n{}\n📄 File: {}\n\nUse /admin to upload more papers.",
            summary(&record.key),
            record.display_name.as_deref().unwrap_or("(unnamed)")
        ),
        Outcome::UploadFailed => {
            "❌ Error uploading paper. Please try again.\n\nUse /admin to try again.".to_string()
        }
        Outcome::NothingToDelete { level } => {
            format!("❌ No papers found for {level} level.\n\nUse /admin to try again.")
        }
        Outcome::Deleted { key } => format!(
            "✅ Paper deleted successfully!\n\n{}\n\nUse /admin to manage more papers.",
            summary(key)
        ),
        Outcome::DeleteMissed { key } => format!(
            "❌ Paper not found, nothing was deleted.\n\n{}\n\nUse /admin to try again.",
            summary(key)
        ),
        Outcome::DeleteFailed => "❌ Error deleting paper.\n\nUse /admin to try again.".to_string(),
        Outcome::StoreUnavailable => {
            "⚠️ Papers are temporarily unavailable. Please try again later.".to_string()
        }
    };
    Reply::Message { text }
}

pub fn delivery(record: &PaperRecord) -> Reply {
    Reply::Document {
        reference: record.document_reference.clone(),
        caption: format!(
            "📝 {} - {}\n\nUse /start to search for another paper.",
            record.key.subject, record.key.year
        ),
    }
}

pub fn hint(error: &TransitionError) -> Reply {
    let text = match error {
        TransitionError::NoActiveFlow { .. } => {
            "Use /start to search for a paper.".to_string()
        }
        TransitionError::UnexpectedInput { input: "choice", .. } => {
            "Please type your answer, or use /cancel to abort.".to_string()
        }
        TransitionError::UnexpectedInput { .. } | TransitionError::UnknownChoice { .. } => {
            "Please pick one of the options above, or use /cancel to abort.".to_string()
        }
    };
    Reply::Hint { text }
}

fn menu(text: impl Into<String>, choices: Vec<Button>) -> Reply {
    Reply::Prompt { text: text.into(), choices }
}

fn summary(key: &PaperKey) -> String {
    format!("📚 Level: {}\n📖 Subject: {}\n📅 Year: {}", key.level, key.subject, key.year)
}

fn level_buttons() -> Vec<Button> {
    Level::ALL.into_iter().map(|l| Button::new(l.label(), l.as_str())).collect()
}

fn labels_then(labels: &[String], last: Button) -> Vec<Button> {
    labels
        .iter()
        .enumerate()
        .map(|(i, label)| Button::new(label.as_str(), pick_token(i)))
        .chain([last])
        .collect()
}

fn back() -> Button {
    Button::new("« Back", BACK)
}

fn cancel() -> Button {
    Button::new("« Cancel", CANCEL)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(reply: &Reply) -> Vec<&str> {
        match reply {
            Reply::Prompt { choices, .. } => choices.iter().map(|c| c.token.as_str()).collect(),
            _ => vec![],
        }
    }

    #[test]
    fn level_menu_lists_all_levels_in_order() {
        let reply = prompt(&Prompt::BrowseLevels);
        assert_eq!(tokens(&reply), vec!["foundation", "diploma", "degree"]);
    }

    #[test]
    fn subject_menu_ends_with_back() {
        let reply = prompt(&Prompt::BrowseSubjects {
            level: Level::Foundation,
            subjects: vec!["English I".into(), "Mathematics I".into()],
        });
        assert!(reply.text().contains("Level: Foundation"));
        assert_eq!(tokens(&reply), vec!["pick:0", "pick:1", BACK]);
    }

    #[test]
    fn delete_menus_end_with_cancel() {
        let reply = prompt(&Prompt::DeleteYears {
            level: Level::Degree,
            subject: "Algorithms".into(),
            years: vec!["2024".into()],
        });
        assert_eq!(tokens(&reply), vec!["pick:0", CANCEL]);
        assert_eq!(tokens(&prompt(&Prompt::DeleteLevels)).last(), Some(&CANCEL));
    }

    #[test]
    fn long_labels_keep_short_tokens() {
        let subject = "Mathematics for Data Science II: Quiz 2 (January term) solutions, all sets".to_string();
        let reply = prompt(&Prompt::BrowseSubjects {
            level: Level::Foundation,
            subjects: vec![subject.clone(), BACK.to_string()],
        });
        let Reply::Prompt { choices, .. } = &reply else {
            panic!("expected prompt");
        };
        assert_eq!(choices[0].label, subject);
        assert_eq!(choices[1].label, BACK);
        assert_eq!(tokens(&reply), vec!["pick:0", "pick:1", BACK]);
        assert!(choices.iter().all(|c| c.token.len() <= 64));
    }

    #[test]
    fn text_prompts_have_no_choices() {
        let reply = prompt(&Prompt::UploadSubjectText { level: Level::Diploma });
        assert!(tokens(&reply).is_empty());
        assert!(reply.text().contains("subject name"));
    }

    #[test]
    fn delivery_carries_the_reference() {
        let record = PaperRecord {
            key: PaperKey::new(Level::Foundation, "Mathematics I", "2024"),
            document_reference: "abc".into(),
            display_name: None,
            uploaded_by: "1".into(),
            uploaded_at: "2024-01-01T00:00:00Z".into(),
        };
        match delivery(&record) {
            Reply::Document { reference, caption } => {
                assert_eq!(reference, "abc");
                assert!(caption.contains("Mathematics I - 2024"));
            }
            other => panic!("unexpected reply: {other:?}"),
        }
    }

    #[test]
    fn outcome_texts_echo_the_key() {
        let key = PaperKey::new(Level::Diploma, "MLP", "2023");
        let reply = outcome(&Outcome::PaperUnavailable { key });
        assert!(reply.text().contains("not available"));
        assert!(reply.text().contains("Subject: MLP"));
        assert!(reply.text().contains("Year: 2023"));
    }

    #[test]
    fn hints_depend_on_the_error() {
        let no_flow = hint(&TransitionError::NoActiveFlow { input: "text" });
        assert!(no_flow.text().contains("/start"));
        let typed = hint(&TransitionError::UnexpectedInput { stage: "upload_subject", input: "choice" });
        assert!(typed.text().contains("type your answer"));
    }
}
