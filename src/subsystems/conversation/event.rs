//! Events that drive conversation transitions.
//!
//! Transport events come from a channel; store events are fed back by the
//! engine after it carries out a store request.

use crate::subsystems::papers::{Level, PaperKey, PaperRecord};

/// Choice token that steps back one stage in the browse flow.
pub const BACK: &str = "nav:back";
/// Choice token equivalent to the `/cancel` command.
pub const CANCEL: &str = "nav:cancel";
/// Admin panel choice tokens.
pub const ADMIN_UPLOAD: &str = "admin:upload";
pub const ADMIN_DELETE: &str = "admin:delete";
/// Prefix of the tokens that pick the n-th listed subject or year.
pub const PICK: &str = "pick:";

/// Token for the listed label at `index`. Labels are free text from uploads
/// and are never sent as tokens.
pub fn pick_token(index: usize) -> String {
    format!("{PICK}{index}")
}

pub fn parse_pick(token: &str) -> Option<usize> {
    token.strip_prefix(PICK)?.parse().ok()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    // Transport events
    Start,
    Admin,
    Cancel,
    Choice(String),
    Text(String),
    Document {
        reference: String,
        name: Option<String>,
    },
    /// A message the bot has no use for (photo, sticker, voice, …).
    Unsupported,

    // Store results
    SubjectsLoaded {
        level: Level,
        subjects: Vec<String>,
    },
    YearsLoaded {
        level: Level,
        subject: String,
        years: Vec<String>,
    },
    PaperLookedUp {
        key: PaperKey,
        record: Option<PaperRecord>,
    },
    PaperStored {
        result: Result<PaperRecord, String>,
    },
    PaperDeleted {
        key: PaperKey,
        result: Result<bool, String>,
    },
    /// A read query failed at the persistence layer.
    StoreUnavailable,
}

impl Event {
    /// Parse a chat command (`/start`, `/admin`, `/cancel`).
    ///
    /// Case-insensitive; a `@botname` suffix and trailing arguments are
    /// ignored. Anything else is `None`.
    pub fn parse_command(text: &str) -> Option<Event> {
        let word = text.trim().split_whitespace().next()?;
        let command = word.strip_prefix('/')?;
        let command = command.split('@').next().unwrap_or(command);
        match command.to_ascii_lowercase().as_str() {
            "start" => Some(Event::Start),
            "admin" => Some(Event::Admin),
            "cancel" => Some(Event::Cancel),
            _ => None,
        }
    }

    /// Short name of the event kind, for logs and errors.
    pub fn kind(&self) -> &'static str {
        match self {
            Event::Start => "start",
            Event::Admin => "admin",
            Event::Cancel => "cancel",
            Event::Choice(_) => "choice",
            Event::Text(_) => "text",
            Event::Document { .. } => "document",
            Event::Unsupported => "unsupported",
            Event::SubjectsLoaded { .. } => "subjects_loaded",
            Event::YearsLoaded { .. } => "years_loaded",
            Event::PaperLookedUp { .. } => "paper_looked_up",
            Event::PaperStored { .. } => "paper_stored",
            Event::PaperDeleted { .. } => "paper_deleted",
            Event::StoreUnavailable => "store_unavailable",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commands_parse() {
        assert_eq!(Event::parse_command("/start"), Some(Event::Start));
        assert_eq!(Event::parse_command("  /ADMIN "), Some(Event::Admin));
        assert_eq!(Event::parse_command("/cancel@pyq_bot"), Some(Event::Cancel));
        assert_eq!(Event::parse_command("/start now please"), Some(Event::Start));
    }

    #[test]
    fn non_commands_are_none() {
        assert_eq!(Event::parse_command("start"), None);
        assert_eq!(Event::parse_command("/help"), None);
        assert_eq!(Event::parse_command(""), None);
        assert_eq!(Event::parse_command("Mathematics I"), None);
    }

    #[test]
    fn pick_tokens_round_trip_and_reject_labels() {
        assert_eq!(pick_token(3), "pick:3");
        assert_eq!(parse_pick(&pick_token(12)), Some(12));
        assert_eq!(parse_pick("nav:back"), None);
        assert_eq!(parse_pick("pick:"), None);
        assert_eq!(parse_pick("Mathematics I"), None);
    }
}
