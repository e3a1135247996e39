//! Pure state transition function.
//!
//! `(state, event) -> (next state, effects)`. No I/O happens here: store
//! access is requested through [`Effect::Store`] and answered by the engine
//! with a follow-up event, so every transition can be tested without a
//! database or a transport.

use thiserror::Error;

use super::effect::{Effect, Outcome, Prompt, StoreRequest};
use super::event::{ADMIN_DELETE, ADMIN_UPLOAD, BACK, CANCEL, Event, parse_pick};
use super::state::ConversationState;
use crate::subsystems::auth::UserId;
use crate::subsystems::papers::{Level, NewPaper, PaperKey};

/// Per-event facts the transition needs from outside.
#[derive(Debug, Clone)]
pub struct TransitionContext {
    pub user: UserId,
    /// Result of the authorizer; only consulted on [`Event::Admin`].
    pub privileged: bool,
}

/// Result of a state transition.
#[derive(Debug, PartialEq, Eq)]
pub struct TransitionResult {
    /// `None` once the flow has ended.
    pub next: Option<ConversationState>,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(state: ConversationState) -> Self {
        Self { next: Some(state), effects: vec![] }
    }

    pub fn end() -> Self {
        Self { next: None, effects: vec![] }
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }

    fn prompt(self, prompt: Prompt) -> Self {
        self.with_effect(Effect::Prompt(prompt))
    }

    fn finish(self, outcome: Outcome) -> Self {
        self.with_effect(Effect::Finish(outcome))
    }

    fn store(self, request: StoreRequest) -> Self {
        self.with_effect(Effect::Store(request))
    }
}

/// Inputs a stage does not accept. None of these change state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("no active flow, {input} ignored")]
    NoActiveFlow { input: &'static str },
    #[error("{stage} does not accept {input}")]
    UnexpectedInput { stage: &'static str, input: &'static str },
    #[error("{stage}: unknown choice {token:?}")]
    UnknownChoice { stage: &'static str, token: String },
}

pub fn transition(
    state: Option<&ConversationState>,
    ctx: &TransitionContext,
    event: Event,
) -> Result<TransitionResult, TransitionError> {
    use ConversationState as S;

    match (state, event) {
        // ============================================================
        // Entry points; a new flow replaces any active one
        // ============================================================
        (_, Event::Start) => Ok(TransitionResult::new(S::BrowseLevel).prompt(Prompt::BrowseLevels)),

        (_, Event::Admin) if ctx.privileged => {
            Ok(TransitionResult::new(S::ChooseAction).prompt(Prompt::AdminActions))
        }
        (_, Event::Admin) => Ok(TransitionResult::end().finish(Outcome::NotAuthorized)),

        // ============================================================
        // Cancellation, from any non-terminal state
        // ============================================================
        (None, Event::Cancel) => Ok(TransitionResult::end().finish(Outcome::NothingToCancel)),
        (Some(S::ChooseAction), Event::Cancel) => {
            Ok(TransitionResult::end().finish(Outcome::AdminClosed))
        }
        (Some(S::ChooseAction), Event::Choice(token)) if token == CANCEL => {
            Ok(TransitionResult::end().finish(Outcome::AdminClosed))
        }
        (Some(_), Event::Cancel) => Ok(TransitionResult::end().finish(Outcome::Cancelled)),
        (Some(_), Event::Choice(token)) if token == CANCEL => {
            Ok(TransitionResult::end().finish(Outcome::Cancelled))
        }

        (None, event) => Err(TransitionError::NoActiveFlow { input: event.kind() }),

        // Read faults end any flow.
        (Some(_), Event::StoreUnavailable) => {
            Ok(TransitionResult::end().finish(Outcome::StoreUnavailable))
        }

        // ============================================================
        // Browse: level -> subject -> year
        // ============================================================
        (Some(state @ S::BrowseLevel), Event::Choice(token)) => {
            let level = parse_level(state, token)?;
            Ok(TransitionResult::new(S::BrowseLevel).store(StoreRequest::ListSubjects { level }))
        }

        // Lands on subject selection, both after a level choice and after
        // "back" from year selection.
        (Some(S::BrowseLevel | S::BrowseYear { .. }), Event::SubjectsLoaded { level, subjects }) => {
            if subjects.is_empty() {
                return Ok(TransitionResult::end().finish(Outcome::NoPapersForLevel { level }));
            }
            Ok(TransitionResult::new(S::BrowseSubject { level, subjects: subjects.clone() })
                .prompt(Prompt::BrowseSubjects { level, subjects }))
        }

        (Some(S::BrowseSubject { .. }), Event::Choice(token)) if token == BACK => {
            Ok(TransitionResult::new(S::BrowseLevel).prompt(Prompt::BrowseLevels))
        }

        (Some(state @ S::BrowseSubject { level, .. }), Event::Choice(token)) => {
            let subject = pick(state, token)?;
            Ok(TransitionResult::new(state.clone())
                .store(StoreRequest::ListYears { level: *level, subject }))
        }

        (Some(S::BrowseSubject { .. }), Event::YearsLoaded { level, subject, years }) => {
            Ok(TransitionResult::new(S::BrowseYear {
                level,
                subject: subject.clone(),
                years: years.clone(),
            })
            .prompt(Prompt::BrowseYears { level, subject, years }))
        }

        (Some(state @ S::BrowseYear { level, .. }), Event::Choice(token)) if token == BACK => {
            Ok(TransitionResult::new(state.clone()).store(StoreRequest::ListSubjects { level: *level }))
        }

        (Some(state @ S::BrowseYear { level, subject, .. }), Event::Choice(token)) => {
            let key = PaperKey::new(*level, subject, pick(state, token)?);
            Ok(TransitionResult::new(state.clone()).store(StoreRequest::FindPaper { key }))
        }

        (Some(S::BrowseYear { .. }), Event::PaperLookedUp { key, record }) => Ok(match record {
            Some(record) => TransitionResult::end()
                .finish(Outcome::PaperFound { key })
                .with_effect(Effect::Deliver(record)),
            None => TransitionResult::end().finish(Outcome::PaperUnavailable { key }),
        }),

        // ============================================================
        // Admin panel
        // ============================================================
        (Some(S::ChooseAction), Event::Choice(token)) if token == ADMIN_UPLOAD => {
            Ok(TransitionResult::new(S::UploadLevel).prompt(Prompt::UploadLevels))
        }
        (Some(S::ChooseAction), Event::Choice(token)) if token == ADMIN_DELETE => {
            Ok(TransitionResult::new(S::DeleteLevel).prompt(Prompt::DeleteLevels))
        }
        (Some(state @ S::ChooseAction), Event::Choice(token)) => {
            Err(TransitionError::UnknownChoice { stage: state.stage_name(), token })
        }

        // ============================================================
        // Admin upload: level menu, subject and year as text, document
        // ============================================================
        (Some(state @ S::UploadLevel), Event::Choice(token)) => {
            let level = parse_level(state, token)?;
            Ok(TransitionResult::new(S::UploadSubject { level })
                .prompt(Prompt::UploadSubjectText { level }))
        }

        (Some(S::UploadSubject { level }), Event::Text(text)) => {
            let subject = text.trim().to_string();
            Ok(TransitionResult::new(S::UploadYear { level: *level, subject: subject.clone() })
                .prompt(Prompt::UploadYearText { level: *level, subject }))
        }

        (Some(S::UploadYear { level, subject }), Event::Text(text)) => {
            let key = PaperKey::new(*level, subject, text);
            Ok(TransitionResult::new(S::UploadDocument { key: key.clone() })
                .prompt(Prompt::UploadDocument { key }))
        }

        (Some(state @ S::UploadDocument { key }), Event::Document { reference, name }) => {
            let paper = NewPaper {
                key: key.clone(),
                document_reference: reference,
                display_name: name,
                uploaded_by: ctx.user.as_str().to_string(),
            };
            Ok(TransitionResult::new(state.clone()).store(StoreRequest::UpsertPaper { paper }))
        }

        // The one retry-on-invalid-input point: stay put and ask again.
        (
            Some(state @ S::UploadDocument { .. }),
            Event::Text(_) | Event::Choice(_) | Event::Unsupported,
        ) => {
            Ok(TransitionResult::new(state.clone()).prompt(Prompt::DocumentRequired))
        }

        (Some(S::UploadDocument { .. }), Event::PaperStored { result }) => Ok(match result {
            Ok(record) => TransitionResult::end().finish(Outcome::Uploaded { record }),
            Err(_) => TransitionResult::end().finish(Outcome::UploadFailed),
        }),

        // ============================================================
        // Admin delete: level -> subject -> year, all menus
        // ============================================================
        (Some(state @ S::DeleteLevel), Event::Choice(token)) => {
            let level = parse_level(state, token)?;
            Ok(TransitionResult::new(S::DeleteLevel).store(StoreRequest::ListSubjects { level }))
        }

        (Some(S::DeleteLevel), Event::SubjectsLoaded { level, subjects }) => {
            if subjects.is_empty() {
                return Ok(TransitionResult::end().finish(Outcome::NothingToDelete { level }));
            }
            Ok(TransitionResult::new(S::DeleteSubject { level, subjects: subjects.clone() })
                .prompt(Prompt::DeleteSubjects { level, subjects }))
        }

        (Some(state @ S::DeleteSubject { level, .. }), Event::Choice(token)) => {
            let subject = pick(state, token)?;
            Ok(TransitionResult::new(state.clone())
                .store(StoreRequest::ListYears { level: *level, subject }))
        }

        (Some(S::DeleteSubject { .. }), Event::YearsLoaded { level, subject, years }) => {
            Ok(TransitionResult::new(S::DeleteYear {
                level,
                subject: subject.clone(),
                years: years.clone(),
            })
            .prompt(Prompt::DeleteYears { level, subject, years }))
        }

        (Some(state @ S::DeleteYear { level, subject, .. }), Event::Choice(token)) => {
            let key = PaperKey::new(*level, subject, pick(state, token)?);
            Ok(TransitionResult::new(state.clone()).store(StoreRequest::DeletePaper { key }))
        }

        (Some(S::DeleteYear { .. }), Event::PaperDeleted { key, result }) => Ok(match result {
            Ok(true) => TransitionResult::end().finish(Outcome::Deleted { key }),
            Ok(false) => TransitionResult::end().finish(Outcome::DeleteMissed { key }),
            Err(_) => TransitionResult::end().finish(Outcome::DeleteFailed),
        }),

        // ============================================================
        // Anything else is out of place for the current stage
        // ============================================================
        (Some(state), event) => Err(TransitionError::UnexpectedInput {
            stage: state.stage_name(),
            input: event.kind(),
        }),
    }
}

/// Resolve a pick token against the labels the current menu listed.
fn pick(state: &ConversationState, token: String) -> Result<String, TransitionError> {
    let label = parse_pick(&token).and_then(|i| state.listed()?.get(i));
    match label {
        Some(label) => Ok(label.clone()),
        None => Err(TransitionError::UnknownChoice { stage: state.stage_name(), token }),
    }
}

fn parse_level(state: &ConversationState, token: String) -> Result<Level, TransitionError> {
    token
        .parse::<Level>()
        .map_err(|_| TransitionError::UnknownChoice { stage: state.stage_name(), token })
}
