//! Conversation driver: owns the per-user states and carries out effects.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tracing::{debug, info, warn};

use super::effect::{Effect, StoreRequest};
use super::event::Event;
use super::render::{self, Reply};
use super::state::ConversationState;
use super::transition::{TransitionContext, transition};
use crate::subsystems::auth::{Authorizer, UserId};
use crate::subsystems::papers::PaperStore;

/// One state machine instance per user, all sharing one store.
pub struct Engine {
    store: Arc<dyn PaperStore>,
    authorizer: Arc<dyn Authorizer>,
    sessions: Mutex<HashMap<UserId, ConversationState>>,
}

impl Engine {
    pub fn new(store: Arc<dyn PaperStore>, authorizer: Arc<dyn Authorizer>) -> Self {
        Self { store, authorizer, sessions: Mutex::new(HashMap::new()) }
    }

    /// Feed one transport event for `user` and return what to show them.
    ///
    /// Blocks on store calls. Inputs of one user must not overlap; the
    /// session lock is never held across a store call.
    pub fn handle(&self, user: &UserId, event: Event) -> Vec<Reply> {
        let privileged = matches!(event, Event::Admin) && self.authorizer.is_privileged(user);
        if matches!(event, Event::Admin) && !privileged {
            warn!(%user, "admin panel requested by unprivileged user");
        }
        let ctx = TransitionContext { user: user.clone(), privileged };

        let mut state = self.take_session(user);
        let mut replies = Vec::new();
        let mut pending = Some(event);

        while let Some(event) = pending.take() {
            let kind = event.kind();
            let result = match transition(state.as_ref(), &ctx, event) {
                Ok(result) => result,
                Err(e) => {
                    debug!(%user, error = %e, "input not accepted");
                    replies.push(render::hint(&e));
                    break;
                }
            };

            debug!(
                %user,
                event = kind,
                from = state.as_ref().map_or("idle", ConversationState::stage_name),
                to = result.next.as_ref().map_or("idle", ConversationState::stage_name),
                "transition"
            );
            state = result.next;

            for effect in result.effects {
                match effect {
                    Effect::Prompt(prompt) => replies.push(render::prompt(&prompt)),
                    Effect::Finish(outcome) => {
                        info!(%user, outcome = outcome.as_str(), "flow finished");
                        replies.push(render::outcome(&outcome));
                    }
                    Effect::Deliver(record) => replies.push(render::delivery(&record)),
                    Effect::Store(request) => pending = Some(self.execute(user, request)),
                }
            }
        }

        if let Some(state) = state {
            self.put_session(user, state);
        }
        replies
    }

    /// Current state of `user`, if a flow is active.
    pub fn session(&self, user: &UserId) -> Option<ConversationState> {
        self.lock_sessions().get(user).cloned()
    }

    pub fn active_sessions(&self) -> usize {
        self.lock_sessions().len()
    }

    fn execute(&self, user: &UserId, request: StoreRequest) -> Event {
        match request {
            StoreRequest::ListSubjects { level } => match self.store.list_subjects(level) {
                Ok(subjects) => Event::SubjectsLoaded { level, subjects },
                Err(e) => {
                    warn!(%user, %level, "list_subjects failed: {e}");
                    Event::StoreUnavailable
                }
            },
            StoreRequest::ListYears { level, subject } => {
                match self.store.list_years(level, &subject) {
                    Ok(years) => Event::YearsLoaded { level, subject, years },
                    Err(e) => {
                        warn!(%user, %level, %subject, "list_years failed: {e}");
                        Event::StoreUnavailable
                    }
                }
            }
            StoreRequest::FindPaper { key } => match self.store.find(&key) {
                Ok(record) => Event::PaperLookedUp { key, record },
                Err(e) => {
                    warn!(%user, %key, "find failed: {e}");
                    Event::StoreUnavailable
                }
            },
            StoreRequest::UpsertPaper { paper } => {
                let key = paper.key.clone();
                let result = self.store.upsert(paper).map_err(|e| e.to_string());
                match &result {
                    Ok(_) => info!(%user, %key, "paper uploaded"),
                    Err(e) => warn!(%user, %key, "upsert failed: {e}"),
                }
                Event::PaperStored { result }
            }
            StoreRequest::DeletePaper { key } => {
                let result = self.store.delete(&key).map_err(|e| e.to_string());
                match &result {
                    Ok(removed) => info!(%user, %key, removed, "paper delete"),
                    Err(e) => warn!(%user, %key, "delete failed: {e}"),
                }
                Event::PaperDeleted { key, result }
            }
        }
    }

    fn take_session(&self, user: &UserId) -> Option<ConversationState> {
        self.lock_sessions().remove(user)
    }

    fn put_session(&self, user: &UserId, state: ConversationState) {
        self.lock_sessions().insert(user.clone(), state);
    }

    fn lock_sessions(&self) -> std::sync::MutexGuard<'_, HashMap<UserId, ConversationState>> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
