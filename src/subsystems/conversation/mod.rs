//! Conversation engine: the browse and admin flows as an explicit state
//! machine.
//!
//! [`transition`] is a pure `(state, event) -> (state, effects)` table.
//! [`Engine`] keeps one [`ConversationState`] per user, runs store requests
//! against a [`PaperStore`](crate::subsystems::papers::PaperStore), and
//! renders prompts and outcomes into [`Reply`] values for the channels.

mod effect;
mod engine;
pub mod event;
pub mod render;
mod state;
mod transition;

#[cfg(test)]
mod proptests;

pub use effect::{Effect, Outcome, Prompt, StoreRequest};
pub use engine::Engine;
pub use event::Event;
pub use render::{Button, Reply};
pub use state::{ConversationState, Flow, Selections};
pub use transition::{TransitionContext, TransitionError, TransitionResult, transition};
