//! Shared state for the comms channels.
//!
//! Channels receive an `Arc<CommsState>` and only reach the conversation
//! engine through [`CommsState::handle`]. The engine itself stays private.
//!
//! [`CommsState::report_event`] lets a running channel signal the comms
//! manager (shutdown, new user) without touching the engine.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::warn;

use crate::error::AppError;
use crate::subsystems::auth::UserId;
use crate::subsystems::conversation::{Engine, Event, Reply};

// ── Events ────────────────────────────────────────────────────────────────────

/// Events a channel sends back to the comms manager.
#[derive(Debug)]
pub enum CommsEvent {
    /// Channel has stopped (clean exit or EOF).
    ChannelShutdown { channel_id: String },
    /// A user started a new flow on the channel.
    SessionStarted { channel_id: String, user: UserId },
}

// ── State ─────────────────────────────────────────────────────────────────────

pub struct CommsState {
    engine: Arc<Engine>,
    event_tx: mpsc::Sender<CommsEvent>,
}

impl CommsState {
    pub fn new(engine: Arc<Engine>, event_tx: mpsc::Sender<CommsEvent>) -> Self {
        Self { engine, event_tx }
    }

    /// Run `event` for `user` through the conversation engine.
    ///
    /// The engine blocks on SQLite, so it runs on the blocking pool and the
    /// channel's async loop stays responsive.
    pub async fn handle(
        &self,
        channel_id: &str,
        user: UserId,
        event: Event,
    ) -> Result<Vec<Reply>, AppError> {
        if matches!(event, Event::Start | Event::Admin) {
            self.report_event(CommsEvent::SessionStarted {
                channel_id: channel_id.to_string(),
                user: user.clone(),
            });
        }

        let engine = Arc::clone(&self.engine);
        tokio::task::spawn_blocking(move || engine.handle(&user, event))
            .await
            .map_err(|e| AppError::Comms(format!("engine task failed: {e}")))
    }

    /// Report an event to the comms manager.
    ///
    /// Non-blocking: the event is dropped with a warning if the manager is
    /// not keeping up or has already exited.
    pub fn report_event(&self, event: CommsEvent) {
        if let Err(e) = self.event_tx.try_send(event) {
            warn!("comms event dropped: {e}");
        }
    }
}
