//! Comms subsystem: the transports users talk to the bot through.
//!
//! Each channel (console, Telegram) implements [`runtime::Component`] and is
//! spawned by [`start`] via [`runtime::spawn_components`]. Channels capture
//! an [`Arc<CommsState>`] at construction and only reach the conversation
//! engine through it.
//!
//! An [`mpsc`] channel lets running channels signal the comms manager. It is
//! drained by a background task that ends once every channel has dropped
//! its sender.
//!
//! [`runtime::Component`]: crate::subsystems::runtime::Component
//! [`runtime::spawn_components`]: crate::subsystems::runtime::spawn_components

mod state;
#[cfg(feature = "channel-pty")]
pub mod pty;
#[cfg(feature = "channel-telegram")]
pub mod telegram;

pub use state::{CommsEvent, CommsState};

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::config::Config;
use crate::subsystems::conversation::Engine;
use crate::subsystems::runtime::{Component, SubsystemHandle, spawn_components};

// ── start ───────────────────────────────────────────────────────────────────

/// Spawn all configured channels and return a [`SubsystemHandle`].
///
/// Returns as soon as the tasks are spawned. If any channel exits with an
/// error the shared `shutdown` token is cancelled so the others stop too.
pub fn start(config: &Config, engine: Arc<Engine>, shutdown: CancellationToken) -> SubsystemHandle {
    let (event_tx, event_rx) = mpsc::channel::<CommsEvent>(32);
    let state = Arc::new(CommsState::new(engine, event_tx));

    let mut components: Vec<Box<dyn Component>> = Vec::new();

    #[cfg(feature = "channel-pty")]
    {
        if config.comms_pty_should_load() {
            info!(user = %config.comms.pty.user_id, "loading pty channel");
            components.push(Box::new(pty::PtyChannel::new(
                "pty0",
                config.comms.pty.user_id.clone(),
                state.clone(),
            )));
        }
    }

    #[cfg(feature = "channel-telegram")]
    {
        if config.comms_telegram_should_load() {
            info!("loading telegram channel");
            components.push(Box::new(telegram::TelegramChannel::new("telegram0", state.clone())));
        }
    }

    if components.is_empty() {
        info!(bot = %config.bot_name, "no comms channels configured");
    }

    // The manager keeps no sender of its own, so the drain ends with the
    // last channel.
    drop(state);
    tokio::spawn(async move {
        let mut rx = event_rx;
        while let Some(event) = rx.recv().await {
            match event {
                CommsEvent::ChannelShutdown { ref channel_id } => {
                    debug!(channel_id, "channel reported shutdown");
                }
                CommsEvent::SessionStarted { ref channel_id, ref user } => {
                    debug!(channel_id, %user, "flow started");
                }
            }
        }
    });

    spawn_components(components, shutdown)
}
