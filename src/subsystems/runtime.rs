//! Task runtime shared by the bot's long-running channels.
//!
//! A [`Component`] is one independently-runnable unit (the console, the
//! Telegram poller). Components capture their shared state when they are
//! built; [`spawn_components`] runs them side by side and returns a
//! [`SubsystemHandle`] that resolves once all of them have stopped.
//!
//! The first component to fail cancels the shared [`CancellationToken`], so
//! a dead channel takes the rest of the process down with it instead of
//! leaving a half-running bot.

use std::future::Future;
use std::pin::Pin;

use tokio::task::{JoinHandle, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

use crate::error::AppError;

// ── Component ─────────────────────────────────────────────────────────────────

/// Boxed future returned by [`Component::run`].
pub type ComponentFuture = Pin<Box<dyn Future<Output = Result<(), AppError>> + Send + 'static>>;

pub trait Component: Send + 'static {
    /// Stable identifier used in log messages.
    fn id(&self) -> &str;

    /// Consume the component and return its run loop.
    ///
    /// The loop should return once `shutdown` is cancelled or its input is
    /// exhausted.
    fn run(self: Box<Self>, shutdown: CancellationToken) -> ComponentFuture;
}

// ── SubsystemHandle ───────────────────────────────────────────────────────────

/// Handle to a running set of components.
pub struct SubsystemHandle {
    inner: JoinHandle<Result<(), AppError>>,
}

impl SubsystemHandle {
    /// Wait for every component and return the first error, if any.
    pub async fn join(self) -> Result<(), AppError> {
        match self.inner.await {
            Ok(r) => r,
            Err(e) => Err(AppError::Comms(format!("channel manager panicked: {e}"))),
        }
    }
}

// ── spawn_components ──────────────────────────────────────────────────────────

/// Spawn each component as its own task.
///
/// An `Err` or a panic from any component cancels `shutdown`; the remaining
/// components are drained and the first failure is returned from
/// [`SubsystemHandle::join`].
pub fn spawn_components(
    components: Vec<Box<dyn Component>>,
    shutdown: CancellationToken,
) -> SubsystemHandle {
    let handle = tokio::spawn(async move {
        let mut set: JoinSet<Result<(), AppError>> = JoinSet::new();

        for component in components {
            debug!(component = %component.id(), "spawning component");
            set.spawn(component.run(shutdown.clone()));
        }

        let mut first_err: Option<AppError> = None;

        while let Some(res) = set.join_next().await {
            match res {
                Err(e) => {
                    error!("component panicked: {e}");
                    shutdown.cancel();
                    first_err.get_or_insert_with(|| AppError::Comms(format!("component panicked: {e}")));
                }
                Ok(Err(e)) => {
                    error!("component error: {e}");
                    shutdown.cancel();
                    first_err.get_or_insert(e);
                }
                Ok(Ok(())) => {}
            }
        }

        first_err.map_or(Ok(()), Err)
    });

    SubsystemHandle { inner: handle }
}
