//! Runtime for the draw session
//!
//! One session per process. User intents and background results are queued
//! to a single task that owns the state, so transitions never race.

mod executor;
pub mod traits;


pub use executor::SessionRuntime;
pub use traits::*;

use crate::credential::{CredentialError, CredentialSource, Credentials};
use crate::state_machine::{DrawContext, DrawSession, Event, SessionView};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{broadcast, mpsc, watch};

const EVENT_CHANNEL_CAPACITY: usize = 32;
const BROADCAST_CAPACITY: usize = 128;

/// Events sent to SSE clients
#[derive(Debug, Clone)]
pub enum SseEvent {
    Init { session: SessionView },
    StateChange { session: SessionView },
    Error { message: String },
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Credential(#[from] CredentialError),
    #[error("Session runtime is not running")]
    Closed,
}

/// Handle to interact with the running session
#[derive(Clone)]
pub struct SessionHandle {
    event_tx: mpsc::Sender<Event>,
    broadcast_tx: broadcast::Sender<SseEvent>,
    view_rx: watch::Receiver<SessionView>,
    credentials: Arc<Credentials>,
}

impl SessionHandle {
    /// Queue an intent or result for the session
    pub async fn send_event(&self, event: Event) -> Result<(), SessionError> {
        self.event_tx
            .send(event)
            .await
            .map_err(|_| SessionError::Closed)
    }

    /// Receive every published state change and error from now on
    pub fn subscribe(&self) -> broadcast::Receiver<SseEvent> {
        self.broadcast_tx.subscribe()
    }

    /// Latest published state
    pub fn snapshot(&self) -> SessionView {
        self.view_rx.borrow().clone()
    }

    #[cfg(test)]
    pub fn watch(&self) -> watch::Receiver<SessionView> {
        self.view_rx.clone()
    }

    /// Validate and accept a user-supplied API key, then clear the prompt
    pub async fn submit_credential(
        &self,
        candidate: &str,
        remember: bool,
    ) -> Result<CredentialSource, SessionError> {
        let credential = self.credentials.submit(candidate, remember)?;
        tracing::info!(source = ?credential.source(), remember, "API key accepted");
        self.send_event(Event::CredentialAccepted).await?;
        Ok(credential.source())
    }

    /// Where the current API key comes from, if there is one
    pub fn credential_source(&self) -> Option<CredentialSource> {
        self.credentials.current_source()
    }
}

/// Start a session runtime on the current tokio runtime
pub fn spawn_session<D, F>(
    context: DrawContext,
    drawer: D,
    fortune_teller: F,
    credentials: Arc<Credentials>,
) -> SessionHandle
where
    D: NumberDrawer + 'static,
    F: FortuneTeller + 'static,
{
    let (event_tx, event_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
    let (broadcast_tx, _) = broadcast::channel(BROADCAST_CAPACITY);
    let (view_tx, view_rx) = watch::channel(DrawSession::default().view());

    let runtime = SessionRuntime::new(
        context,
        drawer,
        fortune_teller,
        credentials.clone(),
        event_rx,
        event_tx.clone(),
        broadcast_tx.clone(),
        view_tx,
    );
    tokio::spawn(runtime.run());

    SessionHandle {
        event_tx,
        broadcast_tx,
        view_rx,
        credentials,
    }
}
