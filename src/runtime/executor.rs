//! Draw session runtime executor

use super::traits::{FortuneTeller, NumberDrawer};
use super::SseEvent;

use crate::credential::{Credential, Credentials};
use crate::state_machine::{
    transition, DrawContext, DrawSession, Effect, Event, SessionView, TransitionError,
};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, watch};
use tokio_util::sync::CancellationToken;

/// Generic session runtime that can work with any drawer and fortune implementations
pub struct SessionRuntime<D, F>
where
    D: NumberDrawer + 'static,
    F: FortuneTeller + 'static,
{
    context: DrawContext,
    state: DrawSession,
    drawer: D,
    fortune_teller: Arc<F>,
    credentials: Arc<Credentials>,
    event_rx: mpsc::Receiver<Event>,
    event_tx: mpsc::Sender<Event>,
    broadcast_tx: broadcast::Sender<SseEvent>,
    view_tx: watch::Sender<SessionView>,
    /// Cancels reveal timers and fortune requests of the current cycle
    cycle_cancel: CancellationToken,
    /// Credential the outstanding fortune request was made with
    fortune_credential: Option<Credential>,
}

impl<D, F> SessionRuntime<D, F>
where
    D: NumberDrawer + 'static,
    F: FortuneTeller + 'static,
{
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        context: DrawContext,
        drawer: D,
        fortune_teller: F,
        credentials: Arc<Credentials>,
        event_rx: mpsc::Receiver<Event>,
        event_tx: mpsc::Sender<Event>,
        broadcast_tx: broadcast::Sender<SseEvent>,
        view_tx: watch::Sender<SessionView>,
    ) -> Self {
        Self {
            context,
            state: DrawSession::default(),
            drawer,
            fortune_teller: Arc::new(fortune_teller),
            credentials,
            event_rx,
            event_tx,
            broadcast_tx,
            view_tx,
            cycle_cancel: CancellationToken::new(),
            fortune_credential: None,
        }
    }

    pub async fn run(mut self) {
        tracing::info!(
            count = self.context.count,
            range_min = self.context.range_min,
            range_max = self.context.range_max,
            "Starting draw session runtime"
        );

        loop {
            tokio::select! {
                Some(event) = self.event_rx.recv() => {
                    if let Err(e) = self.process_event(event) {
                        tracing::warn!(error = %e, "Error handling event");
                        let _ = self.broadcast_tx.send(SseEvent::Error { message: e });
                    }
                }
                else => break,
            }
        }

        self.cycle_cancel.cancel();
        tracing::info!("Draw session runtime stopped");
    }

    fn process_event(&mut self, event: Event) -> Result<(), String> {
        // Effects may produce follow-up events synchronously
        let mut events_to_process = vec![event];

        while let Some(current_event) = events_to_process.pop() {
            let result = match transition(&self.state, &self.context, current_event) {
                Ok(r) => r,
                Err(TransitionError::StaleCycle {
                    event_cycle,
                    current_cycle,
                }) => {
                    tracing::debug!(event_cycle, current_cycle, "Discarding stale event");
                    continue;
                }
                Err(e) => return Err(e.to_string()),
            };

            let old_status = self.state.status;
            self.state = result.new_state;
            if old_status != self.state.status {
                tracing::info!(
                    cycle = self.state.cycle,
                    from = ?old_status,
                    to = ?self.state.status,
                    "Session status changed"
                );
            }

            for effect in result.effects {
                if let Some(generated_event) = self.execute_effect(effect)? {
                    events_to_process.push(generated_event);
                }
            }
        }

        Ok(())
    }

    fn execute_effect(&mut self, effect: Effect) -> Result<Option<Event>, String> {
        match effect {
            Effect::PublishState => {
                let view = self.state.view();
                self.view_tx.send_replace(view.clone());
                let _ = self.broadcast_tx.send(SseEvent::StateChange { session: view });
                Ok(None)
            }

            Effect::AbortPending => {
                self.cycle_cancel.cancel();
                self.cycle_cancel = CancellationToken::new();
                self.fortune_credential = None;
                Ok(None)
            }

            Effect::DrawNumbers { cycle } => {
                let numbers = self
                    .drawer
                    .draw(
                        self.context.count,
                        self.context.range_min,
                        self.context.range_max,
                    )
                    .map_err(|e| format!("Failed to draw numbers: {e}"))?;
                tracing::debug!(cycle, ?numbers, "Numbers drawn");
                Ok(Some(Event::NumbersDrawn { cycle, numbers }))
            }

            Effect::ScheduleReveal { cycle, delay } => {
                let cancel = self.cycle_cancel.clone();
                let event_tx = self.event_tx.clone();
                tokio::spawn(async move {
                    tokio::select! {
                        biased;
                        () = cancel.cancelled() => {}
                        () = tokio::time::sleep(delay) => {
                            let _ = event_tx.send(Event::RevealTick { cycle }).await;
                        }
                    }
                });
                Ok(None)
            }

            Effect::RequestFortune { cycle, numbers } => {
                // After a refusal no stored or fallback key is tried until
                // the user submits a new one
                let credential = if self.state.credential_required {
                    None
                } else {
                    self.credentials.current()
                };
                self.fortune_credential.clone_from(&credential);

                let cancel = self.cycle_cancel.clone();
                let event_tx = self.event_tx.clone();
                let fortune_teller = self.fortune_teller.clone();
                tokio::spawn(async move {
                    tokio::select! {
                        biased;
                        () = cancel.cancelled() => {
                            tracing::debug!(cycle, "Fortune request abandoned");
                        }
                        outcome = fortune_teller.request_fortune(&numbers, credential.as_ref()) => {
                            let _ = event_tx
                                .send(Event::FortuneResolved { cycle, outcome })
                                .await;
                        }
                    }
                });
                Ok(None)
            }

            Effect::RejectCredential => {
                // Without a credential there is nothing to forget
                if let Some(used) = self.fortune_credential.take() {
                    tracing::warn!(source = ?used.source(), "API key rejected, clearing it");
                    if let Err(e) = self.credentials.reject(&used) {
                        tracing::error!(error = %e, "Failed to clear rejected API key");
                    }
                }
                Ok(None)
            }
        }
    }
}
