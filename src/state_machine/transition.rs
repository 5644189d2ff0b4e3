//! Pure state transition function
//!
//! Given the same session, context and event this always produces the same
//! result. Waiting, drawing and network calls are effects for the runtime.

use super::{DrawContext, DrawSession, DrawStatus, Effect, Event};
use crate::fortune::{FortuneOutcome, CREDENTIAL_REPROMPT, DEGRADED_FORTUNE};
use thiserror::Error;

/// Result of a state transition
#[derive(Debug)]
pub struct TransitionResult {
    pub new_state: DrawSession,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(state: DrawSession) -> Self {
        Self {
            new_state: state,
            effects: vec![],
        }
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }
}

/// Errors that can occur during transition
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("A draw is already in progress")]
    DrawInProgress,
    #[error("Nothing to stop, start a draw first")]
    NotSpinning,
    #[error("Event from cycle {event_cycle} arrived during cycle {current_cycle}")]
    StaleCycle { event_cycle: u64, current_cycle: u64 },
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),
}

/// Pure transition function
pub fn transition(
    session: &DrawSession,
    context: &DrawContext,
    event: Event,
) -> Result<TransitionResult, TransitionError> {
    if let Some(event_cycle) = event.cycle() {
        if event_cycle != session.cycle {
            return Err(TransitionError::StaleCycle {
                event_cycle,
                current_cycle: session.cycle,
            });
        }
    }

    match (session.status, event) {
        // ============================================================
        // User intents
        // ============================================================
        (DrawStatus::Idle | DrawStatus::Finished, Event::Start) => Ok(TransitionResult::new(
            session.next_cycle(DrawStatus::Spinning),
        )
        .with_effect(Effect::AbortPending)
        .with_effect(Effect::PublishState)),

        (DrawStatus::Spinning | DrawStatus::Drawing, Event::Start) => {
            Err(TransitionError::DrawInProgress)
        }

        (DrawStatus::Spinning, Event::Stop) => {
            let next = DrawSession {
                status: DrawStatus::Drawing,
                ..session.clone()
            };
            Ok(TransitionResult::new(next)
                .with_effect(Effect::PublishState)
                .with_effect(Effect::DrawNumbers {
                    cycle: session.cycle,
                }))
        }

        // Repeated stop while the numbers come out: nothing to do
        (DrawStatus::Drawing, Event::Stop) => Ok(TransitionResult::new(session.clone())),

        (DrawStatus::Idle | DrawStatus::Finished, Event::Stop) => Err(TransitionError::NotSpinning),

        (_, Event::Reset) => Ok(TransitionResult::new(session.next_cycle(DrawStatus::Idle))
            .with_effect(Effect::AbortPending)
            .with_effect(Effect::PublishState)),

        (_, Event::CredentialAccepted) => {
            let next = DrawSession {
                credential_required: false,
                credential_renewed: session.fortune_loading,
                ..session.clone()
            };
            Ok(TransitionResult::new(next).with_effect(Effect::PublishState))
        }

        // ============================================================
        // Reveal sequencing
        // ============================================================
        (DrawStatus::Drawing, Event::NumbersDrawn { numbers, .. })
            if session.drawn.is_empty() =>
        {
            if numbers.len() != context.count {
                return Err(TransitionError::InvalidTransition(format!(
                    "expected {} numbers, drawer returned {}",
                    context.count,
                    numbers.len()
                )));
            }
            let next = DrawSession {
                drawn: numbers,
                ..session.clone()
            };
            Ok(TransitionResult::new(next).with_effect(Effect::ScheduleReveal {
                cycle: session.cycle,
                delay: context.reveal_interval,
            }))
        }

        (DrawStatus::Drawing, Event::RevealTick { .. })
            if session.revealed_numbers.len() < session.drawn.len() =>
        {
            let mut next = session.clone();
            next.revealed_numbers
                .push(session.drawn[session.revealed_numbers.len()]);

            if next.revealed_numbers.len() < next.drawn.len() {
                return Ok(TransitionResult::new(next)
                    .with_effect(Effect::PublishState)
                    .with_effect(Effect::ScheduleReveal {
                        cycle: session.cycle,
                        delay: context.reveal_interval,
                    }));
            }

            // Last number is out: finish and ask for the fortune
            next.status = DrawStatus::Finished;
            next.final_numbers = Some(next.drawn.clone());
            next.fortune_text = None;
            next.fortune_loading = true;
            let numbers = next.drawn.clone();
            Ok(TransitionResult::new(next)
                .with_effect(Effect::PublishState)
                .with_effect(Effect::RequestFortune {
                    cycle: session.cycle,
                    numbers,
                }))
        }

        // ============================================================
        // Fortune
        // ============================================================
        (DrawStatus::Finished, Event::FortuneResolved { outcome, .. })
            if session.fortune_loading =>
        {
            let mut next = DrawSession {
                fortune_loading: false,
                credential_renewed: false,
                ..session.clone()
            };
            let mut result = match outcome {
                FortuneOutcome::Success(text) | FortuneOutcome::Degraded(text) => {
                    next.fortune_text = Some(text);
                    TransitionResult::new(next)
                }
                // The refused key was already replaced; no need to ask again
                FortuneOutcome::CredentialInvalid if session.credential_renewed => {
                    next.fortune_text = Some(DEGRADED_FORTUNE.to_string());
                    TransitionResult::new(next).with_effect(Effect::RejectCredential)
                }
                FortuneOutcome::CredentialInvalid => {
                    next.fortune_text = Some(CREDENTIAL_REPROMPT.to_string());
                    next.credential_required = true;
                    TransitionResult::new(next).with_effect(Effect::RejectCredential)
                }
            };
            result.effects.push(Effect::PublishState);
            Ok(result)
        }

        (status, event) => Err(TransitionError::InvalidTransition(format!(
            "{event:?} in {status:?}"
        ))),
    }
}
