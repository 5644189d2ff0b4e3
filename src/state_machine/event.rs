//! Events that can occur in a draw session

use crate::fortune::FortuneOutcome;

/// Events that trigger state transitions
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    // User events
    Start,
    Stop,
    Reset,
    /// A new API key was accepted by the credential store
    CredentialAccepted,

    // Runtime events, tagged with the cycle that requested them
    NumbersDrawn { cycle: u64, numbers: Vec<u32> },
    RevealTick { cycle: u64 },
    FortuneResolved { cycle: u64, outcome: FortuneOutcome },
}

impl Event {
    /// Cycle the event belongs to, for events produced by background work
    pub fn cycle(&self) -> Option<u64> {
        match self {
            Event::NumbersDrawn { cycle, .. }
            | Event::RevealTick { cycle }
            | Event::FortuneResolved { cycle, .. } => Some(*cycle),
            Event::Start | Event::Stop | Event::Reset | Event::CredentialAccepted => None,
        }
    }
}
