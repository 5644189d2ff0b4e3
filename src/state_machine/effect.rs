//! Effects produced by state transitions

use std::time::Duration;

/// Effects to be executed after state transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Publish the new state to subscribers
    PublishState,

    /// Cancel timers and requests belonging to the previous cycle
    AbortPending,

    /// Choose the numbers for this cycle
    DrawNumbers { cycle: u64 },

    /// Wait, then reveal the next number
    ScheduleReveal { cycle: u64, delay: Duration },

    /// Ask for a fortune about the final numbers
    RequestFortune { cycle: u64, numbers: Vec<u32> },

    /// Forget the API key the last fortune request used
    RejectCredential,
}
