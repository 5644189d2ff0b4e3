//! Draw session state types

use crate::draw::{check_range, DrawError};
use crate::fortune::FORTUNE_LOADING_CAPTION;
use serde::Serialize;
use std::time::Duration;

// ============================================================================
// Draw Context - fixed configuration for a session
// ============================================================================

/// How many numbers are drawn, from which range, and how fast they appear
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrawContext {
    pub count: usize,
    pub range_min: u32,
    pub range_max: u32,
    /// Pause before each number is revealed
    pub reveal_interval: Duration,
}

impl Default for DrawContext {
    fn default() -> Self {
        Self {
            count: 6,
            range_min: 1,
            range_max: 45,
            reveal_interval: Duration::from_millis(800),
        }
    }
}

impl DrawContext {
    /// Reject configurations the drawer could never satisfy
    pub fn validate(&self) -> Result<(), DrawError> {
        check_range(self.count, self.range_min, self.range_max)
    }
}

// ============================================================================
// Draw Session
// ============================================================================

/// Session status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DrawStatus {
    /// Nothing in progress
    #[default]
    Idle,
    /// Machine spinning, numbers not chosen yet
    Spinning,
    /// Numbers chosen, being revealed one at a time
    Drawing,
    /// All numbers revealed; fortune may still be loading
    Finished,
}

/// Full session state, owned by the runtime
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DrawSession {
    /// Bumped on every start and reset. Work from an older cycle is discarded.
    pub cycle: u64,
    pub status: DrawStatus,
    /// Every number chosen at stop, in draw order. Not published until revealed.
    pub drawn: Vec<u32>,
    /// Prefix of `drawn` revealed so far
    pub revealed_numbers: Vec<u32>,
    pub final_numbers: Option<Vec<u32>>,
    pub fortune_text: Option<String>,
    pub fortune_loading: bool,
    /// Ask the user for a new API key
    pub credential_required: bool,
    /// A key was accepted while the fortune was loading
    pub credential_renewed: bool,
}

impl DrawSession {
    /// Fresh state for a new cycle. Only the credential prompt carries over.
    pub fn next_cycle(&self, status: DrawStatus) -> Self {
        Self {
            cycle: self.cycle + 1,
            status,
            credential_required: self.credential_required,
            ..Self::default()
        }
    }

    /// Published form of the session
    pub fn view(&self) -> SessionView {
        SessionView {
            cycle: self.cycle,
            status: self.status,
            revealed_numbers: self.revealed_numbers.clone(),
            revealed_balls: self
                .revealed_numbers
                .iter()
                .map(|&number| Ball {
                    number,
                    color: BallColor::for_number(number),
                })
                .collect(),
            final_numbers: self.final_numbers.clone(),
            fortune_text: self.fortune_text.clone(),
            fortune_loading: self.fortune_loading,
            fortune_caption: self.fortune_loading.then_some(FORTUNE_LOADING_CAPTION),
            credential_required: self.credential_required,
        }
    }
}

// ============================================================================
// Published view
// ============================================================================

/// Colour band of a ball
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BallColor {
    Yellow,
    Blue,
    Red,
    Gray,
    Green,
}

impl BallColor {
    pub fn for_number(number: u32) -> Self {
        match number {
            0..=10 => BallColor::Yellow,
            11..=20 => BallColor::Blue,
            21..=30 => BallColor::Red,
            31..=40 => BallColor::Gray,
            _ => BallColor::Green,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Ball {
    pub number: u32,
    pub color: BallColor,
}

/// What clients see. Unrevealed numbers are never included.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionView {
    pub cycle: u64,
    pub status: DrawStatus,
    pub revealed_numbers: Vec<u32>,
    pub revealed_balls: Vec<Ball>,
    pub final_numbers: Option<Vec<u32>>,
    pub fortune_text: Option<String>,
    pub fortune_loading: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fortune_caption: Option<&'static str>,
    pub credential_required: bool,
}
