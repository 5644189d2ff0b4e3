//! Trait abstractions for runtime I/O
//!
//! These traits enable testing the executor with mock implementations.

use crate::credential::Credential;
use crate::draw::{self, DrawError};
use crate::fortune::{FortuneClient, FortuneOutcome};
use async_trait::async_trait;
use std::sync::Arc;

/// Source of unique numbers
pub trait NumberDrawer: Send + Sync {
    /// Draw `count` distinct numbers from `[min, max]`, in draw order
    fn draw(&self, count: usize, min: u32, max: u32) -> Result<Vec<u32>, DrawError>;
}

/// Client for fortune requests
#[async_trait]
pub trait FortuneTeller: Send + Sync {
    /// Always resolves; failures are folded into the outcome
    async fn request_fortune(
        &self,
        numbers: &[u32],
        credential: Option<&Credential>,
    ) -> FortuneOutcome;
}

// ============================================================================
// Arc implementations for trait objects
// ============================================================================

impl<T: NumberDrawer + ?Sized> NumberDrawer for Arc<T> {
    fn draw(&self, count: usize, min: u32, max: u32) -> Result<Vec<u32>, DrawError> {
        (**self).draw(count, min, max)
    }
}

#[async_trait]
impl<T: FortuneTeller + ?Sized> FortuneTeller for Arc<T> {
    async fn request_fortune(
        &self,
        numbers: &[u32],
        credential: Option<&Credential>,
    ) -> FortuneOutcome {
        (**self).request_fortune(numbers, credential).await
    }
}

// ============================================================================
// Production Adapters
// ============================================================================

/// Draws with the thread-local generator
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadRngDrawer;

impl NumberDrawer for ThreadRngDrawer {
    fn draw(&self, count: usize, min: u32, max: u32) -> Result<Vec<u32>, DrawError> {
        draw::draw(&mut rand::thread_rng(), count, min, max)
    }
}

#[async_trait]
impl FortuneTeller for FortuneClient {
    async fn request_fortune(
        &self,
        numbers: &[u32],
        credential: Option<&Credential>,
    ) -> FortuneOutcome {
        FortuneClient::request_fortune(self, numbers, credential).await
    }
}
