//! HTTP API for the draw session

mod handlers;
mod sse;
mod types;

pub use handlers::create_router;

use crate::runtime::SessionHandle;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub session: SessionHandle,
}

impl AppState {
    pub fn new(session: SessionHandle) -> Self {
        Self { session }
    }
}
