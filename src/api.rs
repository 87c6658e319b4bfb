//! HTTP API for the chat service
//!
//! Thin session boundary around the turn loop: each route resolves a session
//! id to its conversation and hands it to the [`TurnResolver`].

mod handlers;
mod types;

pub use handlers::create_router;

use crate::conversation::SessionStore;
use crate::turn::TurnResolver;
use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<SessionStore>,
    pub resolver: Arc<TurnResolver>,
}

impl AppState {
    pub fn new(resolver: TurnResolver) -> Self {
        Self {
            sessions: Arc::new(SessionStore::new()),
            resolver: Arc::new(resolver),
        }
    }
}
