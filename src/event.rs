// src/event.rs
use chrono::{DateTime, Utc};

#[derive(Debug, Clone)]
pub enum PlayerEvent {
    /// Emitted after every player operation. Carries no state: receivers pull the
    /// latest snapshot from the store.
    Changed {
        operation: &'static str,
        timestamp: DateTime<Utc>,
    },
}
