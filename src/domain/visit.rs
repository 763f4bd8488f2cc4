//! Visit record created for every inbound `/log-visit` request

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Generate a new UUIDv7 (time-sortable)
pub fn new_visit_id() -> String {
    Uuid::now_v7().to_string()
}

/// One notification-worthy page load.
///
/// Created at request time, consumed synchronously by the relay and never
/// persisted. `source_address` comes from the network layer and may be empty
/// or attacker-controlled; `raw_user_agent` is absent when the header was
/// missing or not valid UTF-8.
#[derive(Debug, Clone, PartialEq)]
pub struct VisitEvent {
    /// Correlates the visit log line with the asynchronous delivery log lines
    pub visit_id: String,
    pub timestamp: DateTime<Utc>,
    pub source_address: String,
    pub raw_user_agent: Option<String>,
}

impl VisitEvent {
    /// Record a visit happening now
    pub fn new(source_address: impl Into<String>, raw_user_agent: Option<String>) -> Self {
        Self::at(Utc::now(), source_address, raw_user_agent)
    }

    /// Record a visit at a fixed instant
    pub fn at(
        timestamp: DateTime<Utc>,
        source_address: impl Into<String>,
        raw_user_agent: Option<String>,
    ) -> Self {
        Self {
            visit_id: new_visit_id(),
            timestamp,
            source_address: source_address.into(),
            raw_user_agent,
        }
    }
}
