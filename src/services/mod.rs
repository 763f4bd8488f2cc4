//! Services - business logic and orchestration
//!
//! This module contains the core business logic services:
//! - `relay` - visit logging and notification delivery with plain-text fallback

pub mod relay;

// Re-export commonly used types
pub use relay::{DeliveryOutcome, VisitRelay};
