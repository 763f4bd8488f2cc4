//! Domain models - visit records and their derived views
//!
//! This module contains the pure, side-effect-free parts of the relay:
//! - `visit` - the per-request `VisitEvent` record
//! - `device` - user-agent enrichment into `DeviceInfo`
//! - `message` - rich (MarkdownV2) and plain notification rendering

pub mod device;
pub mod message;
pub mod visit;

// Re-export commonly used types at module level
pub use device::{enrich, DeviceInfo, UNKNOWN_PLACEHOLDER};
pub use message::{escape_markdown_v2, format_plain, format_rich, NotificationMessage};
pub use visit::VisitEvent;
