//! IO modules - external system interfaces
//!
//! This module contains all external IO operations:
//! - `http` - HTTP endpoint (liveness, visit logging, static files)
//! - `sink` - Notification sink trait and failure taxonomy
//! - `telegram` - Telegram Bot API implementation of the sink

pub mod http;
pub mod sink;
pub mod telegram;

// Re-export commonly used types
pub use http::{start_http_server, AppContext};
pub use sink::{MarkupMode, NotificationSink, SinkError, SinkErrorKind};
pub use telegram::{SinkInitError, TelegramSink};
