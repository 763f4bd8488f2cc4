//! Visit relay - logs visits and forwards them to the notification sink
//!
//! Per visit:
//! 1. Enrich the user agent and log the visit (always; this is the only
//!    durable record of it)
//! 2. Without a configured sink, stop there
//! 3. Otherwise spawn delivery: send the MarkdownV2 message, and if the sink
//!    reports a markup failure, send the plain variant once
//!
//! Delivery runs on its own task so the HTTP response never waits on the
//! sink. Nothing in delivery can fail the caller.


use crate::domain::device::{enrich, DeviceInfo};
use crate::domain::message::NotificationMessage;
use crate::domain::visit::VisitEvent;
use crate::infra::config::Config;
use crate::io::sink::{MarkupMode, NotificationSink, SinkError, SinkErrorKind};
use crate::io::telegram::TelegramSink;
use chrono::FixedOffset;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// Final state of one visit's delivery
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// Rich message accepted
    Sent,
    /// Rich message rejected for markup, plain fallback accepted
    SentPlain,
    /// Rich message failed for a non-markup reason; not retried
    Failed(SinkErrorKind),
    /// Both the rich message and the plain fallback failed
    FallbackFailed(SinkErrorKind),
}

impl DeliveryOutcome {
    pub fn delivered(&self) -> bool {
        matches!(self, DeliveryOutcome::Sent | DeliveryOutcome::SentPlain)
    }
}

/// Sink plus the chat it delivers to
#[derive(Clone)]
struct NotifyTarget {
    sink: Arc<dyn NotificationSink>,
    chat_id: Arc<str>,
}

/// Cold-path log for a sink that could not be built
#[cold]
fn log_sink_init_failed(e: &dyn std::error::Error) {
    error!(error = %e, "notify_sink_init_failed");
}

#[cold]
fn log_send_failed(visit_id: &str, e: &SinkError) {
    error!(
        visit_id = %visit_id,
        kind = %e.kind(),
        description = %e.description(),
        "notify_failed"
    );
}

#[cold]
fn log_fallback_failed(visit_id: &str, e: &SinkError) {
    error!(
        visit_id = %visit_id,
        kind = %e.kind(),
        description = %e.description(),
        "notify_fallback_failed"
    );
}

/// Visit relay service. Cheap to clone; shares the sink.
#[derive(Clone)]
pub struct VisitRelay {
    target: Option<NotifyTarget>,
    utc_offset: FixedOffset,
}

impl VisitRelay {
    /// Relay with an explicit sink (or none)
    pub fn new(
        sink: Option<Arc<dyn NotificationSink>>,
        chat_id: &str,
        utc_offset: FixedOffset,
    ) -> Self {
        let target = sink.map(|sink| NotifyTarget { sink, chat_id: Arc::from(chat_id) });
        Self { target, utc_offset }
    }

    /// Log-only relay
    pub fn disabled(utc_offset: FixedOffset) -> Self {
        Self { target: None, utc_offset }
    }

    /// Build the Telegram-backed relay from configuration.
    ///
    /// Missing credentials or a sink that fails to initialise both degrade to
    /// a log-only relay; neither is fatal.
    pub fn from_config(config: &Config) -> Self {
        let Some((token, chat_id)) = config.telegram_credentials() else {
            info!("notify_disabled_missing_credentials");
            return Self::disabled(config.utc_offset());
        };

        let timeout = Duration::from_millis(config.telegram_timeout_ms());
        match TelegramSink::new(token, config.telegram_api_base(), timeout) {
            Ok(sink) => {
                info!(api_base = %config.telegram_api_base(), chat_id = %chat_id, "notify_sink_ready");
                Self::new(Some(Arc::new(sink)), chat_id, config.utc_offset())
            }
            Err(e) => {
                log_sink_init_failed(&e);
                Self::disabled(config.utc_offset())
            }
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.target.is_some()
    }

    /// Log the visit and, when a sink is configured, spawn its delivery.
    ///
    /// Returns the delivery task so tests can await it; request handlers drop
    /// it. Must be called from within a tokio runtime when a sink is set.
    pub fn handle_visit(&self, event: VisitEvent) -> Option<JoinHandle<DeliveryOutcome>> {
        let device = enrich(event.raw_user_agent.as_deref());
        self.log_visit(&event, &device);

        let target = self.target.clone()?;
        let message = NotificationMessage::build(&event, &device, self.utc_offset);
        let visit_id = event.visit_id;

        Some(tokio::spawn(async move { Self::deliver(&target, &visit_id, &message).await }))
    }

    fn log_visit(&self, event: &VisitEvent, device: &DeviceInfo) {
        let notify = if self.is_enabled() { "enabled" } else { "disabled" };
        info!(
            visit_id = %event.visit_id,
            ip = %event.source_address,
            time = %event.timestamp.with_timezone(&self.utc_offset).to_rfc3339(),
            browser = %device.browser(),
            os = %device.os(),
            device = %device.device(),
            notify = %notify,
            "visit_logged"
        );
    }

    /// Primary send, then at most one plain fallback after a markup failure.
    /// The fallback starts only after the primary's failure is observed.
    async fn deliver(
        target: &NotifyTarget,
        visit_id: &str,
        message: &NotificationMessage,
    ) -> DeliveryOutcome {
        let primary = target.sink.send(&target.chat_id, &message.rich, MarkupMode::MarkdownV2).await;

        let primary_err = match primary {
            Ok(()) => {
                info!(visit_id = %visit_id, markup = %MarkupMode::MarkdownV2.as_str(), "notify_sent");
                return DeliveryOutcome::Sent;
            }
            Err(e) if e.is_format() => e,
            Err(e) => {
                log_send_failed(visit_id, &e);
                return DeliveryOutcome::Failed(e.kind());
            }
        };

        warn!(
            visit_id = %visit_id,
            description = %primary_err.description(),
            "notify_markup_rejected_retrying_plain"
        );

        match target.sink.send(&target.chat_id, &message.plain, MarkupMode::Plain).await {
            Ok(()) => {
                info!(visit_id = %visit_id, markup = %MarkupMode::Plain.as_str(), "notify_fallback_sent");
                DeliveryOutcome::SentPlain
            }
            Err(e) => {
                log_fallback_failed(visit_id, &e);
                DeliveryOutcome::FallbackFailed(e.kind())
            }
        }
    }
}
