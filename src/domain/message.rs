//! Notification rendering
//!
//! Two renderings of the same visit: a Telegram MarkdownV2 message where every
//! interpolated value is escaped, and a plain-text fallback with no markup at
//! all. The plain variant is what gets sent when the sink rejects the rich one.

use crate::domain::device::DeviceInfo;
use crate::domain::visit::VisitEvent;
use chrono::{DateTime, FixedOffset, Utc};

/// Characters reserved by Telegram MarkdownV2
pub const MARKDOWN_V2_RESERVED: &[char] = &[
    '_', '*', '[', ']', '(', ')', '~', '`', '>', '#', '+', '-', '=', '|', '{', '}', '.', '!', '\\',
];

/// Prefix every reserved character with a backslash
pub fn escape_markdown_v2(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len() + text.len() / 4);
    for c in text.chars() {
        if MARKDOWN_V2_RESERVED.contains(&c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Visit time as shown to the site owner, e.g. `14.02.2025, 12:30:00`
pub fn format_timestamp(timestamp: DateTime<Utc>, offset: FixedOffset) -> String {
    timestamp.with_timezone(&offset).format("%d.%m.%Y, %H:%M:%S").to_string()
}

/// Field values shared by both renderings, unescaped
struct Fields {
    time: String,
    address: String,
    browser: String,
    os: String,
    device: String,
}

impl Fields {
    fn collect(visit: &VisitEvent, device: &DeviceInfo, offset: FixedOffset) -> Self {
        let address = if visit.source_address.trim().is_empty() {
            crate::domain::device::UNKNOWN_PLACEHOLDER.to_string()
        } else {
            visit.source_address.clone()
        };
        Self {
            time: format_timestamp(visit.timestamp, offset),
            address,
            browser: device.browser(),
            os: device.os(),
            device: device.device().to_string(),
        }
    }

    fn map(self, f: impl Fn(&str) -> String) -> Self {
        Self {
            time: f(&self.time),
            address: f(&self.address),
            browser: f(&self.browser),
            os: f(&self.os),
            device: f(&self.device),
        }
    }
}

/// Lines after the headline; identical layout for both renderings
fn body_lines(fields: &Fields) -> String {
    format!(
        "🕒 Время: {}\n🌐 IP: {}\n🧭 Браузер: {}\n💻 Система: {}\n📱 Устройство: {}",
        fields.time, fields.address, fields.browser, fields.os, fields.device
    )
}

/// MarkdownV2 message. The headline's literal `-` is escaped by hand.
pub fn format_rich(visit: &VisitEvent, device: &DeviceInfo, offset: FixedOffset) -> String {
    let fields = Fields::collect(visit, device, offset).map(escape_markdown_v2);
    format!("💖 *Кто\\-то только что зашёл на твой особенный сайт* ✨\n{}", body_lines(&fields))
}

/// Same information, no markup and no escaping
pub fn format_plain(visit: &VisitEvent, device: &DeviceInfo, offset: FixedOffset) -> String {
    let fields = Fields::collect(visit, device, offset);
    format!("💖 Кто-то только что зашёл на твой особенный сайт ✨\n{}", body_lines(&fields))
}

/// Both renderings of one visit, built together so they always agree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationMessage {
    pub rich: String,
    pub plain: String,
}

impl NotificationMessage {
    pub fn build(visit: &VisitEvent, device: &DeviceInfo, offset: FixedOffset) -> Self {
        Self { rich: format_rich(visit, device, offset), plain: format_plain(visit, device, offset) }
    }
}
