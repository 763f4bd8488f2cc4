//! Telegram Bot API transport
//!
//! Sends `sendMessage` requests and maps the API's `{ok, error_code,
//! description}` replies onto `SinkError`. The bot token is part of the
//! request URL, so transport errors are stripped of their URL before they are
//! turned into descriptions.

use crate::io::sink::{MarkupMode, NotificationSink, SinkError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Bad credentials or client setup; the sink is treated as absent
#[derive(Debug, thiserror::Error)]
pub enum SinkInitError {
    #[error("bot token is not of the form <bot id>:<secret>")]
    InvalidToken,

    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),
}

/// `<digits>:<[A-Za-z0-9_-]+>`
fn is_valid_token(token: &str) -> bool {
    let Some((bot_id, secret)) = token.split_once(':') else {
        return false;
    };
    !bot_id.is_empty()
        && bot_id.bytes().all(|b| b.is_ascii_digit())
        && !secret.is_empty()
        && secret.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
}

#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    chat_id: &'a str,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    parse_mode: Option<&'static str>,
    disable_web_page_preview: bool,
}

#[derive(Debug, Deserialize)]
struct ApiReply {
    ok: bool,
    #[serde(default)]
    error_code: Option<u16>,
    #[serde(default)]
    description: Option<String>,
}

pub struct TelegramSink {
    client: reqwest::Client,
    send_url: String,
}

impl std::fmt::Debug for TelegramSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // send_url embeds the token
        f.debug_struct("TelegramSink").finish_non_exhaustive()
    }
}

impl TelegramSink {
    pub fn new(token: &str, api_base: &str, timeout: Duration) -> Result<Self, SinkInitError> {
        if !is_valid_token(token) {
            return Err(SinkInitError::InvalidToken);
        }

        // Create HTTP client once for reuse (connection pooling)
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            send_url: format!("{}/bot{}/sendMessage", api_base.trim_end_matches('/'), token),
        })
    }

    fn parse_mode(markup: MarkupMode) -> Option<&'static str> {
        match markup {
            MarkupMode::Plain => None,
            MarkupMode::MarkdownV2 => Some("MarkdownV2"),
        }
    }
}

#[async_trait]
impl NotificationSink for TelegramSink {
    async fn send(&self, chat_id: &str, message: &str, markup: MarkupMode) -> Result<(), SinkError> {
        let body = SendMessageRequest {
            chat_id,
            text: message,
            parse_mode: Self::parse_mode(markup),
            disable_web_page_preview: true,
        };

        let response = self
            .client
            .post(&self.send_url)
            .json(&body)
            .send()
            .await
            .map_err(|e| SinkError::Network(e.without_url().to_string()))?;

        let status = response.status();
        debug!(status = %status.as_u16(), markup = %markup.as_str(), "telegram_reply");

        let reply: ApiReply = match response.json().await {
            Ok(reply) => reply,
            Err(e) if status.is_success() => {
                return Err(SinkError::Unknown(format!(
                    "unreadable reply: {}",
                    e.without_url()
                )));
            }
            Err(_) => {
                return Err(SinkError::from_api_error(
                    status.as_u16(),
                    status.canonical_reason().unwrap_or("no description"),
                ));
            }
        };

        if reply.ok {
            return Ok(());
        }

        Err(SinkError::from_api_error(
            reply.error_code.unwrap_or_else(|| status.as_u16()),
            reply.description.as_deref().unwrap_or(""),
        ))
    }
}
