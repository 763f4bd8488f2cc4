//! Notification sink interface
//!
//! A sink delivers one short text message to a chat. Failures carry an
//! explicit classification so the relay can decide on the plain-text fallback
//! without inspecting error strings.

use async_trait::async_trait;

/// How the sink should interpret the message text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkupMode {
    /// No markup; text is delivered verbatim
    Plain,
    /// Telegram MarkdownV2
    MarkdownV2,
}

impl MarkupMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            MarkupMode::Plain => "plain",
            MarkupMode::MarkdownV2 => "markdown_v2",
        }
    }
}

/// Failure classification without the description
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkErrorKind {
    Format,
    Auth,
    Network,
    RateLimited,
    Unknown,
}

impl SinkErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SinkErrorKind::Format => "format",
            SinkErrorKind::Auth => "auth",
            SinkErrorKind::Network => "network",
            SinkErrorKind::RateLimited => "rate_limited",
            SinkErrorKind::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for SinkErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failed send
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SinkError {
    /// The sink could not parse the message markup
    #[error("malformed markup: {0}")]
    Format(String),

    #[error("rejected credentials: {0}")]
    Auth(String),

    #[error("transport failure: {0}")]
    Network(String),

    #[error("rate limited: {0}")]
    RateLimited(String),

    #[error("{0}")]
    Unknown(String),
}

impl SinkError {
    pub fn kind(&self) -> SinkErrorKind {
        match self {
            SinkError::Format(_) => SinkErrorKind::Format,
            SinkError::Auth(_) => SinkErrorKind::Auth,
            SinkError::Network(_) => SinkErrorKind::Network,
            SinkError::RateLimited(_) => SinkErrorKind::RateLimited,
            SinkError::Unknown(_) => SinkErrorKind::Unknown,
        }
    }

    pub fn description(&self) -> &str {
        match self {
            SinkError::Format(d)
            | SinkError::Auth(d)
            | SinkError::Network(d)
            | SinkError::RateLimited(d)
            | SinkError::Unknown(d) => d,
        }
    }

    /// Only markup failures are worth a plain-text retry
    pub fn is_format(&self) -> bool {
        matches!(self, SinkError::Format(_))
    }

    /// Classify a Bot API error reply.
    ///
    /// A 400 counts as a formatting failure only when the description names
    /// entity parsing; other 400s (bad chat id, empty text) stay `Unknown`.
    pub fn from_api_error(error_code: u16, description: &str) -> Self {
        let description = description.to_string();
        match error_code {
            400 if description.to_ascii_lowercase().contains("can't parse entities") => {
                SinkError::Format(description)
            }
            401 | 403 | 404 => SinkError::Auth(description),
            429 => SinkError::RateLimited(description),
            _ => SinkError::Unknown(format!("{error_code}: {description}")),
        }
    }
}

/// Delivers messages to a chat
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn send(&self, chat_id: &str, message: &str, markup: MarkupMode) -> Result<(), SinkError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_is_format() {
        let err = SinkError::from_api_error(
            400,
            "Bad Request: can't parse entities: Character '.' is reserved and must be escaped with the preceding '\\'",
        );
        assert_eq!(err.kind(), SinkErrorKind::Format);
        assert!(err.is_format());
    }

    #[test]
    fn test_other_bad_requests_are_unknown() {
        let err = SinkError::from_api_error(400, "Bad Request: chat not found");
        assert_eq!(err.kind(), SinkErrorKind::Unknown);
        assert!(!err.is_format());
        assert_eq!(err.description(), "400: Bad Request: chat not found");
    }

    #[test]
    fn test_auth_and_rate_limit() {
        assert_eq!(SinkError::from_api_error(401, "Unauthorized").kind(), SinkErrorKind::Auth);
        assert_eq!(
            SinkError::from_api_error(403, "Forbidden: bot was blocked by the user").kind(),
            SinkErrorKind::Auth
        );
        assert_eq!(
            SinkError::from_api_error(429, "Too Many Requests: retry after 5").kind(),
            SinkErrorKind::RateLimited
        );
        assert_eq!(SinkError::from_api_error(502, "Bad Gateway").kind(), SinkErrorKind::Unknown);
    }
}
