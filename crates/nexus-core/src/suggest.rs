//! Suggestion gateway
//!
//! Sends the current buffer to an external suggestion service and returns
//! its text reply. The reply is only shown to the user; applying it is a
//! separate, explicit step on the session.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

use crate::language::Language;

/// Default client-side timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// What the service is asked to do with the code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionKind {
    #[default]
    SuggestImprovements,
    ExplainCode,
    AddComments,
    OptimizePerformance,
    FixBugs,
}

impl SuggestionKind {
    pub const ALL: [SuggestionKind; 5] = [
        SuggestionKind::SuggestImprovements,
        SuggestionKind::ExplainCode,
        SuggestionKind::AddComments,
        SuggestionKind::OptimizePerformance,
        SuggestionKind::FixBugs,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SuggestionKind::SuggestImprovements => "suggest_improvements",
            SuggestionKind::ExplainCode => "explain_code",
            SuggestionKind::AddComments => "add_comments",
            SuggestionKind::OptimizePerformance => "optimize_performance",
            SuggestionKind::FixBugs => "fix_bugs",
        }
    }
}

impl fmt::Display for SuggestionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SuggestionKind {
    type Err = SuggestionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SuggestionKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| SuggestionError::UnknownKind(s.to_string()))
    }
}

/// Errors from the suggestion gateway
#[derive(Error, Debug)]
pub enum SuggestionError {
    #[error("Code is required")]
    EmptyCode,

    #[error("Unknown suggestion kind: {0}")]
    UnknownKind(String),

    #[error("Suggestion request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Suggestion service returned HTTP {status}{}", status_detail(.message))]
    Status { status: u16, message: Option<String> },

    #[error("Suggestion service error: {0}")]
    Service(String),

    #[error("Invalid response from suggestion service: {0}")]
    InvalidResponse(String),

    #[error("Suggestion request failed: {0}")]
    Request(#[from] reqwest::Error),
}

#[derive(Debug, Serialize)]
struct SuggestionRequest<'a> {
    code: &'a str,
    language: Language,
    request: SuggestionKind,
}

#[derive(Debug, Deserialize)]
struct SuggestionReply {
    suggestion: Option<String>,
    error: Option<String>,
}

/// HTTP client for the suggestion service
#[derive(Debug, Clone)]
pub struct SuggestionGateway {
    client: reqwest::Client,
    url: String,
    timeout: Duration,
}

impl SuggestionGateway {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, SuggestionError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("nexus/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            url: url.into(),
            timeout,
        })
    }

    /// Build a gateway from configuration, if a service URL is set
    pub fn from_config(config: &crate::Config) -> Result<Option<Self>, SuggestionError> {
        config
            .suggestion_url
            .as_ref()
            .map(|url| Self::new(url, Duration::from_secs(config.suggestion_timeout_secs)))
            .transpose()
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Ask the service for a suggestion on `code`
    pub async fn request(
        &self,
        code: &str,
        language: Language,
        kind: SuggestionKind,
    ) -> Result<String, SuggestionError> {
        if code.trim().is_empty() {
            return Err(SuggestionError::EmptyCode);
        }

        debug!(url = %self.url, %language, %kind, "requesting suggestion");
        let body = SuggestionRequest {
            code,
            language,
            request: kind,
        };

        let response = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| self.map_transport_error(e))?;
        let reply = serde_json::from_str::<SuggestionReply>(&text).ok();

        if !status.is_success() {
            let message = reply.and_then(|r| r.error);
            warn!(status = status.as_u16(), ?message, "suggestion service failed");
            return Err(SuggestionError::Status {
                status: status.as_u16(),
                message,
            });
        }

        match reply {
            Some(SuggestionReply {
                suggestion: Some(suggestion),
                ..
            }) => Ok(suggestion),
            Some(SuggestionReply {
                error: Some(error), ..
            }) => Err(SuggestionError::Service(error)),
            _ => Err(SuggestionError::InvalidResponse(truncate(&text, 200))),
        }
    }

    fn map_transport_error(&self, e: reqwest::Error) -> SuggestionError {
        if e.is_timeout() {
            SuggestionError::Timeout(self.timeout)
        } else {
            SuggestionError::Request(e)
        }
    }
}

fn status_detail(message: &Option<String>) -> String {
    match message {
        Some(m) => format!(": {}", m),
        None => String::new(),
    }
}

fn truncate(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
