//! Remote agent service client: `chat(message, course_id, history) -> RemoteReply`.
//!
//! Single HTTP endpoint; bounded timeout; no streaming. A reply whose body
//! does not carry `success: true` is a failure, same as any transport error.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::agent::context::ConversationMessage;
use crate::config::Config;

/// Messages of history forwarded with each request.
const HISTORY_WINDOW: usize = 10;
const DEFAULT_TIMEOUT_SECS: u64 = 20;

#[derive(Debug)]
pub enum RemoteError {
    Config(String),
    Http(String),
    Parse(String),
    /// The service answered but reported failure in the body.
    Service(String),
}

impl std::fmt::Display for RemoteError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RemoteError::Config(s) => write!(f, "remote config: {}", s),
            RemoteError::Http(s) => write!(f, "remote http: {}", s),
            RemoteError::Parse(s) => write!(f, "remote parse: {}", s),
            RemoteError::Service(s) => write!(f, "remote service: {}", s),
        }
    }
}

impl std::error::Error for RemoteError {}

// --- Request/response (raw API shape for serde) ---

#[derive(Serialize)]
struct ChatRequest<'a> {
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    course_id: Option<&'a str>,
    conversation_history: Vec<HistoryEntry<'a>>,
}

#[derive(Serialize)]
struct HistoryEntry<'a> {
    role: &'static str,
    content: &'a str,
}

/// Body of a successful remote answer.
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteReply {
    pub success: bool,
    #[serde(default)]
    pub response: String,
    #[serde(default)]
    pub confidence: f32,
    #[serde(default)]
    pub tools_used: Vec<String>,
    #[serde(default)]
    pub error: Option<String>,
}

// --- Client ---

pub struct RemoteAgentClient {
    api_base: String,
    client: reqwest::Client,
}

impl RemoteAgentClient {
    /// Build client for `api_base` with the given request timeout.
    pub fn new(api_base: &str, timeout: Duration) -> Result<Self, RemoteError> {
        let api_base = api_base.trim_end_matches('/').to_string();
        if api_base.is_empty() {
            return Err(RemoteError::Config("remote.api-base is empty".into()));
        }
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RemoteError::Config(format!("reqwest client: {e}")))?;
        Ok(Self { api_base, client })
    }

    /// Build from config; `Ok(None)` when no remote service is configured.
    pub fn from_config(cfg: &Config) -> Result<Option<Self>, RemoteError> {
        let Some(remote) = cfg.remote.as_ref() else {
            return Ok(None);
        };
        let Some(api_base) = remote.api_base.as_deref().filter(|s| !s.trim().is_empty()) else {
            return Ok(None);
        };
        let timeout = Duration::from_secs(remote.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS));
        Self::new(api_base, timeout).map(Some)
    }

    /// Ask the remote agent. History is trimmed to its last entries.
    pub async fn chat(
        &self,
        message: &str,
        course_id: Option<&str>,
        history: &[ConversationMessage],
    ) -> Result<RemoteReply, RemoteError> {
        let url = format!("{}/chat", self.api_base);
        let start = history.len().saturating_sub(HISTORY_WINDOW);
        let body = ChatRequest {
            message,
            course_id,
            conversation_history: history[start..]
                .iter()
                .map(|m| HistoryEntry {
                    role: m.role.as_str(),
                    content: &m.content,
                })
                .collect(),
        };

        let res = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| RemoteError::Http(e.to_string()))?;

        let status = res.status();
        let text = res
            .text()
            .await
            .map_err(|e| RemoteError::Http(e.to_string()))?;
        if !status.is_success() {
            return Err(RemoteError::Http(format!("{} {}", status, text)));
        }

        let reply: RemoteReply =
            serde_json::from_str(&text).map_err(|e| RemoteError::Parse(e.to_string()))?;
        if !reply.success {
            return Err(RemoteError::Service(
                reply
                    .error
                    .unwrap_or_else(|| "remote agent reported failure".to_string()),
            ));
        }
        Ok(reply)
    }
}
