//! Per-session conversation state: course focus, preferences, message history.
//!
//! The core holds this in memory only. `to_json`/`from_json` expose a
//! snapshot so the host (web UI, tests) can persist sessions however it
//! chooses.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
    System,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::System => "system",
        }
    }
}

/// Result marker on an executed tool call.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum ToolOutcome {
    Ok(Value),
    Error(String),
}

/// One tool invocation attached to an assistant message. `result` is set
/// exactly once, when the registry has executed the call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCallRecord {
    pub id: String,
    pub name: String,
    pub parameters: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<ToolOutcome>,
}

impl ToolCallRecord {
    pub fn executed(name: &str, parameters: Value, result: ToolOutcome) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            parameters,
            result: Some(result),
        }
    }

    pub fn succeeded(&self) -> bool {
        matches!(self.result, Some(ToolOutcome::Ok(_)))
    }

    pub fn result_value(&self) -> Option<&Value> {
        match &self.result {
            Some(ToolOutcome::Ok(v)) => Some(v),
            _ => None,
        }
    }
}

/// A single conversation message. Immutable after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationMessage {
    pub id: String,
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCallRecord>,
}

impl ConversationMessage {
    pub fn new(role: Role, content: &str, tool_calls: Vec<ToolCallRecord>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role,
            content: content.to_string(),
            timestamp: Utc::now(),
            tool_calls,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserPreferences {
    pub language: String,
}

impl Default for UserPreferences {
    fn default() -> Self {
        Self {
            language: "fr".to_string(),
        }
    }
}

/// In-memory session: course focus (immutable for the session's lifetime),
/// preferences, append-only history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationContext {
    conversation_id: String,
    course_id: Option<String>,
    preferences: UserPreferences,
    history: Vec<ConversationMessage>,
}

#[derive(Debug)]
pub enum ContextError {
    Parse(String),
}

impl std::fmt::Display for ContextError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContextError::Parse(s) => write!(f, "context parse: {}", s),
        }
    }
}

impl std::error::Error for ContextError {}

impl ConversationContext {
    pub fn new(course_id: Option<String>) -> Self {
        Self {
            conversation_id: Uuid::new_v4().to_string(),
            course_id,
            preferences: UserPreferences::default(),
            history: Vec::new(),
        }
    }

    #[inline]
    pub fn conversation_id(&self) -> &str {
        &self.conversation_id
    }

    #[inline]
    pub fn course_id(&self) -> Option<&str> {
        self.course_id.as_deref()
    }

    #[inline]
    pub fn history(&self) -> &[ConversationMessage] {
        &self.history
    }

    #[inline]
    pub fn language(&self) -> &str {
        &self.preferences.language
    }

    pub fn set_language(&mut self, language: &str) {
        self.preferences.language = language.to_string();
    }

    /// Last `n` messages, oldest first.
    pub fn recent(&self, n: usize) -> &[ConversationMessage] {
        let start = self.history.len().saturating_sub(n);
        &self.history[start..]
    }

    pub fn push_user(&mut self, content: &str) {
        self.history
            .push(ConversationMessage::new(Role::User, content, Vec::new()));
    }

    pub fn push_assistant(&mut self, content: &str, tool_calls: Vec<ToolCallRecord>) {
        self.history
            .push(ConversationMessage::new(Role::Assistant, content, tool_calls));
    }

    /// Snapshot for host-side persistence.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).expect("context serializes")
    }

    pub fn from_json(json: &str) -> Result<Self, ContextError> {
        serde_json::from_str(json).map_err(|e| ContextError::Parse(e.to_string()))
    }
}
