//! Agent orchestrator: own one conversation, drive router → tools → composer.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::agent::composer::ResponseComposer;
use crate::agent::context::{ConversationContext, ToolCallRecord, ToolOutcome};
use crate::agent::router::{IntentRouter, RouteCtx};
use crate::tools::context::ToolCtx;
use crate::tools::registry::{ToolError, ToolRegistry};

pub mod composer;
pub mod context;
pub mod router;

const APOLOGY_CONFIDENCE: f32 = 0.1;
const APOLOGY_MESSAGE: &str =
    "Désolé, une erreur interne m'empêche de répondre pour le moment. Merci de réessayer.";

/// Output contract of one turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentResponse {
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCallRecord>,
    pub confidence: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

#[derive(Debug)]
pub struct AgentError(pub String);

impl std::fmt::Display for AgentError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "agent: {}", self.0)
    }
}

impl std::error::Error for AgentError {}

/// Per-conversation orchestrator. Dependencies are injected; nothing global.
pub struct Orchestrator {
    context: ConversationContext,
    registry: Arc<ToolRegistry>,
    router: IntentRouter,
    composer: ResponseComposer,
}

impl Orchestrator {
    pub fn new(
        context: ConversationContext,
        registry: Arc<ToolRegistry>,
        router: IntentRouter,
        composer: ResponseComposer,
    ) -> Self {
        Self {
            context,
            registry,
            router,
            composer,
        }
    }

    #[inline]
    pub fn context(&self) -> &ConversationContext {
        &self.context
    }

    #[inline]
    pub fn context_mut(&mut self) -> &mut ConversationContext {
        &mut self.context
    }

    /// Replace the conversation state (host restored a persisted snapshot).
    pub fn restore_context(&mut self, context: ConversationContext) {
        self.context = context;
    }

    /// Process one user turn. Never fails: any internal error degrades to a
    /// low-confidence apology.
    pub async fn process_message(&mut self, text: &str) -> AgentResponse {
        match self.run_turn(text).await {
            Ok(response) => response,
            Err(e) => {
                eprintln!("agent: turn failed: {e}");
                let response = AgentResponse {
                    message: APOLOGY_MESSAGE.to_string(),
                    tool_calls: Vec::new(),
                    confidence: APOLOGY_CONFIDENCE,
                    metadata: Some(serde_json::json!({ "degraded": true })),
                };
                self.context
                    .push_assistant(&response.message, Vec::new());
                response
            }
        }
    }

    /// One turn: append user message, route, execute tools in emitted order
    /// (failures isolated per call), compose, append assistant message.
    async fn run_turn(&mut self, text: &str) -> Result<AgentResponse, AgentError> {
        self.context.push_user(text);

        let intents = {
            let route_ctx = RouteCtx {
                course_id: self.context.course_id(),
            };
            self.router.route(text, &route_ctx)
        };

        let tool_ctx = ToolCtx {
            course_id: self.context.course_id().map(String::from),
            language: self.context.language().to_string(),
        };

        let mut calls: Vec<ToolCallRecord> = Vec::new();
        for intent in intents {
            match self.registry.invoke(&tool_ctx, intent.tool, &intent.params).await {
                Ok(value) => calls.push(ToolCallRecord::executed(
                    intent.tool,
                    intent.params,
                    ToolOutcome::Ok(value),
                )),
                // Unknown tool: zero-effect, logged, not recorded.
                Err(ToolError::Unknown(name)) => {
                    eprintln!("agent: unknown tool '{name}' requested, skipping");
                }
                Err(e) => calls.push(ToolCallRecord::executed(
                    intent.tool,
                    intent.params,
                    ToolOutcome::Error(e.to_string()),
                )),
            }
        }

        let response = self
            .composer
            .compose(text, self.context.course_id(), calls);
        self.context
            .push_assistant(&response.message, response.tool_calls.clone());
        Ok(response)
    }
}
