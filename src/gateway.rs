//! Multi-backend fallback gateway: remote agent service → local orchestrator
//! → static apology. Nothing raises to the caller; every failed backend is
//! logged and the next one tried.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::agent::context::ConversationMessage;
use crate::agent::{AgentError, AgentResponse, Orchestrator};
use crate::remote::RemoteAgentClient;
use crate::tools::registry::BoxFuture;

const STATIC_FALLBACK_CONFIDENCE: f32 = 0.2;
const STATIC_FALLBACK_MESSAGE: &str =
    "Je rencontre un problème technique. Merci de réessayer dans quelques instants \
     ou de contacter directement notre équipe.";

/// Which backend produced the reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ResponseSource {
    #[serde(rename = "remote-agent")]
    Remote,
    #[serde(rename = "local-agent")]
    Local,
    #[serde(rename = "static-fallback")]
    Static,
}

impl ResponseSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseSource::Remote => "remote-agent",
            ResponseSource::Local => "local-agent",
            ResponseSource::Static => "static-fallback",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ToolCallSummary {
    pub name: String,
    pub success: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReplyMetadata {
    pub course_id: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub source: ResponseSource,
}

/// Outbound contract to the UI.
#[derive(Debug, Clone, Serialize)]
pub struct GatewayReply {
    pub success: bool,
    pub response: String,
    pub confidence: f32,
    pub tool_calls: Vec<ToolCallSummary>,
    pub fallback: bool,
    pub metadata: ReplyMetadata,
}

/// Local backend seam. `Orchestrator` is the production implementation;
/// tests substitute failing doubles to drive the static fallback.
pub trait LocalAgent: Send {
    fn respond<'a>(&'a mut self, message: &'a str)
    -> BoxFuture<'a, Result<AgentResponse, AgentError>>;
    fn course_id(&self) -> Option<String>;
    fn history(&self) -> &[ConversationMessage];
    /// Record a turn answered by the remote backend so a later local
    /// fallback keeps the conversation thread.
    fn note_remote_exchange(&mut self, user: &str, assistant: &str);
}

impl LocalAgent for Orchestrator {
    fn respond<'a>(
        &'a mut self,
        message: &'a str,
    ) -> BoxFuture<'a, Result<AgentResponse, AgentError>> {
        Box::pin(async move { Ok(self.process_message(message).await) })
    }

    fn course_id(&self) -> Option<String> {
        self.context().course_id().map(String::from)
    }

    fn history(&self) -> &[ConversationMessage] {
        self.context().history()
    }

    fn note_remote_exchange(&mut self, user: &str, assistant: &str) {
        // Mirrors what a locally-processed turn would have appended.
        let context = self.context_mut();
        context.push_user(user);
        context.push_assistant(assistant, Vec::new());
    }
}

/// Entry point the UI talks to.
pub struct ChatGateway {
    remote: Option<RemoteAgentClient>,
    local: Box<dyn LocalAgent>,
}

impl ChatGateway {
    pub fn new(remote: Option<RemoteAgentClient>, local: Box<dyn LocalAgent>) -> Self {
        Self { remote, local }
    }

    /// Answer one user message, trying each backend in order.
    pub async fn send(&mut self, message: &str) -> GatewayReply {
        let course_id = self.local.course_id();

        if let Some(remote) = &self.remote {
            match remote
                .chat(message, course_id.as_deref(), self.local.history())
                .await
            {
                Ok(reply) => {
                    self.local.note_remote_exchange(message, &reply.response);
                    return GatewayReply {
                        success: true,
                        response: reply.response,
                        confidence: reply.confidence,
                        tool_calls: reply
                            .tools_used
                            .into_iter()
                            .map(|name| ToolCallSummary {
                                name,
                                success: true,
                            })
                            .collect(),
                        fallback: false,
                        metadata: ReplyMetadata {
                            course_id,
                            timestamp: Utc::now(),
                            source: ResponseSource::Remote,
                        },
                    };
                }
                Err(e) => eprintln!("gateway: remote agent unavailable: {e}"),
            }
        }

        match self.local.respond(message).await {
            Ok(response) => GatewayReply {
                success: true,
                response: response.message,
                confidence: response.confidence,
                tool_calls: response
                    .tool_calls
                    .iter()
                    .map(|c| ToolCallSummary {
                        name: c.name.clone(),
                        success: c.succeeded(),
                    })
                    .collect(),
                fallback: false,
                metadata: ReplyMetadata {
                    course_id,
                    timestamp: Utc::now(),
                    source: ResponseSource::Local,
                },
            },
            Err(e) => {
                eprintln!("gateway: local agent failed: {e}");
                GatewayReply {
                    success: false,
                    response: STATIC_FALLBACK_MESSAGE.to_string(),
                    confidence: STATIC_FALLBACK_CONFIDENCE,
                    tool_calls: Vec::new(),
                    fallback: true,
                    metadata: ReplyMetadata {
                        course_id,
                        timestamp: Utc::now(),
                        source: ResponseSource::Static,
                    },
                }
            }
        }
    }
}
