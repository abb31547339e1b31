use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, ResponseTemplate};

use formabot::agent::context::ConversationMessage;
use formabot::agent::{AgentError, AgentResponse};
use formabot::gateway::{ChatGateway, LocalAgent, ResponseSource};
use formabot::remote::RemoteAgentClient;
use formabot::tools::registry::BoxFuture;

mod common;
use common::{MockRemoteAgent, local_orchestrator};

fn client(endpoint: &str) -> RemoteAgentClient {
    RemoteAgentClient::new(endpoint, Duration::from_millis(500)).unwrap()
}

// --- Remote backend preferred when healthy ---

#[tokio::test]
async fn remote_success_is_used_directly() {
    let remote = MockRemoteAgent::new().await;
    remote
        .mock_chat(json!({
            "success": true,
            "response": "La formation AWS dure 4 jours.",
            "confidence": 0.93,
            "tools_used": ["get_course_info"]
        }))
        .await;

    let mut gateway = ChatGateway::new(
        Some(client(&remote.endpoint())),
        Box::new(local_orchestrator(Some("aws"))),
    );
    let reply = gateway.send("Quelle est la durée ?").await;

    assert!(reply.success);
    assert!(!reply.fallback);
    assert_eq!(reply.metadata.source, ResponseSource::Remote);
    assert_eq!(reply.response, "La formation AWS dure 4 jours.");
    assert_eq!(reply.confidence, 0.93);
    assert_eq!(reply.tool_calls.len(), 1);
    assert_eq!(reply.tool_calls[0].name, "get_course_info");
    assert!(reply.tool_calls[0].success);
    assert_eq!(reply.metadata.course_id.as_deref(), Some("aws"));
}

#[tokio::test]
async fn remote_request_carries_course_and_recent_history() {
    let remote = MockRemoteAgent::new().await;
    // Only answer when the request carries the course id AND the previous
    // turn in its history. The first send matches nothing (wiremock returns
    // 404) and is handled locally; that exchange must then show up in the
    // second request's conversation_history.
    Mock::given(method("POST"))
        .and(path("/chat"))
        .and(body_string_contains("\"course_id\":\"aws\""))
        .and(body_string_contains("toute première question"))
        .and(body_string_contains("la suite"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "response": "ok",
            "confidence": 0.9,
            "tools_used": []
        })))
        .mount(&remote.server)
        .await;

    let mut gateway = ChatGateway::new(
        Some(client(&remote.endpoint())),
        Box::new(local_orchestrator(Some("aws"))),
    );
    let first = gateway.send("toute première question").await;
    assert_eq!(first.metadata.source, ResponseSource::Local);
    let second = gateway.send("la suite").await;
    assert_eq!(second.metadata.source, ResponseSource::Remote);
}

// --- P3: fallback ordering ---

#[tokio::test]
async fn p3_remote_http_error_falls_back_to_local() {
    let remote = MockRemoteAgent::new().await;
    remote.mock_chat_status(500).await;

    let mut gateway = ChatGateway::new(
        Some(client(&remote.endpoint())),
        Box::new(local_orchestrator(None)),
    );
    let reply = gateway.send("bonjour").await;

    assert!(reply.success);
    assert!(!reply.fallback);
    assert_eq!(reply.metadata.source, ResponseSource::Local);
    assert!(reply.response.starts_with("Bonjour !"));
    assert_eq!(reply.confidence, 0.95);
}

#[tokio::test]
async fn p3_remote_timeout_falls_back_to_local() {
    let remote = MockRemoteAgent::new().await;
    Mock::given(method("POST"))
        .and(path("/chat"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({
                    "success": true,
                    "response": "trop tard",
                    "confidence": 0.9,
                    "tools_used": []
                }))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&remote.server)
        .await;

    let mut gateway = ChatGateway::new(
        Some(client(&remote.endpoint())),
        Box::new(local_orchestrator(Some("python"))),
    );
    let reply = gateway.send("Quel est le programme ?").await;

    assert_eq!(reply.metadata.source, ResponseSource::Local);
    assert!(reply.response.contains("Python pour l'Ingénierie de Données"));
}

#[tokio::test]
async fn p3_remote_body_failure_falls_back_to_local() {
    let remote = MockRemoteAgent::new().await;
    remote
        .mock_chat(json!({
            "success": false,
            "response": "",
            "confidence": 0.0,
            "tools_used": [],
            "error": "agent pool exhausted"
        }))
        .await;

    let mut gateway = ChatGateway::new(
        Some(client(&remote.endpoint())),
        Box::new(local_orchestrator(None)),
    );
    let reply = gateway.send("bonjour").await;
    assert_eq!(reply.metadata.source, ResponseSource::Local);
}

#[tokio::test]
async fn p3_remote_malformed_body_falls_back_to_local() {
    let remote = MockRemoteAgent::new().await;
    Mock::given(method("POST"))
        .and(path("/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_string("pas du json"))
        .mount(&remote.server)
        .await;

    let mut gateway = ChatGateway::new(
        Some(client(&remote.endpoint())),
        Box::new(local_orchestrator(None)),
    );
    let reply = gateway.send("bonjour").await;
    assert_eq!(reply.metadata.source, ResponseSource::Local);
}

/// Local backend double whose every turn fails.
struct FailingAgent;

impl LocalAgent for FailingAgent {
    fn respond<'a>(
        &'a mut self,
        _message: &'a str,
    ) -> BoxFuture<'a, Result<AgentResponse, AgentError>> {
        Box::pin(async { Err(AgentError("session poisoned".into())) })
    }
    fn course_id(&self) -> Option<String> {
        None
    }
    fn history(&self) -> &[ConversationMessage] {
        &[]
    }
    fn note_remote_exchange(&mut self, _user: &str, _assistant: &str) {}
}

#[tokio::test]
async fn p3_both_backends_down_returns_static_fallback() {
    let remote = MockRemoteAgent::new().await;
    remote.mock_chat_status(503).await;

    let mut gateway = ChatGateway::new(
        Some(client(&remote.endpoint())),
        Box::new(FailingAgent),
    );
    let reply = gateway.send("bonjour").await;

    assert!(reply.fallback);
    assert!(!reply.success);
    assert!(reply.confidence <= 0.3);
    assert_eq!(reply.metadata.source, ResponseSource::Static);
    assert!(reply.tool_calls.is_empty());
    assert!(!reply.response.is_empty());
}

// --- Remote turns are replayed into local history ---

/// Local double that records what the gateway notes into it.
struct RecordingAgent {
    notes: Arc<Mutex<Vec<(String, String)>>>,
}

impl LocalAgent for RecordingAgent {
    fn respond<'a>(
        &'a mut self,
        _message: &'a str,
    ) -> BoxFuture<'a, Result<AgentResponse, AgentError>> {
        Box::pin(async {
            Ok(AgentResponse {
                message: "réponse locale".to_string(),
                tool_calls: Vec::new(),
                confidence: 0.7,
                metadata: None,
            })
        })
    }
    fn course_id(&self) -> Option<String> {
        None
    }
    fn history(&self) -> &[ConversationMessage] {
        &[]
    }
    fn note_remote_exchange(&mut self, user: &str, assistant: &str) {
        self.notes
            .lock()
            .unwrap()
            .push((user.to_string(), assistant.to_string()));
    }
}

#[tokio::test]
async fn remote_exchange_is_noted_into_local_context() {
    let remote = MockRemoteAgent::new().await;
    remote
        .mock_chat(json!({
            "success": true,
            "response": "réponse distante",
            "confidence": 0.9,
            "tools_used": []
        }))
        .await;

    let notes = Arc::new(Mutex::new(Vec::new()));
    let mut gateway = ChatGateway::new(
        Some(client(&remote.endpoint())),
        Box::new(RecordingAgent {
            notes: Arc::clone(&notes),
        }),
    );
    gateway.send("bonjour").await;

    let recorded = notes.lock().unwrap();
    assert_eq!(recorded.len(), 1);
    assert_eq!(recorded[0], ("bonjour".to_string(), "réponse distante".to_string()));
}

#[tokio::test]
async fn no_remote_configured_goes_straight_to_local() {
    let mut gateway = ChatGateway::new(None, Box::new(local_orchestrator(None)));
    let reply = gateway.send("bonjour").await;
    assert_eq!(reply.metadata.source, ResponseSource::Local);
    assert!(!reply.fallback);
}
