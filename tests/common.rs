use std::sync::Arc;

use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use formabot::agent::Orchestrator;
use formabot::agent::composer::ResponseComposer;
use formabot::agent::context::ConversationContext;
use formabot::agent::router::IntentRouter;
use formabot::catalog::CourseStore;
use formabot::catalog::db::{SqliteCatalog, demo_courses};
use formabot::config::{PrereqTuning, ScoringWeights};
use formabot::tools::registry::{ToolRegistry, build_default_registry};

/// In-memory catalog seeded with the demo fixture courses.
pub fn seeded_catalog() -> Arc<SqliteCatalog> {
    let cat = SqliteCatalog::open_in_memory().expect("open in-memory catalog");
    for course in demo_courses() {
        cat.upsert_course(&course).expect("seed course");
    }
    Arc::new(cat)
}

pub fn default_registry(store: Arc<dyn CourseStore>) -> Arc<ToolRegistry> {
    Arc::new(
        build_default_registry(store, ScoringWeights::default(), PrereqTuning::default())
            .expect("registry"),
    )
}

/// Orchestrator over the demo catalog, optionally scoped to a course.
pub fn local_orchestrator(course_id: Option<&str>) -> Orchestrator {
    let store: Arc<dyn CourseStore> = seeded_catalog();
    Orchestrator::new(
        ConversationContext::new(course_id.map(String::from)),
        default_registry(store),
        IntentRouter::new(),
        ResponseComposer::default(),
    )
}

pub struct MockRemoteAgent {
    pub server: MockServer,
}

impl MockRemoteAgent {
    pub async fn new() -> Self {
        let server = MockServer::start().await;
        Self { server }
    }

    pub fn endpoint(&self) -> String {
        self.server.uri()
    }

    /// Mount a mock for POST /chat that returns the given JSON body.
    pub async fn mock_chat(&self, response_body: serde_json::Value) {
        Mock::given(method("POST"))
            .and(path("/chat"))
            .respond_with(ResponseTemplate::new(200).set_body_json(response_body))
            .mount(&self.server)
            .await;
    }

    /// Mount a mock for POST /chat that fails with the given HTTP status.
    pub async fn mock_chat_status(&self, status: u16) {
        Mock::given(method("POST"))
            .and(path("/chat"))
            .respond_with(ResponseTemplate::new(status))
            .mount(&self.server)
            .await;
    }
}
