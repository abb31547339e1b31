//! formabot — chat assistant for a training-course catalog.
//!
//! Single binary: line-oriented REPL over the fallback gateway. Config:
//! `./formabot.toml` or `$FORMABOT_CONFIG`. Optional argument: the course id
//! the conversation is scoped to (e.g. `formabot aws`).

use std::path::PathBuf;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};

use formabot::agent::composer::ResponseComposer;
use formabot::agent::context::ConversationContext;
use formabot::agent::router::IntentRouter;
use formabot::agent::Orchestrator;
use formabot::catalog::CourseStore;
use formabot::catalog::db::{SqliteCatalog, demo_courses};
use formabot::config;
use formabot::config::{PrereqTuning, ScoringWeights};
use formabot::gateway::ChatGateway;
use formabot::remote::RemoteAgentClient;
use formabot::tools::registry::build_default_registry;

const DEFAULT_DB_PATH: &str = "formabot.db";

#[tokio::main]
async fn main() {
    eprintln!("formabot {}", env!("CARGO_PKG_VERSION"));
    let path = config::default_config_path();
    let cfg = match config::load(&path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {}", e);
            std::process::exit(1);
        }
    };

    let db_path = cfg
        .catalog
        .as_ref()
        .and_then(|c| c.db_path.as_deref())
        .unwrap_or(DEFAULT_DB_PATH);
    let catalog = match SqliteCatalog::open(&PathBuf::from(db_path)) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("catalog: {}", e);
            std::process::exit(1);
        }
    };
    match catalog.course_count() {
        Ok(0) => {
            for course in demo_courses() {
                if let Err(e) = catalog.upsert_course(&course) {
                    eprintln!("catalog seed: {}", e);
                    std::process::exit(1);
                }
            }
            eprintln!("catalog: seeded demo courses");
        }
        Ok(n) => eprintln!("catalog: {} course(s)", n),
        Err(e) => {
            eprintln!("catalog: {}", e);
            std::process::exit(1);
        }
    }

    let store: Arc<dyn CourseStore> = Arc::new(catalog);
    let registry = match build_default_registry(
        Arc::clone(&store),
        ScoringWeights::from_config(&cfg),
        PrereqTuning::from_config(&cfg),
    ) {
        Ok(r) => Arc::new(r),
        Err(e) => {
            eprintln!("registry: {}", e);
            std::process::exit(1);
        }
    };

    let course_id = std::env::args().nth(1);
    if let Some(id) = &course_id {
        eprintln!("conversation scoped to course '{}'", id);
    }
    let mut context = ConversationContext::new(course_id);
    if let Some(lang) = cfg.language.as_deref() {
        context.set_language(lang);
    }

    let weights = ScoringWeights::from_config(&cfg);
    let orchestrator = Orchestrator::new(
        context,
        registry,
        IntentRouter::new(),
        ResponseComposer::new(weights.max_results),
    );

    let remote = match RemoteAgentClient::from_config(&cfg) {
        Ok(r) => {
            if r.is_some() {
                eprintln!("remote agent service configured");
            }
            r
        }
        Err(e) => {
            eprintln!("remote: {} (running local-only)", e);
            None
        }
    };

    let mut gateway = ChatGateway::new(remote, Box::new(orchestrator));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                let message = line.trim();
                if message.is_empty() {
                    continue;
                }
                let reply = gateway.send(message).await;
                println!(
                    "{}\n[{} | confiance {:.2}]",
                    reply.response,
                    reply.metadata.source.as_str(),
                    reply.confidence
                );
            }
            Ok(None) => break,
            Err(e) => {
                eprintln!("stdin: {}", e);
                break;
            }
        }
    }
}
