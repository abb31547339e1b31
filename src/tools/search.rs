//! `search_courses` tool: keyword search over the catalog with a weighted
//! relevance score per hit.
//!
//! The tool scores but does not order: hits come back in store order and the
//! Response Composer sorts descending and keeps the top results.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::catalog::{CourseDetails, CourseStore};
use crate::config::ScoringWeights;
use crate::tools::context::ToolCtx;
use crate::tools::registry::{BoxFuture, Tool, ToolError, execution_error, parse_params};

#[derive(Debug, Deserialize)]
struct Params {
    query: String,
}

/// One scored search result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    pub id: String,
    pub label: String,
    pub level: String,
    pub description: String,
    pub score: i32,
    pub matched_skills: Vec<String>,
}

/// Relevance of `course` for `needle_lower`: label hit weighs most, then
/// description, then each matching skill, then each matching module.
pub fn relevance(
    course: &CourseDetails,
    needle_lower: &str,
    weights: &ScoringWeights,
) -> (i32, Vec<String>) {
    let mut score = 0;

    if course.label.to_lowercase().contains(needle_lower) {
        score += weights.label;
    }
    if course.description.to_lowercase().contains(needle_lower) {
        score += weights.description;
    }

    let matched_skills: Vec<String> = course
        .skills
        .iter()
        .filter(|s| s.to_lowercase().contains(needle_lower))
        .cloned()
        .collect();
    score += weights.skill * matched_skills.len() as i32;

    let module_hits = course
        .modules
        .iter()
        .filter(|m| {
            m.title.to_lowercase().contains(needle_lower)
                || m.description.to_lowercase().contains(needle_lower)
        })
        .count();
    score += weights.module * module_hits as i32;

    (score, matched_skills)
}

pub struct SearchCourses {
    store: Arc<dyn CourseStore>,
    weights: ScoringWeights,
}

impl SearchCourses {
    pub fn new(store: Arc<dyn CourseStore>, weights: ScoringWeights) -> Self {
        Self { store, weights }
    }
}

impl Tool for SearchCourses {
    fn name(&self) -> &str {
        "search_courses"
    }

    fn description(&self) -> &str {
        "Recherche les formations correspondant à un mot-clé (technologie, \
         thème) et note la pertinence de chaque résultat."
    }

    fn parameters(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "Mot-clé recherché, ex: \"python\", \"docker\"."
                }
            },
            "required": ["query"]
        })
    }

    fn execute<'a>(
        &'a self,
        _ctx: &'a ToolCtx,
        args: &'a Value,
    ) -> BoxFuture<'a, Result<Value, ToolError>> {
        let store = Arc::clone(&self.store);
        let weights = self.weights;

        Box::pin(async move {
            let params: Params = parse_params(args)?;
            let query = params.query.trim().to_lowercase();
            if query.is_empty() {
                return Err(ToolError::InvalidParameters(
                    "'query' must not be empty".to_string(),
                ));
            }

            let needle = query.clone();
            let result =
                tokio::task::spawn_blocking(move || store.courses_matching(&needle)).await;

            let courses = match result {
                Ok(Ok(courses)) => courses,
                Ok(Err(e)) => return Err(execution_error("search_courses", e)),
                Err(e) => {
                    return Err(execution_error("search_courses", format!("task error: {e}")));
                }
            };

            let hits: Vec<SearchHit> = courses
                .iter()
                .map(|course| {
                    let (score, matched_skills) = relevance(course, &query, &weights);
                    SearchHit {
                        id: course.id.clone(),
                        label: course.label.clone(),
                        level: course.level.clone(),
                        description: course.description.clone(),
                        score,
                        matched_skills,
                    }
                })
                .collect();

            serde_json::to_value(&hits).map_err(|e| execution_error("search_courses", e))
        })
    }
}
