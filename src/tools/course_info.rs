//! `get_course_info` tool: full record for one course (programme, instructors,
//! skills, certifications, testimonials).

use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;

use crate::catalog::CourseStore;
use crate::tools::context::ToolCtx;
use crate::tools::registry::{BoxFuture, Tool, ToolError, execution_error, parse_params};

#[derive(Debug, Deserialize)]
struct Params {
    #[serde(default)]
    course_id: Option<String>,
}

pub struct GetCourseInfo {
    store: Arc<dyn CourseStore>,
}

impl GetCourseInfo {
    pub fn new(store: Arc<dyn CourseStore>) -> Self {
        Self { store }
    }
}

impl Tool for GetCourseInfo {
    fn name(&self) -> &str {
        "get_course_info"
    }

    fn description(&self) -> &str {
        "Retourne la fiche complète d'une formation: programme, formateurs, \
         compétences visées, certifications et témoignages."
    }

    fn parameters(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "course_id": {
                    "type": "string",
                    "description": "Identifiant de la formation (ex: \"aws\"). \
                        Par défaut, la formation en cours de discussion."
                }
            },
            "required": []
        })
    }

    fn execute<'a>(
        &'a self,
        ctx: &'a ToolCtx,
        args: &'a Value,
    ) -> BoxFuture<'a, Result<Value, ToolError>> {
        let store = Arc::clone(&self.store);

        Box::pin(async move {
            let params: Params = parse_params(args)?;
            let course_id = params
                .course_id
                .or_else(|| ctx.course_id.clone())
                .ok_or_else(|| {
                    ToolError::InvalidParameters(
                        "missing 'course_id' and no course in context".to_string(),
                    )
                })?;

            let lookup_id = course_id.clone();
            let result =
                tokio::task::spawn_blocking(move || store.course_by_id(&lookup_id)).await;

            match result {
                Ok(Ok(Some(course))) => serde_json::to_value(&course)
                    .map_err(|e| execution_error("get_course_info", e)),
                Ok(Ok(None)) => Err(execution_error(
                    "get_course_info",
                    format!("course '{course_id}' not found"),
                )),
                Ok(Err(e)) => Err(execution_error("get_course_info", e)),
                Err(e) => Err(execution_error("get_course_info", format!("task error: {e}"))),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::db::{SqliteCatalog, demo_courses};

    fn tool() -> GetCourseInfo {
        let cat = SqliteCatalog::open_in_memory().unwrap();
        for c in demo_courses() {
            cat.upsert_course(&c).unwrap();
        }
        GetCourseInfo::new(Arc::new(cat))
    }

    #[test]
    fn tool_name() {
        assert_eq!(tool().name(), "get_course_info");
    }

    #[tokio::test]
    async fn returns_full_course_record() {
        let value = tool()
            .execute(&ToolCtx::default(), &serde_json::json!({ "course_id": "python" }))
            .await
            .unwrap();
        assert_eq!(value["id"], "python");
        assert!(value["modules"].as_array().unwrap().len() >= 2);
        assert!(value["skills"].as_array().unwrap().contains(&"SQL".into()));
    }

    #[tokio::test]
    async fn falls_back_to_context_course() {
        let value = tool()
            .execute(&ToolCtx::for_course("aws"), &serde_json::json!({}))
            .await
            .unwrap();
        assert_eq!(value["id"], "aws");
    }

    #[tokio::test]
    async fn missing_course_everywhere_is_invalid_parameters() {
        let err = tool()
            .execute(&ToolCtx::default(), &serde_json::json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::InvalidParameters(_)));
    }

    #[tokio::test]
    async fn unknown_course_is_execution_error() {
        let err = tool()
            .execute(&ToolCtx::default(), &serde_json::json!({ "course_id": "ghost" }))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::Execution { name, .. } if name == "get_course_info"));
    }
}
