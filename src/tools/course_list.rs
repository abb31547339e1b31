//! `get_all_courses` tool: catalog listing (label, level, enrollment, rating).

use std::sync::Arc;

use serde_json::Value;

use crate::catalog::CourseStore;
use crate::tools::context::ToolCtx;
use crate::tools::registry::{BoxFuture, Tool, ToolError, execution_error};

pub struct GetAllCourses {
    store: Arc<dyn CourseStore>,
}

impl GetAllCourses {
    pub fn new(store: Arc<dyn CourseStore>) -> Self {
        Self { store }
    }
}

impl Tool for GetAllCourses {
    fn name(&self) -> &str {
        "get_all_courses"
    }

    fn description(&self) -> &str {
        "Liste toutes les formations du catalogue avec leur niveau, le nombre \
         d'inscrits et la note moyenne."
    }

    fn parameters(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {},
            "required": []
        })
    }

    fn execute<'a>(
        &'a self,
        _ctx: &'a ToolCtx,
        _args: &'a Value,
    ) -> BoxFuture<'a, Result<Value, ToolError>> {
        let store = Arc::clone(&self.store);

        Box::pin(async move {
            let result = tokio::task::spawn_blocking(move || store.list_courses()).await;

            match result {
                Ok(Ok(courses)) => serde_json::to_value(&courses)
                    .map_err(|e| execution_error("get_all_courses", e)),
                Ok(Err(e)) => Err(execution_error("get_all_courses", e)),
                Err(e) => Err(execution_error("get_all_courses", format!("task error: {e}"))),
            }
        })
    }
}
