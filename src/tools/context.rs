//! Execution context for tools: current conversation's course focus and locale.

/// Context passed into each tool execution.
#[derive(Debug, Clone)]
pub struct ToolCtx {
    /// Course the conversation is scoped to, if any. Tools may fall back to
    /// it when their `course_id` parameter is omitted.
    pub course_id: Option<String>,
    /// Reply locale, e.g. "fr".
    pub language: String,
}

impl Default for ToolCtx {
    fn default() -> Self {
        Self {
            course_id: None,
            language: "fr".to_string(),
        }
    }
}

impl ToolCtx {
    pub fn for_course(course_id: &str) -> Self {
        Self {
            course_id: Some(course_id.to_string()),
            ..Self::default()
        }
    }
}
