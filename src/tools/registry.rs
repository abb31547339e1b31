//! Register tools by name; name, description, JSON schema, execute(ctx, args) -> value.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, RwLock};

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::catalog::CourseStore;
use crate::config::{PrereqTuning, ScoringWeights};
use crate::tools::context::ToolCtx;
use crate::tools::course_info::GetCourseInfo;
use crate::tools::course_list::GetAllCourses;
use crate::tools::prereq::CheckPrerequisites;
use crate::tools::register::CreateRegistration;
use crate::tools::search::SearchCourses;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub enum ToolError {
    /// `register` was called twice with the same tool name.
    Duplicate(String),
    /// `invoke` referenced a name not in the registry.
    Unknown(String),
    /// Arguments did not match the tool's parameter schema.
    InvalidParameters(String),
    /// The handler itself failed (store unreachable, record not found, ...).
    Execution { name: String, message: String },
}

impl std::fmt::Display for ToolError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ToolError::Duplicate(name) => write!(f, "tool '{}' already registered", name),
            ToolError::Unknown(name) => write!(f, "tool '{}' not found", name),
            ToolError::InvalidParameters(s) => write!(f, "invalid tool parameters: {}", s),
            ToolError::Execution { name, message } => {
                write!(f, "tool '{}' failed: {}", name, message)
            }
        }
    }
}

impl std::error::Error for ToolError {}

/// Deserialize tool arguments into the tool's parameter struct.
pub(crate) fn parse_params<T: DeserializeOwned>(args: &Value) -> Result<T, ToolError> {
    serde_json::from_value(args.clone()).map_err(|e| ToolError::InvalidParameters(e.to_string()))
}

/// Wrap a handler-level failure for `name`.
pub(crate) fn execution_error(name: &str, err: impl std::fmt::Display) -> ToolError {
    ToolError::Execution {
        name: name.to_string(),
        message: err.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Tool trait + registry
// ---------------------------------------------------------------------------

/// A single tool: name, description, JSON schema for args, and execute.
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    fn parameters(&self) -> Value;
    fn execute<'a>(
        &'a self,
        ctx: &'a ToolCtx,
        args: &'a Value,
    ) -> BoxFuture<'a, Result<Value, ToolError>>;
}

/// Registry of tools by name. Thread-safe; registered once at startup.
#[derive(Default)]
pub struct ToolRegistry {
    inner: RwLock<HashMap<String, Arc<dyn Tool + Send + Sync>>>,
}

impl ToolRegistry {
    #[inline]
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(HashMap::new()),
        }
    }

    /// Register a tool by its name. Fails if the name already exists.
    pub fn register<T: Tool + Send + Sync + 'static>(&self, tool: T) -> Result<(), ToolError> {
        let name = tool.name().to_string();
        let mut guard = self.inner.write().expect("registry lock");
        if guard.contains_key(&name) {
            return Err(ToolError::Duplicate(name));
        }
        guard.insert(name, Arc::new(tool));
        Ok(())
    }

    /// Execute a tool by name. `Unknown` if absent; handler errors come back
    /// as `InvalidParameters` or `Execution`.
    pub async fn invoke(
        &self,
        ctx: &ToolCtx,
        name: &str,
        args: &Value,
    ) -> Result<Value, ToolError> {
        let tool = {
            let guard = self.inner.read().expect("registry lock");
            guard.get(name).cloned()
        };

        match tool {
            Some(tool) => tool.execute(ctx, args).await,
            None => Err(ToolError::Unknown(name.to_string())),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.inner.read().expect("registry lock").contains_key(name)
    }

    /// Sorted list of tool names.
    pub fn list(&self) -> Vec<String> {
        let guard = self.inner.read().expect("registry lock");
        let mut names: Vec<String> = guard.keys().cloned().collect();
        names.sort();
        names
    }
}

/// Build the registry with the five catalog tools.
pub fn build_default_registry(
    store: Arc<dyn CourseStore>,
    weights: ScoringWeights,
    tuning: PrereqTuning,
) -> Result<ToolRegistry, ToolError> {
    let reg = ToolRegistry::new();
    reg.register(GetCourseInfo::new(Arc::clone(&store)))?;
    reg.register(GetAllCourses::new(Arc::clone(&store)))?;
    reg.register(SearchCourses::new(Arc::clone(&store), weights))?;
    reg.register(CheckPrerequisites::new(Arc::clone(&store), tuning))?;
    reg.register(CreateRegistration::new(store))?;
    Ok(reg)
}
