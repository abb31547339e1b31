//! Catalog tools: registry plus the five course operations.

pub mod context;
pub mod course_info;
pub mod course_list;
pub mod prereq;
pub mod register;
pub mod registry;
pub mod search;

pub use context::ToolCtx;
pub use registry::{BoxFuture, Tool, ToolError, ToolRegistry, build_default_registry};
