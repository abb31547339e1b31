//! Formabot library: config, course catalog, tools, agent orchestrator, remote
//! client, fallback gateway.

pub mod agent;
pub mod catalog;
pub mod config;
pub mod gateway;
pub mod remote;
pub mod tools;
