//! # warden-ref-tasks
//!
//! Task-management reference deployment for the WARDEN orchestration engine.
//!
//! Demonstrates four scenarios using mock data and a scripted model:
//!
//! 1. **Permission Block**: a read-only agent's write call is hidden from
//!    the model and rejected when proposed anyway.
//! 2. **Hallucinated Tool**: an invented tool is rejected as not in registry.
//! 3. **Invalid Output**: output missing a required field aborts Execution
//!    even after the caller confirms.
//! 4. **Confirmed Run**: approved calls execute in order and one failing
//!    call does not stop its siblings.
//!
//! All data is hardcoded and fictional. No external API calls are made.

pub mod fixtures;
pub mod mock_data;
pub mod scenarios;

/// The bundled task/workflow catalog.
pub const TASKS_CATALOG: &str = include_str!("../catalog/tasks.toml");
