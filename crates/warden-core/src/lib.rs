//! # warden-core
//!
//! The WARDEN orchestration runtime: trait seams, immutable lookup tables, and
//! the two-phase `Orchestrator`.
//!
//! Concrete policy, validation, and audit implementations live in their own
//! crates and are injected through the traits in [`traits`].

pub mod directory;
pub mod orchestrator;
pub mod outcome;
pub mod settings;
pub mod traits;

pub use directory::{AgentDirectory, ProviderTable, SchemaCatalog};
pub use orchestrator::Orchestrator;
pub use outcome::{ConfirmedPlan, DiscussionResult, ExecutionResult};
pub use settings::OrchestratorSettings;
pub use traits::{AuditSink, ModelProvider, SchemaValidator, ToolAccessPolicy, ToolExecutor};
