//! Phase results returned by the orchestrator.
//!
//! `DiscussionResult` is advisory: it describes a fully classified plan but
//! authorizes nothing. The caller must turn it into a `ConfirmedPlan` with
//! `confirm()` before `Orchestrator::run_execution` will accept it, and
//! execution consumes the plan, so a finished run cannot be executed again.
//!
//! Fields are private so a caller can read a plan but cannot re-classify its
//! calls or edit its data between the two phases.

use warden_contracts::{
    agent::RunId,
    audit::LogEntry,
    run::{RunPhase, RunState, StructuredResult},
    schema::ValidationResult,
    tool::ToolCall,
};

/// The outcome of a Discussion phase, awaiting confirmation.
///
/// Not `Clone`: one Discussion yields at most one `ConfirmedPlan`, so a run
/// can be executed at most once. Copy out what you need through the
/// accessors.
///
/// ```compile_fail
/// use warden_core::outcome::DiscussionResult;
///
/// fn confirm_twice(discussion: DiscussionResult) {
///     let copy = discussion.clone();
///     let _first = discussion.confirm();
///     let _second = copy.confirm();
/// }
/// ```
#[derive(Debug)]
pub struct DiscussionResult {
    pub(crate) run_id: RunId,
    pub(crate) agent_name: String,
    pub(crate) model_id: String,
    pub(crate) result: StructuredResult,
    pub(crate) validation: ValidationResult,
    pub(crate) logs: Vec<LogEntry>,
}

impl DiscussionResult {
    pub fn run_id(&self) -> RunId {
        self.run_id
    }

    pub fn phase(&self) -> RunPhase {
        RunPhase::Discussion
    }

    pub fn state(&self) -> RunState {
        RunState::AwaitingConfirmation
    }

    pub fn agent_name(&self) -> &str {
        &self.agent_name
    }

    /// The model id the Discussion actually ran against.
    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    pub fn result(&self) -> &StructuredResult {
        &self.result
    }

    /// The Discussion-phase verdict. Execution never relies on it.
    pub fn validation(&self) -> &ValidationResult {
        &self.validation
    }

    pub fn validation_passed(&self) -> bool {
        self.validation.valid
    }

    pub fn logs(&self) -> &[LogEntry] {
        &self.logs
    }

    /// Calls that passed authorization, in approval order.
    pub fn approved_calls(&self) -> Vec<&ToolCall> {
        self.result.approved_calls().collect()
    }

    pub fn blocked_calls(&self) -> Vec<&ToolCall> {
        self.result.blocked_calls().collect()
    }

    /// The explicit confirmation signal that makes the plan executable.
    ///
    /// Consumes the Discussion, and `run_execution` consumes the plan:
    ///
    /// ```compile_fail
    /// use warden_core::{outcome::DiscussionResult, Orchestrator};
    /// use warden_contracts::run::RunRequest;
    ///
    /// async fn execute_twice(
    ///     orchestrator: &Orchestrator,
    ///     discussion: DiscussionResult,
    ///     request: &RunRequest,
    /// ) {
    ///     let plan = discussion.confirm();
    ///     let _ = orchestrator.run_execution(plan, request).await;
    ///     let _ = orchestrator.run_execution(plan, request).await;
    /// }
    /// ```
    pub fn confirm(self) -> ConfirmedPlan {
        ConfirmedPlan { discussion: self }
    }
}

/// A Discussion the caller has explicitly confirmed.
///
/// The only input `Orchestrator::run_execution` accepts.
#[derive(Debug)]
pub struct ConfirmedPlan {
    pub(crate) discussion: DiscussionResult,
}

impl ConfirmedPlan {
    pub fn discussion(&self) -> &DiscussionResult {
        &self.discussion
    }
}

/// The terminal outcome of a run.
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    pub(crate) run_id: RunId,
    pub(crate) state: RunState,
    pub(crate) result: StructuredResult,
    pub(crate) validation: ValidationResult,
    pub(crate) logs: Vec<LogEntry>,
}

impl ExecutionResult {
    pub fn run_id(&self) -> RunId {
        self.run_id
    }

    pub fn phase(&self) -> RunPhase {
        RunPhase::Execution
    }

    /// `Completed` or `Aborted`.
    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn result(&self) -> &StructuredResult {
        &self.result
    }

    /// The Execution-phase re-validation verdict.
    pub fn validation(&self) -> &ValidationResult {
        &self.validation
    }

    pub fn validation_passed(&self) -> bool {
        self.validation.valid
    }

    /// Discussion entries followed by Execution entries.
    pub fn logs(&self) -> &[LogEntry] {
        &self.logs
    }

    /// Calls that passed authorization, executed or not.
    pub fn approved_calls(&self) -> Vec<&ToolCall> {
        self.result.approved_calls().collect()
    }

    pub fn blocked_calls(&self) -> Vec<&ToolCall> {
        self.result.blocked_calls().collect()
    }

    pub fn executed_calls(&self) -> Vec<&ToolCall> {
        self.result.executed_calls().collect()
    }

    /// Approved calls whose executor invocation failed.
    pub fn failed_calls(&self) -> Vec<&ToolCall> {
        self.result
            .approved_calls()
            .filter(|c| c.error().is_some())
            .collect()
    }
}
