//! Scenario 3: Invalid Output, Aborted Execution
//!
//! The `task-manager` proposes two perfectly legal calls, but the structured
//! data it returns for the `TaskUpdate` schema omits the required `taskId`.
//!
//! Discussion reports `$.taskId: required field missing` without raising.
//! The caller confirms the plan anyway; Execution re-validates from scratch,
//! fails again, and aborts: both calls stay `approved`, the executor is never
//! invoked, and exactly one `error` entry records the abort.

use serde_json::json;

use warden_contracts::{
    error::WardenResult,
    run::{ProviderOutput, RunRequest},
    schema::ValidationResult,
    tool::ProposedToolCall,
};
use warden_core::outcome::ExecutionResult;

use crate::fixtures::{Deployment, RecordingExecutor, ScriptedProvider};

use super::{print_calls, print_integrity, print_log};

pub const AGENT: &str = "task-manager";

pub fn proposal() -> ProviderOutput {
    ProviderOutput {
        success: true,
        // TaskUpdate requires taskId.
        data: json!({ "status": "done", "notes": "Release notes shipped" }),
        tool_calls: vec![
            ProposedToolCall::new("updateTask", json!({ "taskId": "T-1", "status": "done" })),
            ProposedToolCall::new("createTask", json!({ "title": "Announce release" })),
        ],
        reasoning: None,
        raw_output: None,
    }
}

/// Run Discussion, confirm regardless of its verdict, and run Execution.
///
/// Returns the Discussion-phase verdict alongside the Execution result.
pub async fn run() -> WardenResult<(Deployment, ValidationResult, ExecutionResult)> {
    let deployment =
        Deployment::new(ScriptedProvider::new(proposal()), RecordingExecutor::new())?;
    let request = RunRequest::new(
        AGENT,
        "Mark the release notes done and add an announcement task.",
    );

    let discussion = deployment.orchestrator.run_discussion(&request).await?;
    let discussion_verdict = discussion.validation().clone();
    let execution = deployment
        .orchestrator
        .run_execution(discussion.confirm(), &request)
        .await?;

    Ok((deployment, discussion_verdict, execution))
}

/// Run Scenario 3 and print what happened.
pub async fn run_scenario() -> WardenResult<()> {
    println!("=== Scenario 3: Invalid Output, Aborted Execution ===");
    println!();
    println!("  Agent: {AGENT} (output schema: TaskUpdate)");
    println!("  Model proposes: updateTask, createTask; data omits taskId");
    println!();

    let (deployment, verdict, execution) = run().await?;

    println!("  Discussion validation:  {}", if verdict.valid { "PASS" } else { "FAIL" });
    for message in verdict.messages() {
        println!("    {message}");
    }
    println!("  Caller confirms the plan anyway.");
    println!(
        "  Execution re-validation: {}",
        if execution.validation_passed() { "PASS" } else { "FAIL" }
    );
    println!("  Tool calls:");
    print_calls(&execution.result().tool_calls);
    println!("  Executor invocations:   {}", deployment.executor.invocations().len());
    println!("  Run state:              {:?}", execution.state());
    println!("  Audit trail:");
    print_log(execution.logs());
    print_integrity(&deployment.audit);
    println!("  RESULT: Execution ABORTED, nothing executed (expected)");
    println!();

    Ok(())
}
