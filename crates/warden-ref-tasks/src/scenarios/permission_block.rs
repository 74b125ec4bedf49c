//! Scenario 1: Permission Block
//!
//! The read-only `task-analyst` holds `read:tasks` only. Its allow-list names
//! `updateTask`, but the tool requires `write:tasks`, so:
//!
//! - the provider is never shown `updateTask` (visibility), and
//! - when the model proposes it anyway, the call is rejected (enforcement)
//!   with `BLOCKED: Agent lacks permissions: [write:tasks]`.
//!
//! The permitted `listTasks` call in the same proposal is approved and runs
//! once the plan is confirmed.

use serde_json::json;

use warden_contracts::{
    error::WardenResult,
    run::{ProviderOutput, RunRequest},
    tool::ProposedToolCall,
};
use warden_core::outcome::ExecutionResult;

use crate::fixtures::{Deployment, RecordingExecutor, ScriptedProvider};

use super::{print_calls, print_integrity, print_log};

pub const AGENT: &str = "task-analyst";

/// What the model proposes: one permitted read and one write it may not make.
pub fn proposal() -> ProviderOutput {
    ProviderOutput {
        success: true,
        data: json!({
            "summary": "Two tasks open, one in progress; T-2 looks stale.",
            "openTasks": 2,
            "risks": ["T-2 has not moved this sprint"]
        }),
        tool_calls: vec![
            ProposedToolCall::new("listTasks", json!({ "status": "todo" })),
            ProposedToolCall::new("updateTask", json!({ "taskId": "T-2", "status": "done" })),
        ],
        reasoning: Some("Check open work, then close the stale ticket.".to_string()),
        raw_output: None,
    }
}

/// Run Discussion and Execution, returning the deployment for inspection.
pub async fn run() -> WardenResult<(Deployment, ExecutionResult)> {
    let deployment = Deployment::new(ScriptedProvider::new(proposal()), RecordingExecutor::new())?;
    let request = RunRequest::new(AGENT, "How is the board looking? Close anything stale.");

    let discussion = deployment.orchestrator.run_discussion(&request).await?;
    let execution = deployment
        .orchestrator
        .run_execution(discussion.confirm(), &request)
        .await?;

    Ok((deployment, execution))
}

/// Run Scenario 1 and print what happened.
pub async fn run_scenario() -> WardenResult<()> {
    println!("=== Scenario 1: Permission Block ===");
    println!();
    println!("  Agent: {AGENT} (permissions: [read:tasks])");
    println!("  Model proposes: listTasks, updateTask");
    println!();

    let (deployment, execution) = run().await?;

    if let Some(request) = deployment.provider.requests().first() {
        let shown: Vec<&str> = request.tools.iter().map(|t| t.name.as_str()).collect();
        println!("  Tools shown to model:   [{}]", shown.join(", "));
    }
    println!("  Tool calls:");
    print_calls(&execution.result().tool_calls);
    println!("  Executor invocations:   {:?}", deployment.executor.invocations());
    println!("  Run state:              {:?}", execution.state());
    println!("  Audit trail:");
    print_log(execution.logs());
    print_integrity(&deployment.audit);
    println!("  RESULT: updateTask BLOCKED, listTasks executed (expected)");
    println!();

    Ok(())
}
