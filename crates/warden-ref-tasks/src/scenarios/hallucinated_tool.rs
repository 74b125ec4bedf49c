//! Scenario 2: Hallucinated Tool
//!
//! The fully permitted `task-manager` asks for a clean-up and the model
//! invents a `dropDatabase` tool. No registry entry exists, so the call is
//! rejected as not-in-registry no matter what the agent is allowed or granted.
//!
//! The plan is left unconfirmed: Discussion alone never executes anything.

use serde_json::json;

use warden_contracts::{
    error::WardenResult,
    run::{ProviderOutput, RunRequest},
    tool::ProposedToolCall,
};
use warden_core::outcome::DiscussionResult;

use crate::fixtures::{Deployment, RecordingExecutor, ScriptedProvider};

use super::{print_calls, print_integrity, print_log};

pub const AGENT: &str = "task-manager";

pub fn proposal() -> ProviderOutput {
    ProviderOutput {
        success: true,
        data: json!({ "taskId": "T-3", "notes": "Board reset requested" }),
        tool_calls: vec![
            ProposedToolCall::new("dropDatabase", json!({ "confirm": true })),
            ProposedToolCall::new("getTask", json!({ "taskId": "T-3" })),
        ],
        reasoning: None,
        raw_output: None,
    }
}

/// Run the Discussion phase only.
pub async fn run() -> WardenResult<(Deployment, DiscussionResult)> {
    let deployment = Deployment::new(ScriptedProvider::new(proposal()), RecordingExecutor::new())?;
    let request = RunRequest::new(AGENT, "Wipe everything and start the board over.");
    let discussion = deployment.orchestrator.run_discussion(&request).await?;
    Ok((deployment, discussion))
}

/// Run Scenario 2 and print what happened.
pub async fn run_scenario() -> WardenResult<()> {
    println!("=== Scenario 2: Hallucinated Tool ===");
    println!();
    println!("  Agent: {AGENT} (permissions: [read:tasks, write:tasks])");
    println!("  Model proposes: dropDatabase (not registered), getTask");
    println!();

    let (deployment, discussion) = run().await?;

    println!("  Tool calls:");
    print_calls(&discussion.result().tool_calls);
    println!("  Run state:              {:?}", discussion.state());
    println!("  Executor invocations:   {} (plan not confirmed)", deployment.executor.invocations().len());
    println!("  Audit trail:");
    print_log(discussion.logs());
    print_integrity(&deployment.audit);
    println!("  RESULT: dropDatabase REJECTED as not in registry (expected)");
    println!();

    Ok(())
}
