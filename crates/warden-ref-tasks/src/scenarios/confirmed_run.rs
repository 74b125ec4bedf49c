//! Scenario 4: Confirmed Run with an Isolated Failure
//!
//! The `workflow-architect` proposes a valid `WorkflowPlan` and three legal
//! calls. The plan is confirmed and executed in approval order. The task
//! tracker is down for `listWorkflows`, so that one call fails: it is recorded
//! as an `error` entry and stays `approved`, while the calls before and after
//! it still execute.

use serde_json::json;

use warden_contracts::{
    error::WardenResult,
    run::{ProviderOutput, RunRequest},
    tool::ProposedToolCall,
};
use warden_core::outcome::ExecutionResult;

use crate::fixtures::{Deployment, RecordingExecutor, ScriptedProvider};

use super::{print_calls, print_integrity, print_log};

pub const AGENT: &str = "workflow-architect";

/// The tool the scripted tracker fails on.
pub const FAILING_TOOL: &str = "listWorkflows";

pub fn proposal() -> ProviderOutput {
    ProviderOutput {
        success: true,
        data: json!({
            "name": "release-checklist",
            "steps": [
                { "title": "Freeze main", "owner": "raj" },
                { "title": "Draft release notes", "owner": "ana" },
                { "title": "Tag and publish" }
            ]
        }),
        tool_calls: vec![
            ProposedToolCall::new("listTasks", json!({})),
            ProposedToolCall::new(FAILING_TOOL, json!({})),
            ProposedToolCall::new(
                "createWorkflow",
                json!({
                    "name": "release-checklist",
                    "steps": ["Freeze main", "Draft release notes", "Tag and publish"]
                }),
            ),
        ],
        reasoning: Some("Check existing workflows before adding a new one.".to_string()),
        raw_output: None,
    }
}

pub async fn run() -> WardenResult<(Deployment, ExecutionResult)> {
    let deployment = Deployment::new(
        ScriptedProvider::new(proposal()),
        RecordingExecutor::new().fail_on(FAILING_TOOL),
    )?;
    let request = RunRequest::new(AGENT, "Turn our release process into a workflow.");

    let discussion = deployment.orchestrator.run_discussion(&request).await?;
    let execution = deployment
        .orchestrator
        .run_execution(discussion.confirm(), &request)
        .await?;

    Ok((deployment, execution))
}

/// Run Scenario 4 and print what happened.
pub async fn run_scenario() -> WardenResult<()> {
    println!("=== Scenario 4: Confirmed Run with an Isolated Failure ===");
    println!();
    println!("  Agent: {AGENT} (output schema: WorkflowPlan)");
    println!("  Model proposes: listTasks, listWorkflows, createWorkflow");
    println!("  Task tracker: {FAILING_TOOL} unavailable");
    println!();

    let (deployment, execution) = run().await?;

    println!(
        "  Execution re-validation: {}",
        if execution.validation_passed() { "PASS" } else { "FAIL" }
    );
    println!("  Tool calls:");
    print_calls(&execution.result().tool_calls);
    println!("  Executor invocations:   {:?}", deployment.executor.invocations());
    println!("  Run state:              {:?}", execution.state());
    println!("  Audit trail:");
    print_log(execution.logs());
    print_integrity(&deployment.audit);
    println!("  RESULT: 2 executed, 1 failed in isolation (expected)");
    println!();

    Ok(())
}
