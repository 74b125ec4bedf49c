//! Simulated task-board data for the WARDEN reference deployment.
//!
//! All data in this module is hardcoded and fictional. It stands in for a
//! real task tracker behind the `RecordingExecutor`.

use serde_json::{json, Map, Value};

/// The fixed board every scenario starts from.
pub fn task_board() -> Value {
    json!([
        { "taskId": "T-1", "title": "Draft release notes", "status": "in_progress", "assignee": "ana" },
        { "taskId": "T-2", "title": "Fix login timeout", "status": "todo", "assignee": "raj" },
        { "taskId": "T-3", "title": "Rotate API keys", "status": "done", "assignee": "ana" },
        { "taskId": "T-4", "title": "Review onboarding flow", "status": "todo" }
    ])
}

/// Answer one tool call against the mock board.
///
/// Returns `None` for tool names the board has no handler for.
pub fn handle(tool_name: &str, arguments: &Map<String, Value>) -> Option<Value> {
    let arg = |name: &str| arguments.get(name).cloned().unwrap_or(Value::Null);

    let result = match tool_name {
        "listTasks" => {
            let board = task_board();
            let tasks: Vec<Value> = match arguments.get("status").and_then(Value::as_str) {
                Some(status) => board
                    .as_array()
                    .into_iter()
                    .flatten()
                    .filter(|t| t["status"] == status)
                    .cloned()
                    .collect(),
                None => board.as_array().cloned().unwrap_or_default(),
            };
            json!({ "count": tasks.len(), "tasks": tasks })
        }
        "getTask" => {
            let id = arg("taskId");
            task_board()
                .as_array()
                .and_then(|tasks| tasks.iter().find(|t| t["taskId"] == id).cloned())
                .unwrap_or_else(|| json!({ "taskId": id, "found": false }))
        }
        "createTask" => json!({
            "taskId": "T-5",
            "title": arg("title"),
            "status": "todo",
            "created": true
        }),
        "updateTask" => json!({
            "taskId": arg("taskId"),
            "status": arg("status"),
            "updated": true
        }),
        "listWorkflows" => json!({
            "workflows": [{ "name": "weekly-triage", "steps": ["collect", "prioritise", "assign"] }]
        }),
        "createWorkflow" => json!({
            "name": arg("name"),
            "steps": arg("steps"),
            "created": true
        }),
        _ => return None,
    };

    Some(result)
}
