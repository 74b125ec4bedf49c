//! The WARDEN orchestrator: the two-phase, permission-gated run driver.
//!
//! The orchestrator enforces the WARDEN run model:
//!
//!   Discussion:  Agent → Provider → Visibility → [ModelProvider] → Classify → Validate → Audit
//!   Execution:   Confirm → Re-validate → [ToolExecutor per approved call] → Audit
//!
//! The safety invariant is absolute: `ToolExecutor::execute()` is NEVER called
//! during Discussion, never for a call that is not `approved`, and never
//! unless the run's data passes schema validation again inside the Execution
//! phase. The only call site of `execute()` sits behind all three conditions.

use std::sync::Arc;

use serde_json::{json, Value};
use tracing::{debug, info, warn};

use warden_contracts::{
    agent::{AgentConfig, RunId},
    audit::{LogDraft, LogEntry, LogEntryType},
    error::{WardenError, WardenResult},
    run::{ProviderOutput, ProviderRequest, RunPhase, RunRequest, RunState, StructuredResult},
    schema::{JsonSchema, ValidationResult},
    tool::{BlockReason, ToolCall, ToolCallStatus},
};

use crate::{
    directory::{AgentDirectory, ProviderTable, SchemaCatalog},
    outcome::{ConfirmedPlan, DiscussionResult, ExecutionResult},
    settings::OrchestratorSettings,
    traits::{AuditSink, ModelProvider, SchemaValidator, ToolAccessPolicy, ToolExecutor},
};

/// Drives runs through Discussion and Execution.
///
/// Every collaborator is immutable shared configuration or a trait object, so
/// one orchestrator can be wrapped in an `Arc` and serve concurrent runs
/// without coordination. Per-run state (the tool calls and the entries being
/// collected) lives only inside a single `run_discussion` / `run_execution`
/// invocation and the values they return.
pub struct Orchestrator {
    policy: Arc<dyn ToolAccessPolicy>,
    validator: Arc<dyn SchemaValidator>,
    agents: Arc<AgentDirectory>,
    schemas: Arc<SchemaCatalog>,
    providers: ProviderTable,
    executor: Arc<dyn ToolExecutor>,
    audit: Arc<dyn AuditSink>,
    settings: OrchestratorSettings,
}

impl Orchestrator {
    /// Create an orchestrator with default settings.
    pub fn new(
        policy: Arc<dyn ToolAccessPolicy>,
        validator: Arc<dyn SchemaValidator>,
        agents: Arc<AgentDirectory>,
        schemas: Arc<SchemaCatalog>,
        providers: ProviderTable,
        executor: Arc<dyn ToolExecutor>,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        Self {
            policy,
            validator,
            agents,
            schemas,
            providers,
            executor,
            audit,
            settings: OrchestratorSettings::default(),
        }
    }

    /// Replace the default settings (builder style).
    pub fn with_settings(mut self, settings: OrchestratorSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn settings(&self) -> &OrchestratorSettings {
        &self.settings
    }

    /// Run the side-effect-free Discussion phase.
    ///
    /// # Pipeline
    ///
    /// 1. Resolve the `AgentConfig`; unknown → `UnknownAgent`
    /// 2. Resolve the provider for the effective model id; unknown →
    ///    `UnknownModel`. The output schema must resolve too.
    /// 3. Compute the permitted tools and log them (`plan`)
    /// 4. Call the provider (the phase's only suspension point)
    /// 5. Classify every proposed call: `rejected` + `blocked` entry, or
    ///    `approved` + `tool_call` entry
    /// 6. Validate the proposed data against the output schema (`validation`)
    /// 7. Return the plan, awaiting confirmation
    ///
    /// # Errors
    ///
    /// Configuration errors are returned before anything is logged. Provider
    /// failures (including timeouts and `success = false`) are logged as an
    /// `error` entry and returned. Blocked calls and validation failures are
    /// NOT errors; they are part of the returned `DiscussionResult`.
    pub async fn run_discussion(&self, request: &RunRequest) -> WardenResult<DiscussionResult> {
        // ── Steps 1 & 2: Resolve configuration ───────────────────────────────
        let agent = self.resolve_agent(&request.agent_name)?;

        let model_id = request
            .model_id
            .clone()
            .unwrap_or_else(|| agent.model_id.clone());
        let provider = self.providers.get(&model_id).ok_or_else(|| {
            warn!(agent = %agent.name, model_id = %model_id, "no provider registered for model");
            WardenError::UnknownModel {
                model_id: model_id.clone(),
            }
        })?;

        let output_schema = self.resolve_schema(agent)?;

        let run_id = RunId::new();
        info!(
            run_id = %run_id,
            agent = %agent.name,
            model_id = %model_id,
            "discussion phase starting"
        );

        let mut log = RunLog::new(
            self.audit.as_ref(),
            run_id,
            RunPhase::Discussion,
            &model_id,
            &agent.name,
        );

        // ── Step 3: Visibility ───────────────────────────────────────────────
        //
        // The provider is never shown a tool the agent could not legally call.
        let permitted = self
            .policy
            .permitted_tools(&agent.allowed_tools, &agent.permissions);
        let names: Vec<&str> = permitted.iter().map(|t| t.name.as_str()).collect();
        log.record(
            LogEntryType::Plan,
            format!("Permitted tools: [{}]", names.join(", ")),
            Some(json!({ "tools": names })),
        )?;

        // ── Step 4: Provider call ────────────────────────────────────────────
        let provider_request = ProviderRequest {
            system_prompt: agent.instructions.clone(),
            user_prompt: request.user_input.clone(),
            tools: permitted,
            output_schema: output_schema.clone(),
        };

        let output = match self
            .call_provider(provider.as_ref(), &provider_request, &model_id)
            .await
        {
            Ok(output) => output,
            Err(err) => {
                warn!(run_id = %run_id, model_id = %model_id, error = %err, "provider call failed");
                log.record(
                    LogEntryType::Error,
                    format!("Provider call failed: {err}"),
                    None,
                )?;
                return Err(err);
            }
        };

        let mut result = StructuredResult::from_provider(output);
        debug!(
            run_id = %run_id,
            proposed_calls = result.tool_calls.len(),
            "provider returned structured result"
        );

        if let Some(reasoning) = &result.reasoning {
            log.record(
                LogEntryType::Plan,
                format!("Model reasoning: {reasoning}"),
                None,
            )?;
        }

        // ── Step 5: Classify every proposed call ─────────────────────────────
        //
        // Nothing executes here, whatever the outcome.
        for call in result.tool_calls.iter_mut() {
            self.classify(call, agent, &mut log)?;
        }

        // ── Step 6: Validate proposed data ───────────────────────────────────
        let validation = self.validator.validate(&result.data, output_schema);
        record_validation(&mut log, &validation)?;

        info!(
            run_id = %run_id,
            approved = result.approved_calls().count(),
            blocked = result.blocked_calls().count(),
            validation_passed = validation.valid,
            "discussion phase complete, awaiting confirmation"
        );

        Ok(DiscussionResult {
            run_id,
            agent_name: agent.name.clone(),
            model_id,
            result,
            validation,
            logs: log.into_entries(),
        })
    }

    /// Run the Execution phase of a confirmed plan.
    ///
    /// # Pipeline
    ///
    /// 1. Re-validate the plan's data from scratch; on failure log an `error`
    ///    entry and return `Aborted` without executing anything
    /// 2. Execute each approved call sequentially, in approval order; a failed
    ///    call is recorded and does not stop the remaining calls
    /// 3. Return the merged Discussion + Execution log and final call snapshot
    ///
    /// # Errors
    ///
    /// Returns `Err` only for configuration problems (the request names a
    /// different agent than the plan, or the agent/schema no longer resolves),
    /// audit write failures, and illegal state transitions. Re-validation
    /// failure and tool failures are reported in the `ExecutionResult`.
    pub async fn run_execution(
        &self,
        plan: ConfirmedPlan,
        request: &RunRequest,
    ) -> WardenResult<ExecutionResult> {
        let DiscussionResult {
            run_id,
            agent_name,
            model_id,
            mut result,
            logs: discussion_logs,
            ..
        } = plan.discussion;

        if request.agent_name != agent_name {
            return Err(WardenError::ConfigError {
                reason: format!(
                    "run request names agent '{}' but the confirmed plan belongs to '{}'",
                    request.agent_name, agent_name
                ),
            });
        }

        let agent = self.resolve_agent(&agent_name)?;
        let output_schema = self.resolve_schema(agent)?;

        info!(run_id = %run_id, agent = %agent_name, "execution phase starting");

        let mut log = RunLog::new(
            self.audit.as_ref(),
            run_id,
            RunPhase::Execution,
            &model_id,
            &agent_name,
        );

        // ── Step 1: Re-validation ────────────────────────────────────────────
        //
        // The Discussion verdict is never trusted; validation runs again here.
        let validation = self.validator.validate(&result.data, output_schema);
        record_validation(&mut log, &validation)?;

        if !validation.valid {
            let pending = result.approved_calls().count();
            warn!(
                run_id = %run_id,
                approved_calls = pending,
                "re-validation failed, aborting execution"
            );
            log.record(
                LogEntryType::Error,
                format!(
                    "Execution aborted: output failed re-validation; {pending} approved call(s) not executed"
                ),
                Some(json!({ "errors": validation.messages() })),
            )?;

            return Ok(ExecutionResult {
                run_id,
                state: RunState::Aborted,
                result,
                validation,
                logs: merge_logs(discussion_logs, log),
            });
        }

        // ── Step 2: Execute approved calls, in order ─────────────────────────
        for call in result
            .tool_calls
            .iter_mut()
            .filter(|c| c.status() == ToolCallStatus::Approved)
        {
            debug!(run_id = %run_id, tool = %call.tool_name, "executing approved tool call");

            match self.executor.execute(call).await {
                Ok(output) => {
                    call.mark_executed(output.clone())?;
                    log.record(
                        LogEntryType::Execution,
                        format!("Executed tool: {}", call.tool_name),
                        Some(json!({ "tool": call.tool_name, "result": output })),
                    )?;
                }
                Err(err) => {
                    // Isolated: recorded on this call, siblings still run.
                    warn!(run_id = %run_id, tool = %call.tool_name, error = %err, "tool execution failed");
                    call.record_failure(err.to_string())?;
                    log.record(
                        LogEntryType::Error,
                        format!("Tool '{}' failed: {err}", call.tool_name),
                        Some(json!({ "tool": call.tool_name, "error": err.to_string() })),
                    )?;
                }
            }
        }

        info!(
            run_id = %run_id,
            executed = result.executed_calls().count(),
            "execution phase complete"
        );

        Ok(ExecutionResult {
            run_id,
            state: RunState::Completed,
            result,
            validation,
            logs: merge_logs(discussion_logs, log),
        })
    }

    // ── Internal helpers ──────────────────────────────────────────────────────

    fn resolve_agent(&self, name: &str) -> WardenResult<&AgentConfig> {
        self.agents.get(name).ok_or_else(|| {
            warn!(agent = %name, "unknown agent requested");
            WardenError::UnknownAgent {
                name: name.to_string(),
            }
        })
    }

    fn resolve_schema(&self, agent: &AgentConfig) -> WardenResult<&JsonSchema> {
        self.schemas
            .get(&agent.output_schema_name)
            .ok_or_else(|| WardenError::UnknownSchema {
                name: agent.output_schema_name.clone(),
            })
    }

    /// Call the provider under the configured timeout, normalizing every
    /// failure mode into a provider error.
    async fn call_provider(
        &self,
        provider: &dyn ModelProvider,
        request: &ProviderRequest,
        model_id: &str,
    ) -> WardenResult<ProviderOutput> {
        let timeout = self.settings.provider_timeout();
        let output =
            match tokio::time::timeout(timeout, provider.generate_structured_output(request)).await
            {
                Ok(Ok(output)) => output,
                Ok(Err(err @ WardenError::Provider { .. })) => return Err(err),
                Ok(Err(err)) => {
                    return Err(WardenError::Provider {
                        model_id: model_id.to_string(),
                        reason: err.to_string(),
                    })
                }
                Err(_) => {
                    return Err(WardenError::ProviderTimeout {
                        model_id: model_id.to_string(),
                        timeout_ms: self.settings.provider_timeout_ms,
                    })
                }
            };

        if !output.success {
            return Err(WardenError::Provider {
                model_id: model_id.to_string(),
                reason: "provider reported an unsuccessful generation".to_string(),
            });
        }

        Ok(output)
    }

    /// Approve or reject one pending call and log the decision.
    fn classify(
        &self,
        call: &mut ToolCall,
        agent: &AgentConfig,
        log: &mut RunLog<'_>,
    ) -> WardenResult<()> {
        let mut reason =
            self.policy
                .check_access(&call.tool_name, &agent.allowed_tools, &agent.permissions);

        // Arguments must be an object whether or not schemas are checked.
        if reason.is_none() {
            if let Some(issue) = call.argument_shape_issue() {
                reason = Some(BlockReason::InvalidArguments {
                    errors: vec![issue],
                });
            }
        }

        if reason.is_none() && self.settings.validate_arguments {
            if let Some(tool) = self.policy.tool(&call.tool_name) {
                let check = self
                    .validator
                    .validate(&call.arguments, &tool.parameter_schema);
                if !check.valid {
                    reason = Some(BlockReason::InvalidArguments {
                        errors: check.errors,
                    });
                }
            }
        }

        match reason {
            Some(reason) => {
                warn!(
                    run_id = %log.run_id,
                    agent = %agent.name,
                    tool = %call.tool_name,
                    reason = %reason,
                    "tool call blocked"
                );
                let message = format!("BLOCKED: {reason}");
                let data = json!({
                    "tool": call.tool_name,
                    "arguments": call.arguments,
                    "reason": &reason,
                });
                call.reject(reason)?;
                log.record(LogEntryType::Blocked, message, Some(data))
            }
            None => {
                call.approve()?;
                log.record(
                    LogEntryType::ToolCall,
                    format!("Approved tool call: {}", call.tool_name),
                    Some(json!({ "tool": call.tool_name, "arguments": call.arguments })),
                )
            }
        }
    }
}

fn record_validation(log: &mut RunLog<'_>, validation: &ValidationResult) -> WardenResult<()> {
    if validation.valid {
        log.record(
            LogEntryType::Validation,
            "Output validation passed",
            Some(json!({ "valid": true })),
        )
    } else {
        let errors = validation.messages();
        warn!(
            run_id = %log.run_id,
            phase = %log.phase,
            errors = %errors.join("; "),
            "output validation failed"
        );
        log.record(
            LogEntryType::Validation,
            format!("Output validation failed with {} error(s)", errors.len()),
            Some(json!({ "valid": false, "errors": errors })),
        )
    }
}

fn merge_logs(mut earlier: Vec<LogEntry>, log: RunLog<'_>) -> Vec<LogEntry> {
    earlier.extend(log.into_entries());
    earlier
}

// ── Per-phase log collector ──────────────────────────────────────────────────

/// Appends entries for one phase of one run to the audit sink and keeps the
/// sealed entries so they can be returned to the caller.
struct RunLog<'a> {
    sink: &'a dyn AuditSink,
    run_id: RunId,
    phase: RunPhase,
    model_id: String,
    agent_name: String,
    entries: Vec<LogEntry>,
}

impl<'a> RunLog<'a> {
    fn new(
        sink: &'a dyn AuditSink,
        run_id: RunId,
        phase: RunPhase,
        model_id: &str,
        agent_name: &str,
    ) -> Self {
        Self {
            sink,
            run_id,
            phase,
            model_id: model_id.to_string(),
            agent_name: agent_name.to_string(),
            entries: Vec::new(),
        }
    }

    fn record(
        &mut self,
        entry_type: LogEntryType,
        message: impl Into<String>,
        data: Option<Value>,
    ) -> WardenResult<()> {
        let entry = self.sink.append(LogDraft {
            run_id: self.run_id,
            phase: self.phase,
            model_id: self.model_id.clone(),
            agent_name: self.agent_name.clone(),
            entry_type,
            message: message.into(),
            data,
        })?;

        debug!(
            run_id = %entry.run_id,
            id = entry.id,
            entry_type = %entry.entry_type,
            message = %entry.message,
            "audit entry appended"
        );

        self.entries.push(entry);
        Ok(())
    }

    fn into_entries(self) -> Vec<LogEntry> {
        self.entries
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::collections::{BTreeMap, BTreeSet};
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use async_trait::async_trait;
    use chrono::Utc;
    use serde_json::{json, Value};

    use warden_contracts::{
        agent::AgentConfig,
        audit::{LogDraft, LogEntry, LogEntryType},
        error::{WardenError, WardenResult},
        permission::PermissionSet,
        run::{ProviderOutput, ProviderRequest, RunRequest, RunState},
        schema::{JsonSchema, ValidationIssue, ValidationResult},
        tool::{BlockReason, ProposedToolCall, ToolCall, ToolCallStatus, ToolDefinition},
    };

    use crate::{
        directory::{AgentDirectory, ProviderTable, SchemaCatalog},
        settings::OrchestratorSettings,
        traits::{AuditSink, ModelProvider, SchemaValidator, ToolAccessPolicy, ToolExecutor},
    };

    use super::Orchestrator;

    // ── Mock helpers ─────────────────────────────────────────────────────────

    fn tool(name: &str, perms: &[&str]) -> ToolDefinition {
        ToolDefinition {
            name: name.to_string(),
            description: format!("{name} tool"),
            parameter_schema: JsonSchema::object().describe("params"),
            required_permissions: perms.iter().copied().collect(),
        }
    }

    fn agent(name: &str, model: &str, allowed: &[&str], perms: &[&str]) -> AgentConfig {
        AgentConfig {
            name: name.to_string(),
            model_id: model.to_string(),
            instructions: "You manage tasks.".to_string(),
            allowed_tools: allowed.iter().map(|s| s.to_string()).collect(),
            output_schema_name: "Out".to_string(),
            permissions: perms.iter().copied().collect(),
        }
    }

    fn proposal(calls: &[&str]) -> ProviderOutput {
        ProviderOutput {
            success: true,
            data: json!({ "summary": "ok" }),
            tool_calls: calls
                .iter()
                .map(|c| ProposedToolCall::new(*c, json!({})))
                .collect(),
            reasoning: None,
            raw_output: None,
        }
    }

    /// A registry-backed policy with the same decision order as the real one.
    struct MockPolicy {
        tools: Vec<ToolDefinition>,
    }

    impl ToolAccessPolicy for MockPolicy {
        fn permitted_tools(
            &self,
            allowed: &BTreeSet<String>,
            granted: &PermissionSet,
        ) -> Vec<ToolDefinition> {
            self.tools
                .iter()
                .filter(|t| allowed.contains(&t.name) && t.required_permissions.is_subset(granted))
                .cloned()
                .collect()
        }

        fn check_access(
            &self,
            name: &str,
            allowed: &BTreeSet<String>,
            granted: &PermissionSet,
        ) -> Option<BlockReason> {
            let tool = match self.tool(name) {
                Some(t) => t,
                None => return Some(BlockReason::NotInRegistry { tool: name.to_string() }),
            };
            if !allowed.contains(name) {
                return Some(BlockReason::NotAllowlisted { tool: name.to_string() });
            }
            let missing = tool.required_permissions.missing_from(granted);
            if !missing.is_empty() {
                return Some(BlockReason::MissingPermissions { missing });
            }
            None
        }

        fn tool(&self, name: &str) -> Option<&ToolDefinition> {
            self.tools.iter().find(|t| t.name == name)
        }
    }

    /// Output validation fails while `strict` is set; argument validation
    /// (schemas described "params") fails when `reject_args` is set.
    struct MockValidator {
        strict: Arc<AtomicBool>,
        reject_args: bool,
        calls: Arc<Mutex<u32>>,
    }

    impl MockValidator {
        fn passing() -> Self {
            Self {
                strict: Arc::new(AtomicBool::new(false)),
                reject_args: false,
                calls: Arc::new(Mutex::new(0)),
            }
        }
    }

    impl SchemaValidator for MockValidator {
        fn validate(&self, _value: &Value, schema: &JsonSchema) -> ValidationResult {
            let is_params = schema.description.as_deref() == Some("params");
            if !is_params {
                *self.calls.lock().unwrap() += 1;
            }
            let fail = if is_params {
                self.reject_args
            } else {
                self.strict.load(Ordering::SeqCst)
            };
            if fail {
                ValidationResult::from_issues(vec![ValidationIssue {
                    path: "$.taskId".to_string(),
                    message: "required field missing".to_string(),
                }])
            } else {
                ValidationResult::from_issues(vec![])
            }
        }
    }

    /// An audit sink that assigns sequential ids and keeps every entry.
    struct MockAudit {
        entries: Arc<Mutex<Vec<LogEntry>>>,
    }

    impl MockAudit {
        fn new() -> Self {
            Self {
                entries: Arc::new(Mutex::new(vec![])),
            }
        }
    }

    impl AuditSink for MockAudit {
        fn append(&self, draft: LogDraft) -> WardenResult<LogEntry> {
            let mut entries = self.entries.lock().unwrap();
            let entry = LogEntry::from_draft(entries.len() as u64, Utc::now(), draft);
            entries.push(entry.clone());
            Ok(entry)
        }
    }

    enum ProviderMode {
        Answer(ProviderOutput),
        Fail,
        Hang,
    }

    /// A provider that tracks how many times it was called.
    struct MockProvider {
        mode: ProviderMode,
        calls: Arc<Mutex<Vec<ProviderRequest>>>,
    }

    impl MockProvider {
        fn answering(output: ProviderOutput) -> Self {
            Self {
                mode: ProviderMode::Answer(output),
                calls: Arc::new(Mutex::new(vec![])),
            }
        }

        fn with_mode(mode: ProviderMode) -> Self {
            Self {
                mode,
                calls: Arc::new(Mutex::new(vec![])),
            }
        }
    }

    #[async_trait]
    impl ModelProvider for MockProvider {
        async fn generate_structured_output(
            &self,
            request: &ProviderRequest,
        ) -> WardenResult<ProviderOutput> {
            self.calls.lock().unwrap().push(request.clone());
            match &self.mode {
                ProviderMode::Answer(output) => Ok(output.clone()),
                ProviderMode::Fail => Err(WardenError::ConfigError {
                    reason: "vendor returned HTTP 503".to_string(),
                }),
                ProviderMode::Hang => {
                    tokio::time::sleep(Duration::from_secs(30)).await;
                    Ok(proposal(&[]))
                }
            }
        }
    }

    /// An executor that records every invocation and fails named tools.
    struct MockExecutor {
        invoked: Arc<Mutex<Vec<String>>>,
        failing: Vec<String>,
    }

    impl MockExecutor {
        fn new() -> Self {
            Self {
                invoked: Arc::new(Mutex::new(vec![])),
                failing: vec![],
            }
        }
    }

    #[async_trait]
    impl ToolExecutor for MockExecutor {
        async fn execute(&self, call: &ToolCall) -> WardenResult<Value> {
            assert_eq!(
                call.status(),
                ToolCallStatus::Approved,
                "executor must only ever see approved calls"
            );
            self.invoked.lock().unwrap().push(call.tool_name.clone());
            if self.failing.contains(&call.tool_name) {
                return Err(WardenError::ToolExecution {
                    tool: call.tool_name.clone(),
                    reason: "backend unavailable".to_string(),
                });
            }
            Ok(json!({ "ok": call.tool_name }))
        }
    }

    struct Harness {
        orchestrator: Orchestrator,
        provider_calls: Arc<Mutex<Vec<ProviderRequest>>>,
        invoked: Arc<Mutex<Vec<String>>>,
        audit_entries: Arc<Mutex<Vec<LogEntry>>>,
        strict: Arc<AtomicBool>,
        validations: Arc<Mutex<u32>>,
    }

    fn harness_with(provider: MockProvider, executor: MockExecutor, validator: MockValidator) -> Harness {
        let policy = MockPolicy {
            tools: vec![
                tool("listTasks", &["read:tasks"]),
                tool("getTask", &["read:tasks"]),
                tool("updateTask", &["write:tasks"]),
                tool("createTask", &["write:tasks"]),
            ],
        };
        let agents = AgentDirectory::new(vec![
            agent("reader", "model-a", &["listTasks", "getTask", "updateTask"], &["read:tasks"]),
            agent(
                "writer",
                "model-a",
                &["listTasks", "updateTask", "createTask"],
                &["read:tasks", "write:tasks"],
            ),
        ])
        .unwrap();
        let mut schemas = BTreeMap::new();
        schemas.insert("Out".to_string(), JsonSchema::object());

        let provider_calls = provider.calls.clone();
        let invoked = executor.invoked.clone();
        let audit = MockAudit::new();
        let audit_entries = audit.entries.clone();
        let strict = validator.strict.clone();
        let validations = validator.calls.clone();

        let orchestrator = Orchestrator::new(
            Arc::new(policy),
            Arc::new(validator),
            Arc::new(agents),
            Arc::new(SchemaCatalog::new(schemas)),
            ProviderTable::new().with("model-a", Arc::new(provider)),
            Arc::new(executor),
            Arc::new(audit),
        );

        Harness {
            orchestrator,
            provider_calls,
            invoked,
            audit_entries,
            strict,
            validations,
        }
    }

    fn harness(provider: MockProvider) -> Harness {
        harness_with(provider, MockExecutor::new(), MockValidator::passing())
    }

    // ── Configuration errors ──────────────────────────────────────────────────

    /// An unknown agent fails immediately: no provider call, no audit entries.
    #[tokio::test]
    async fn test_unknown_agent_is_fatal_and_silent() {
        let h = harness(MockProvider::answering(proposal(&["listTasks"])));

        let result = h
            .orchestrator
            .run_discussion(&RunRequest::new("ghost", "hello"))
            .await;

        match result {
            Err(WardenError::UnknownAgent { name }) => assert_eq!(name, "ghost"),
            other => panic!("expected UnknownAgent, got {:?}", other),
        }
        assert!(h.provider_calls.lock().unwrap().is_empty());
        assert!(h.audit_entries.lock().unwrap().is_empty());
    }

    /// An unregistered model override fails before any entry is written.
    #[tokio::test]
    async fn test_unknown_model_is_fatal_and_silent() {
        let h = harness(MockProvider::answering(proposal(&[])));

        let request = RunRequest::new("reader", "hello").with_model("model-z");
        match h.orchestrator.run_discussion(&request).await {
            Err(WardenError::UnknownModel { model_id }) => assert_eq!(model_id, "model-z"),
            other => panic!("expected UnknownModel, got {:?}", other),
        }
        assert!(h.audit_entries.lock().unwrap().is_empty());
    }

    // ── Discussion phase ──────────────────────────────────────────────────────

    /// The provider only ever sees the tools the agent may legally call.
    #[tokio::test]
    async fn test_provider_sees_only_permitted_tools() {
        let h = harness(MockProvider::answering(proposal(&[])));

        h.orchestrator
            .run_discussion(&RunRequest::new("reader", "what is open?"))
            .await
            .unwrap();

        let calls = h.provider_calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        let names: Vec<&str> = calls[0].tools.iter().map(|t| t.name.as_str()).collect();
        // updateTask is allow-listed but needs write:tasks.
        assert_eq!(names, vec!["listTasks", "getTask"]);
        assert_eq!(calls[0].user_prompt, "what is open?");
        assert_eq!(calls[0].system_prompt, "You manage tasks.");
    }

    /// A permission-blocked call is rejected and logged; nothing executes.
    #[tokio::test]
    async fn test_missing_permission_blocks_call() {
        let h = harness(MockProvider::answering(proposal(&["listTasks", "updateTask"])));

        let discussion = h
            .orchestrator
            .run_discussion(&RunRequest::new("reader", "close T-1"))
            .await
            .unwrap();

        let calls = &discussion.result().tool_calls;
        assert_eq!(calls[0].status(), ToolCallStatus::Approved);
        assert_eq!(calls[1].status(), ToolCallStatus::Rejected);
        assert_eq!(discussion.approved_calls().len(), 1);
        assert_eq!(discussion.blocked_calls().len(), 1);

        let blocked: Vec<&LogEntry> = discussion
            .logs()
            .iter()
            .filter(|e| e.entry_type == LogEntryType::Blocked)
            .collect();
        assert_eq!(blocked.len(), 1);
        assert_eq!(blocked[0].message, "BLOCKED: Agent lacks permissions: [write:tasks]");

        assert!(h.invoked.lock().unwrap().is_empty(), "discussion must never execute tools");
    }

    /// An invented tool is rejected as not-in-registry.
    #[tokio::test]
    async fn test_hallucinated_tool_is_rejected() {
        let h = harness(MockProvider::answering(proposal(&["dropDatabase"])));

        let discussion = h
            .orchestrator
            .run_discussion(&RunRequest::new("writer", "clean up"))
            .await
            .unwrap();

        let call = &discussion.result().tool_calls[0];
        assert_eq!(call.status(), ToolCallStatus::Rejected);
        assert!(matches!(call.block_reason(), Some(BlockReason::NotInRegistry { .. })));
        assert!(discussion
            .logs()
            .iter()
            .any(|e| e.message.contains("not found in registry")));
    }

    /// Discussion logs follow the pipeline order and carry run metadata.
    #[tokio::test]
    async fn test_discussion_log_order() {
        let mut output = proposal(&["listTasks"]);
        output.reasoning = Some("the board needs a look".to_string());
        let h = harness(MockProvider::answering(output));

        let discussion = h
            .orchestrator
            .run_discussion(&RunRequest::new("reader", "hi"))
            .await
            .unwrap();

        let kinds: Vec<LogEntryType> = discussion.logs().iter().map(|e| e.entry_type).collect();
        assert_eq!(
            kinds,
            vec![
                LogEntryType::Plan,
                LogEntryType::Plan,
                LogEntryType::ToolCall,
                LogEntryType::Validation,
            ]
        );
        assert_eq!(discussion.logs()[0].message, "Permitted tools: [listTasks, getTask]");
        assert!(discussion.logs().iter().all(|e| e.agent_name == "reader"
            && e.model_id == "model-a"
            && e.run_id == discussion.run_id()));
        assert_eq!(discussion.state(), RunState::AwaitingConfirmation);
        assert!(discussion.validation_passed());
    }

    /// Provider errors are logged and returned; no calls are classified.
    #[tokio::test]
    async fn test_provider_failure_is_fatal() {
        let h = harness(MockProvider::with_mode(ProviderMode::Fail));

        match h.orchestrator.run_discussion(&RunRequest::new("reader", "hi")).await {
            Err(WardenError::Provider { model_id, reason }) => {
                assert_eq!(model_id, "model-a");
                assert!(reason.contains("HTTP 503"), "unexpected reason: {reason}");
            }
            other => panic!("expected Provider error, got {:?}", other),
        }

        let entries = h.audit_entries.lock().unwrap();
        assert_eq!(entries.last().unwrap().entry_type, LogEntryType::Error);
        assert!(!entries.iter().any(|e| e.entry_type == LogEntryType::ToolCall));
    }

    /// A provider that never answers is cut off by the configured timeout.
    #[tokio::test]
    async fn test_provider_timeout() {
        let h = harness(MockProvider::with_mode(ProviderMode::Hang));
        let orchestrator = h.orchestrator.with_settings(OrchestratorSettings {
            provider_timeout_ms: 20,
            ..OrchestratorSettings::default()
        });

        match orchestrator.run_discussion(&RunRequest::new("reader", "hi")).await {
            Err(WardenError::ProviderTimeout { timeout_ms, .. }) => assert_eq!(timeout_ms, 20),
            other => panic!("expected ProviderTimeout, got {:?}", other),
        }
    }

    /// `success = false` from a provider is treated as a provider failure.
    #[tokio::test]
    async fn test_unsuccessful_generation_is_provider_error() {
        let mut output = proposal(&["listTasks"]);
        output.success = false;
        let h = harness(MockProvider::answering(output));

        let result = h.orchestrator.run_discussion(&RunRequest::new("reader", "hi")).await;
        assert!(matches!(result, Err(WardenError::Provider { .. })));
    }

    /// With argument validation on, malformed arguments block the call.
    #[tokio::test]
    async fn test_invalid_arguments_block_call() {
        let validator = MockValidator {
            reject_args: true,
            ..MockValidator::passing()
        };
        let h = harness_with(
            MockProvider::answering(proposal(&["listTasks"])),
            MockExecutor::new(),
            validator,
        );

        let discussion = h
            .orchestrator
            .run_discussion(&RunRequest::new("reader", "hi"))
            .await
            .unwrap();

        let call = &discussion.result().tool_calls[0];
        assert_eq!(call.status(), ToolCallStatus::Rejected);
        assert!(matches!(call.block_reason(), Some(BlockReason::InvalidArguments { .. })));
    }

    /// Non-object arguments are blocked even with argument validation off.
    #[tokio::test]
    async fn test_non_object_arguments_always_blocked() {
        let mut output = proposal(&[]);
        output.tool_calls = vec![ProposedToolCall::new("listTasks", json!("all of them"))];
        let h = harness(MockProvider::answering(output));
        let orchestrator = h.orchestrator.with_settings(OrchestratorSettings {
            validate_arguments: false,
            ..OrchestratorSettings::default()
        });
        let request = RunRequest::new("reader", "hi");

        let discussion = orchestrator.run_discussion(&request).await.unwrap();
        let call = &discussion.result().tool_calls[0];
        assert_eq!(call.status(), ToolCallStatus::Rejected);
        match call.block_reason() {
            Some(BlockReason::InvalidArguments { errors }) => {
                assert_eq!(errors.len(), 1);
                assert_eq!(errors[0].to_string(), "$: expected object, got string");
            }
            other => panic!("expected InvalidArguments, got {:?}", other),
        }

        let execution = orchestrator
            .run_execution(discussion.confirm(), &request)
            .await
            .unwrap();
        assert!(execution.executed_calls().is_empty());
        assert!(h.invoked.lock().unwrap().is_empty());
    }

    // ── Execution phase ───────────────────────────────────────────────────────

    /// A confirmed plan executes approved calls, in order, and only those.
    #[tokio::test]
    async fn test_execution_runs_approved_calls_in_order() {
        let h = harness(MockProvider::answering(proposal(&[
            "createTask",
            "dropDatabase",
            "updateTask",
        ])));
        let request = RunRequest::new("writer", "plan the sprint");

        let discussion = h.orchestrator.run_discussion(&request).await.unwrap();
        let execution = h
            .orchestrator
            .run_execution(discussion.confirm(), &request)
            .await
            .unwrap();

        assert_eq!(
            *h.invoked.lock().unwrap(),
            vec!["createTask".to_string(), "updateTask".to_string()]
        );
        assert_eq!(execution.state(), RunState::Completed);
        assert_eq!(execution.executed_calls().len(), 2);
        assert_eq!(execution.blocked_calls().len(), 1);
        assert_eq!(
            execution.result().tool_calls[0].result(),
            Some(&json!({ "ok": "createTask" }))
        );

        // Logs are merged: discussion entries first, ids strictly increasing.
        let ids: Vec<u64> = execution.logs().iter().map(|e| e.id).collect();
        assert!(ids.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(
            execution
                .logs()
                .iter()
                .filter(|e| e.entry_type == LogEntryType::Execution)
                .count(),
            2
        );
    }

    /// Re-validation runs from scratch: if it fails, nothing executes and the
    /// approved calls stay approved.
    #[tokio::test]
    async fn test_revalidation_failure_aborts_execution() {
        let h = harness(MockProvider::answering(proposal(&["createTask", "updateTask"])));
        let request = RunRequest::new("writer", "plan");

        let discussion = h.orchestrator.run_discussion(&request).await.unwrap();
        assert!(discussion.validation_passed());
        assert_eq!(*h.validations.lock().unwrap(), 1);

        // The validator now disagrees with the Discussion verdict.
        h.strict.store(true, Ordering::SeqCst);
        let discussion_entries = discussion.logs().len();

        let execution = h
            .orchestrator
            .run_execution(discussion.confirm(), &request)
            .await
            .unwrap();

        assert_eq!(*h.validations.lock().unwrap(), 2, "execution must re-validate");
        assert_eq!(execution.state(), RunState::Aborted);
        assert!(!execution.validation_passed());
        assert!(h.invoked.lock().unwrap().is_empty());
        assert!(execution
            .result()
            .tool_calls
            .iter()
            .all(|c| c.status() == ToolCallStatus::Approved));

        let execution_entries = &execution.logs()[discussion_entries..];
        assert_eq!(
            execution_entries
                .iter()
                .filter(|e| e.entry_type == LogEntryType::Error)
                .count(),
            1
        );
    }

    /// One failing tool does not stop its siblings.
    #[tokio::test]
    async fn test_tool_failure_is_isolated() {
        let executor = MockExecutor {
            failing: vec!["createTask".to_string()],
            ..MockExecutor::new()
        };
        let h = harness_with(
            MockProvider::answering(proposal(&["createTask", "updateTask"])),
            executor,
            MockValidator::passing(),
        );
        let request = RunRequest::new("writer", "plan");

        let discussion = h.orchestrator.run_discussion(&request).await.unwrap();
        let execution = h
            .orchestrator
            .run_execution(discussion.confirm(), &request)
            .await
            .unwrap();

        assert_eq!(h.invoked.lock().unwrap().len(), 2);
        assert_eq!(execution.state(), RunState::Completed);

        let calls = &execution.result().tool_calls;
        assert_eq!(calls[0].status(), ToolCallStatus::Approved);
        assert!(calls[0].error().unwrap().contains("backend unavailable"));
        assert_eq!(calls[1].status(), ToolCallStatus::Executed);
        assert_eq!(execution.failed_calls().len(), 1);
    }

    /// A confirmed plan cannot be executed under another agent's request.
    #[tokio::test]
    async fn test_execution_rejects_mismatched_request() {
        let h = harness(MockProvider::answering(proposal(&["createTask"])));

        let discussion = h
            .orchestrator
            .run_discussion(&RunRequest::new("writer", "plan"))
            .await
            .unwrap();
        let result = h
            .orchestrator
            .run_execution(discussion.confirm(), &RunRequest::new("reader", "plan"))
            .await;

        assert!(matches!(result, Err(WardenError::ConfigError { .. })));
        assert!(h.invoked.lock().unwrap().is_empty());
    }

    // ── Concurrency ───────────────────────────────────────────────────────────

    /// Concurrent runs share one orchestrator; audit ids never collide.
    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_runs_share_orchestrator() {
        let h = harness(MockProvider::answering(proposal(&["listTasks", "updateTask"])));
        let orchestrator = Arc::new(h.orchestrator);

        let mut handles = Vec::new();
        for i in 0..8 {
            let orchestrator = Arc::clone(&orchestrator);
            handles.push(tokio::spawn(async move {
                let request = RunRequest::new("writer", format!("run {i}"));
                let discussion = orchestrator.run_discussion(&request).await?;
                orchestrator.run_execution(discussion.confirm(), &request).await
            }));
        }

        for handle in handles {
            let execution = handle.await.unwrap().unwrap();
            assert_eq!(execution.executed_calls().len(), 2);
        }

        let entries = h.audit_entries.lock().unwrap();
        let unique: BTreeSet<u64> = entries.iter().map(|e| e.id).collect();
        assert_eq!(unique.len(), entries.len());
        assert_eq!(h.invoked.lock().unwrap().len(), 16);
    }
}
