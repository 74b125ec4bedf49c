//! WARDEN Task-Management Reference Deployment: Demo CLI
//!
//! Runs one or all of the four reference scenarios, or lists the tools an
//! agent of a catalog would be shown. Each scenario uses real WARDEN
//! components (tool registry, subset validator, hash-chained audit log,
//! orchestrator) with a scripted model and a mock task board.
//!
//! Usage:
//!   cargo run -p demo -- run-all
//!   cargo run -p demo -- permission-block
//!   cargo run -p demo -- hallucinated-tool
//!   cargo run -p demo -- invalid-output
//!   cargo run -p demo -- confirmed-run
//!   cargo run -p demo -- tools --agent task-analyst [--config path/to/catalog.toml]

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use warden_contracts::error::WardenResult;
use warden_policy::catalog::Catalog;
use warden_ref_tasks::{
    scenarios::{confirmed_run, hallucinated_tool, invalid_output, permission_block},
    TASKS_CATALOG,
};

// ── CLI definition ────────────────────────────────────────────────────────────

/// WARDEN: permission-gated, two-phase AI orchestration demo.
#[derive(Parser)]
#[command(
    name = "demo",
    about = "WARDEN task-management reference demo",
    long_about = "Runs WARDEN reference scenarios showing tool visibility, permission\n\
                  enforcement, output validation, confirmed execution, and audit chain integrity."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run all four scenarios in sequence.
    RunAll,
    /// Scenario 1: a read-only agent proposes a write.
    PermissionBlock,
    /// Scenario 2: the model invents a tool.
    HallucinatedTool,
    /// Scenario 3: invalid output aborts a confirmed Execution.
    InvalidOutput,
    /// Scenario 4: confirmed run with one isolated tool failure.
    ConfirmedRun,
    /// List the tools an agent would be shown during Discussion.
    Tools {
        /// Agent name as declared in the catalog.
        #[arg(long)]
        agent: String,
        /// Catalog TOML file. Defaults to the bundled task catalog.
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() {
    // Initialize structured logging.  Set RUST_LOG=debug for verbose output.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();

    let is_scenario = !matches!(cli.command, Command::Tools { .. });
    if is_scenario {
        print_banner();
    }

    let result = match cli.command {
        Command::RunAll => run_all().await,
        Command::PermissionBlock => permission_block::run_scenario().await,
        Command::HallucinatedTool => hallucinated_tool::run_scenario().await,
        Command::InvalidOutput => invalid_output::run_scenario().await,
        Command::ConfirmedRun => confirmed_run::run_scenario().await,
        Command::Tools { agent, config } => list_tools(&agent, config),
    };

    match result {
        Ok(()) => {
            if is_scenario {
                println!("All selected scenarios completed successfully.");
            }
        }
        Err(e) => {
            eprintln!("Demo error: {}", e);
            std::process::exit(1);
        }
    }
}

// ── Scenario dispatch ─────────────────────────────────────────────────────────

async fn run_all() -> WardenResult<()> {
    permission_block::run_scenario().await?;
    hallucinated_tool::run_scenario().await?;
    invalid_output::run_scenario().await?;
    confirmed_run::run_scenario().await?;
    Ok(())
}

// ── Tool listing ──────────────────────────────────────────────────────────────

fn list_tools(agent: &str, config: Option<PathBuf>) -> WardenResult<()> {
    let catalog = match &config {
        Some(path) => {
            debug!(path = %path.display(), "loading catalog file");
            Catalog::from_file(path)?
        }
        None => Catalog::from_toml_str(TASKS_CATALOG)?,
    };

    let tools = catalog.visible_tools(agent)?;
    println!("Tools visible to '{agent}' ({}):", tools.len());
    for tool in tools {
        println!("  {:<16} {}", tool.name, tool.description);
    }
    Ok(())
}

// ── Banner ────────────────────────────────────────────────────────────────────

fn print_banner() {
    println!();
    println!("WARDEN: Permission-gated AI Orchestration");
    println!("Task-Management Reference Demo");
    println!("==========================================");
    println!();
    println!("WARDEN run model:");
    println!("  Discussion  [1] Show the model only the tools the agent may call");
    println!("              [2] Classify every proposed call: approved or BLOCKED");
    println!("              [3] Validate the proposed data against the output schema");
    println!("  Execution   [4] Re-validate from scratch; abort on failure");
    println!("              [5] Execute approved calls in order; failures stay isolated");
    println!("  Every decision is appended to a SHA-256 hash-chained audit log.");
    println!();
}
