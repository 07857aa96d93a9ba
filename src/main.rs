//! # Account Plan Agent
//!
//! Researches a company on the web, checks the findings for contradictions,
//! asks a human when sources disagree, and writes a markdown account plan.
//!
//! ## Quick Start
//! ```bash
//! cargo run -- "Acme Corp"
//! ```

// =============================================================================
// MODULE DECLARATIONS
// =============================================================================

/// Configuration management
mod config;

/// Orchestrator wiring
mod agent;

// =============================================================================
// IMPORTS
// =============================================================================
use anyhow::{Context, Result};
use clap::Parser;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use rig_account_planner::{render_mermaid, AgentState, Resolution, ResearchOrchestrator, RunResult};

use crate::agent::build_orchestrator;
use crate::config::{Config, Provider};

/// Findings shown in the preview before the report
const FINDINGS_PREVIEW: usize = 5;

// =============================================================================
// CLI ARGUMENTS
// =============================================================================
#[derive(Parser, Debug)]
#[command(
    name = "account-plan-agent",
    version,
    about = "Researches a company and writes an account plan, pausing for review when sources conflict",
    long_about = r#"
Account Plan Agent

Runs a four-stage workflow for one company:
  1. Research: four web searches (overview, news, financials, competitors)
  2. Review: an LLM checks the findings for contradictions
  3. Human review: when a conflict is found, you decide how to continue
  4. Write: an LLM drafts the account plan in markdown

ENVIRONMENT:
  TAVILY_API_KEY                  Web search
  GOOGLE_API_KEY / GEMINI_API_KEY Gemini (default provider)
  OPENAI_API_KEY                  OpenAI (LLM_PROVIDER=openai)

EXAMPLES:
  account-plan-agent "Acme Corp"
  account-plan-agent --provider openai --resolution proceed "Acme Corp"
  account-plan-agent --checkpoint-dir ./runs --json "Acme Corp"
  account-plan-agent --graph
"#
)]
struct Args {
    /// Company to research; read from stdin when omitted
    #[arg(value_name = "COMPANY")]
    company: Option<String>,

    /// LLM provider (overrides LLM_PROVIDER)
    #[arg(short = 'p', long = "provider", value_name = "gemini|openai")]
    provider: Option<String>,

    /// Model name (overrides LLM_MODEL)
    #[arg(short = 'm', long = "model")]
    model: Option<String>,

    /// Persist runs as JSON files in this directory (overrides CHECKPOINT_DIR)
    #[arg(long = "checkpoint-dir", value_name = "DIR")]
    checkpoint_dir: Option<PathBuf>,

    /// Answer for a conflict pause: proceed, stop, or clarification text
    #[arg(short = 'r', long = "resolution")]
    resolution: Option<String>,

    /// Print the run result as JSON
    #[arg(long = "json", default_value = "false")]
    json: bool,

    /// Print the workflow graph as Mermaid and exit
    #[arg(long = "graph", default_value = "false")]
    graph: bool,

    /// Enable debug logging
    #[arg(short = 'v', long = "verbose", default_value = "false")]
    verbose: bool,
}

// =============================================================================
// MAIN FUNCTION
// =============================================================================
#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    if args.graph {
        println!("{}", render_mermaid());
        return Ok(());
    }

    init_logging(args.verbose)?;

    let mut config = Config::from_env()?;
    apply_overrides(&mut config, &args)?;
    config.validate()?;

    info!(
        provider = %config.provider,
        checkpoints = ?config.checkpoint_dir,
        "Configuration loaded"
    );

    let company = match args.company.clone() {
        Some(company) => company,
        None => prompt_line("Enter company name: ")?,
    };
    let company = company.trim().to_string();
    if company.is_empty() {
        anyhow::bail!("Company name cannot be empty");
    }

    let orchestrator = build_orchestrator(&config)?;

    match run(&orchestrator, &company, args.resolution.as_deref()).await {
        Ok(result) => {
            let state = orchestrator
                .snapshot(result.run_id())
                .await?
                .map(|checkpoint| checkpoint.state)
                .unwrap_or_default();

            if args.json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                print_run(&result, &state);
            }
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "Run failed");
            eprintln!("\nRun failed: {:#}", e);
            Err(e)
        }
    }
}

/// Start a run and answer every conflict pause until it finishes.
async fn run(
    orchestrator: &ResearchOrchestrator,
    company: &str,
    preset: Option<&str>,
) -> Result<RunResult> {
    let mut result = orchestrator.start(company).await?;

    while let RunResult::Paused {
        run_id,
        clarification_question,
        conflicting_data,
    } = &result
    {
        eprintln!("\n{}", "=".repeat(60));
        eprintln!("CONFLICT DETECTED");
        eprintln!("{}", "=".repeat(60));
        eprintln!("Question: {}", clarification_question);
        if !conflicting_data.is_empty() {
            eprintln!("\nEvidence:\n{}", conflicting_data);
        }

        let answer = match preset {
            Some(answer) => answer.to_string(),
            None => prompt_line("\nResolution (proceed / stop / clarification text): ")?,
        };
        let resolution: Resolution = answer.parse().context("Invalid resolution")?;
        let run_id = run_id.clone();

        info!(run_id = %run_id, resolution = resolution.as_str(), "Resuming run");
        result = orchestrator.resume(&run_id, resolution).await?;
    }

    Ok(result)
}

fn apply_overrides(config: &mut Config, args: &Args) -> Result<()> {
    if let Some(provider) = &args.provider {
        config.provider = provider.parse::<Provider>()?;
    }
    if let Some(model) = &args.model {
        info!(model = %model, "Using model from command line");
        config.model = model.trim().to_string();
    }
    if let Some(dir) = &args.checkpoint_dir {
        config.checkpoint_dir = Some(dir.clone());
    }
    Ok(())
}

fn prompt_line(prompt: &str) -> Result<String> {
    eprint!("{}", prompt);
    io::stderr().flush()?;

    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read from stdin")?;
    Ok(line.trim().to_string())
}

fn print_run(result: &RunResult, state: &AgentState) {
    println!("\n{}", "=".repeat(60));
    println!("EXECUTION LOG");
    println!("{}", "=".repeat(60));
    for message in &state.messages {
        println!("{}", message);
    }

    if !state.research_data.is_empty() {
        println!("\n{}", "=".repeat(60));
        println!(
            "FINDINGS ({} total, showing {})",
            state.research_data.len(),
            state.research_data.len().min(FINDINGS_PREVIEW)
        );
        println!("{}", "=".repeat(60));
        for finding in state.research_data.iter().take(FINDINGS_PREVIEW) {
            println!("- {} [{}]", finding.title, finding.query);
            if !finding.url.is_empty() {
                println!("  {}", finding.url);
            }
        }
    }

    println!("\n{}", "=".repeat(60));
    println!("ACCOUNT PLAN ({})", result.status());
    println!("{}\n", "=".repeat(60));
    if let Some(report) = result.report() {
        println!("{}", report);
    }
    println!("\n{}", "=".repeat(60));
}

// =============================================================================
// LOGGING INITIALIZATION
// =============================================================================
/// Install the tracing subscriber. `RUST_LOG` wins when set; otherwise
/// `info`, or `debug` with `--verbose`.
fn init_logging(verbose: bool) -> Result<()> {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(true)
        .with_thread_names(false)
        .with_file(false)
        .with_line_number(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow::anyhow!("Failed to set logging subscriber: {}", e))?;

    Ok(())
}
