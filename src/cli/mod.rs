//! Command-line interface for convoke.
//!
//! Provides commands for running an orchestration against a tool manifest,
//! listing the registered tools, and health-checking their backends.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde_json::{Map, Value};

use crate::config::{EngineConfig, ToolManifest};
use crate::core::{ExecutionStrategy, Orchestrator, PerformanceTracker};
use crate::domain::{OrchestrationRequest, SelectionStrategy, TaskType};
use crate::oracle::CommandOracle;

/// convoke - dependency-aware tool orchestration engine
#[derive(Parser, Debug)]
#[command(name = "convoke")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Tool manifest path (overrides the config file)
    #[arg(short, long, global = true)]
    pub manifest: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run one orchestration and print the JSON report
    Run {
        /// Free-text task description
        description: String,

        /// Broad class of task
        #[arg(short, long, value_enum, default_value = "general")]
        task_type: TaskTypeArg,

        /// Tool selection strategy
        #[arg(short, long, value_enum, default_value = "comprehensive")]
        strategy: StrategyArg,

        /// Pin the execution strategy instead of auto-detecting
        #[arg(short, long, value_enum)]
        execution: Option<ExecutionArg>,

        /// Maximum number of tools to select
        #[arg(long)]
        max_tools: Option<usize>,

        /// Per-tool timeout in seconds
        #[arg(long)]
        timeout: Option<u64>,

        /// Stop scheduling later waves once a tool has ultimately failed
        #[arg(long)]
        stop_on_error: bool,

        /// Task parameter as key=value (repeatable)
        #[arg(short, long = "param")]
        params: Vec<String>,

        /// Preferred tool name, moved to the front of the candidates (repeatable)
        #[arg(long = "prefer")]
        preferred: Vec<String>,

        /// Ask the oracle for a narrative synthesis
        #[arg(long)]
        narrative: bool,
    },

    /// List the tools declared in the manifest
    Tools,

    /// Health-check every tool backend in the manifest
    Check,
}

/// CLI mirror of `TaskType`
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum TaskTypeArg {
    Reconnaissance,
    Scanning,
    Osint,
    Analysis,
    Reporting,
    General,
}

impl From<TaskTypeArg> for TaskType {
    fn from(arg: TaskTypeArg) -> Self {
        match arg {
            TaskTypeArg::Reconnaissance => TaskType::Reconnaissance,
            TaskTypeArg::Scanning => TaskType::Scanning,
            TaskTypeArg::Osint => TaskType::Osint,
            TaskTypeArg::Analysis => TaskType::Analysis,
            TaskTypeArg::Reporting => TaskType::Reporting,
            TaskTypeArg::General => TaskType::General,
        }
    }
}

/// CLI mirror of `SelectionStrategy`
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum StrategyArg {
    Comprehensive,
    Efficient,
    Reliable,
    CostOptimized,
}

impl From<StrategyArg> for SelectionStrategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::Comprehensive => SelectionStrategy::Comprehensive,
            StrategyArg::Efficient => SelectionStrategy::Efficient,
            StrategyArg::Reliable => SelectionStrategy::Reliable,
            StrategyArg::CostOptimized => SelectionStrategy::CostOptimized,
        }
    }
}

/// CLI mirror of `ExecutionStrategy`
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ExecutionArg {
    Parallel,
    Sequential,
    Hybrid,
    Adaptive,
}

impl From<ExecutionArg> for ExecutionStrategy {
    fn from(arg: ExecutionArg) -> Self {
        match arg {
            ExecutionArg::Parallel => ExecutionStrategy::Parallel,
            ExecutionArg::Sequential => ExecutionStrategy::Sequential,
            ExecutionArg::Hybrid => ExecutionStrategy::Hybrid,
            ExecutionArg::Adaptive => ExecutionStrategy::Adaptive,
        }
    }
}

impl Cli {
    /// Execute the parsed command
    pub async fn execute(self) -> Result<()> {
        let config = EngineConfig::load()?;
        let manifest = self.load_manifest(&config)?;

        match self.command {
            Commands::Run {
                description,
                task_type,
                strategy,
                execution,
                max_tools,
                timeout,
                stop_on_error,
                params,
                preferred,
                narrative,
            } => {
                let catalog = Arc::new(manifest.build_catalog()?);
                let tracker = Arc::new(PerformanceTracker::new(config.retention_days));

                let orchestrator = match &config.oracle_binary {
                    Some(binary) => Orchestrator::with_oracle(
                        catalog,
                        tracker,
                        Arc::new(CommandOracle::new(binary.clone())),
                    ),
                    None => Orchestrator::new(catalog, tracker),
                };

                let mut request = OrchestrationRequest::new(task_type.into(), description);
                request.strategy = strategy.into();
                request.max_tools = max_tools.unwrap_or(config.max_tools);
                request.timeout_secs = timeout.unwrap_or(config.default_timeout_secs);
                request.stop_on_error = stop_on_error;
                request.params = parse_params(&params)?;
                request.preferred_tools = preferred;
                request.synthesize_narrative = narrative;

                let report = orchestrator
                    .run(request, execution.map(ExecutionStrategy::from))
                    .await;

                println!("{}", serde_json::to_string_pretty(&report)?);

                if !report.success {
                    anyhow::bail!("Orchestration produced no successful tool result");
                }
                Ok(())
            }

            Commands::Tools => {
                for tool in &manifest.tools {
                    let meta = &tool.metadata;
                    println!(
                        "{:<24} {:?} ({:?}, {:?}{})",
                        meta.name,
                        meta.category,
                        meta.execution_mode,
                        meta.cost_tier,
                        if meta.requires_auth { ", auth" } else { "" }
                    );
                }
                Ok(())
            }

            Commands::Check => {
                let catalog = manifest.build_catalog()?;
                let mut failures = 0usize;
                for name in catalog.names() {
                    let adapter = catalog
                        .adapter(&name)
                        .context("adapter vanished from catalog")?;
                    match adapter.health_check().await {
                        Ok(()) => println!("{:<24} ok", name),
                        Err(e) => {
                            failures += 1;
                            println!("{:<24} FAILED: {e:#}", name);
                        }
                    }
                }
                if failures > 0 {
                    anyhow::bail!("{failures} tool backend(s) failed their health check");
                }
                Ok(())
            }
        }
    }

    fn load_manifest(&self, config: &EngineConfig) -> Result<ToolManifest> {
        let path = self
            .manifest
            .clone()
            .or_else(|| config.manifest.clone())
            .context("No tool manifest: pass --manifest or set `manifest` in convoke.yaml")?;
        ToolManifest::from_file(&path)
    }
}

/// Parse repeated key=value arguments into a params map
fn parse_params(pairs: &[String]) -> Result<Map<String, Value>> {
    let mut params = Map::new();
    for pair in pairs {
        let (key, value) = pair
            .split_once('=')
            .with_context(|| format!("Invalid --param '{pair}', expected key=value"))?;
        // Values that parse as JSON keep their type; everything else is a string.
        let value = serde_json::from_str(value)
            .unwrap_or_else(|_| Value::String(value.to_string()));
        params.insert(key.to_string(), value);
    }
    Ok(params)
}
