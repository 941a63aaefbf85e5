//! `replay` subcommand: scripted command sequences against the simulated engine
//!
//! A script is a TOML file with one `[[step]]` table per command:
//!
//! ```toml
//! [[step]]
//! name = "createTracker"
//! param = { uri = "project-dir:car.vl" }
//! latency_ms = 200
//!
//! [[step]]
//! name = "resetHard"
//! wait = true
//! ```
//!
//! Steps are pushed back to back, so a reset can abort earlier steps. A
//! step with `wait = true` waits for everything pushed so far before the
//! next step is pushed.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tracing::{error, info, warn};
use tracklink_command::{
    Command, CommandError, CommandWarnings, IssueCode, PendingCommand, SimulatedEngine,
    SimulatedEngineConfig, Worker, WorkerConfig,
};

use crate::config::ConsoleConfig;

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Script {
    #[serde(default, rename = "step")]
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Step {
    /// Command name
    pub name: String,
    /// Command parameters
    pub param: Option<toml::Value>,
    /// Scope the command to this anchor
    pub anchor: Option<String>,
    /// JSON the engine answers with
    pub response: Option<String>,
    /// Error code the engine fails the command with
    pub error_code: Option<i32>,
    pub latency_ms: Option<u64>,
    #[serde(default)]
    pub wait: bool,
}

impl Script {
    pub fn parse(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("parsing {}", path.display()))
    }
}

impl Step {
    fn command(&self) -> Result<Command> {
        let mut command = Command::new(&self.name);
        if let Some(param) = &self.param {
            command = command.with_param(param)?;
        }
        Ok(match &self.anchor {
            Some(anchor) => Command::anchored(anchor, command),
            None => command,
        })
    }

    fn is_scripted(&self) -> bool {
        self.response.is_some() || self.error_code.is_some() || self.latency_ms.is_some()
    }

    /// Replace the engine's handler for this command with the scripted answer
    fn script_engine(&self, engine: &SimulatedEngine) {
        let latency = Duration::from_millis(self.latency_ms.unwrap_or(0));
        let response = self.response.clone().unwrap_or_default();
        let error = self
            .error_code
            .map(|code| CommandError::new(IssueCode(code), self.name.clone()));

        engine.register_fn(self.name.clone(), move |_command| {
            let response = response.clone();
            let error = error.clone();
            async move {
                if !latency.is_zero() {
                    tokio::time::sleep(latency).await;
                }
                match error {
                    Some(error) => Err(error),
                    None => Ok(response),
                }
            }
        });
    }
}

/// Counts of how the replayed steps ended
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReplayReport {
    pub succeeded: usize,
    pub canceled: usize,
    pub warnings: usize,
}

pub async fn run(script: &Script, config: &ConsoleConfig) -> Result<ReplayReport> {
    let engine = SimulatedEngine::start(
        SimulatedEngineConfig::new().with_default_latency(config.default_latency),
    );
    let worker = Worker::with_config(
        engine.clone(),
        WorkerConfig::new().with_name(config.worker_name.clone()),
    );
    worker.start()?;

    let mut report = ReplayReport::default();
    let mut in_flight: Vec<(usize, String, PendingCommand)> = Vec::new();

    for (index, step) in script.steps.iter().enumerate() {
        if step.is_scripted() {
            step.script_engine(&engine);
        }
        let pending = worker.push_command(step.command()?);
        info!(step = index, command = %step.name, anchor = ?step.anchor, "Pushed");
        in_flight.push((index, step.name.clone(), pending));

        if step.wait {
            settle(&mut in_flight, &mut report).await?;
        }
    }
    settle(&mut in_flight, &mut report).await?;

    worker.dispose();
    engine.shutdown();
    Ok(report)
}

/// Await everything in flight, in submission order
async fn settle(
    in_flight: &mut Vec<(usize, String, PendingCommand)>,
    report: &mut ReplayReport,
) -> Result<()> {
    for (index, name, pending) in in_flight.drain(..) {
        match pending.await {
            Ok(response) => {
                report.succeeded += 1;
                info!(step = index, command = %name, response = %response, "Succeeded");

                if let Ok(warnings) = serde_json::from_str::<CommandWarnings>(&response) {
                    for warning in &warnings {
                        warn!(
                            step = index,
                            command = %name,
                            code = %warning.code,
                            "{}",
                            warning.describe()
                        );
                    }
                    report.warnings += warnings.len();
                }
            }
            Err(e) if e.is_canceled() => {
                report.canceled += 1;
                warn!(step = index, command = %name, "Canceled");
            }
            Err(e) => {
                error!(step = index, command = %name, error = %e, "Failed");
                return Err(anyhow::Error::new(e).context(format!("step {index} ({name}) failed")));
            }
        }
    }
    Ok(())
}
