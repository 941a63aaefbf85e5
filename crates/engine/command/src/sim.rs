//! In-process stand-in for the native tracking engine
//!
//! [`SimulatedEngine`] implements [`NativeBackend`] with a single serial
//! executor task. Responses come from registered [`CommandHandler`]s, each
//! command waits for its configured latency, and `resetSoft`/`resetHard`
//! abort every earlier command that has not completed yet, the way the
//! native engine does.

use crate::backend::{NativeBackend, Rejected, Reply};
use crate::command::{CommandRequest, ANCHOR_COMMAND};
use crate::issue::{CommandError, IssueCode};
use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Commands that abort everything queued before them
const RESET_COMMANDS: [&str; 2] = ["resetSoft", "resetHard"];

/// A command as seen by a simulated handler
#[derive(Debug, Clone, PartialEq)]
pub struct SimulatedCommand {
    /// Name of the executed command, looking through `anchorCommand`
    pub name: String,
    /// Anchor the command is scoped to, if it was wrapped
    pub anchor: Option<String>,
    pub param: Option<Value>,
    /// Size of the binary payload in bytes
    pub binary_len: usize,
}

impl SimulatedCommand {
    fn from_request(request: &CommandRequest) -> Self {
        let parsed = request.parsed().unwrap_or(Value::Null);
        let binary_len = request.binary.as_ref().map_or(0, |b| b.len());

        if request.name == ANCHOR_COMMAND {
            let param = parsed.get("param");
            let content = param.and_then(|p| p.get("content"));
            Self {
                name: content
                    .and_then(|c| c.get("name"))
                    .and_then(Value::as_str)
                    .unwrap_or(ANCHOR_COMMAND)
                    .to_string(),
                anchor: param
                    .and_then(|p| p.get("anchorName"))
                    .and_then(Value::as_str)
                    .map(str::to_string),
                param: content.and_then(|c| c.get("param")).cloned(),
                binary_len,
            }
        } else {
            Self {
                name: request.name.clone(),
                anchor: None,
                param: parsed.get("param").cloned(),
                binary_len,
            }
        }
    }

    pub fn is_reset(&self) -> bool {
        RESET_COMMANDS.contains(&self.name.as_str())
    }
}

/// Produces the engine's answer to one command
#[async_trait]
pub trait CommandHandler: Send + Sync {
    async fn handle(&self, command: SimulatedCommand) -> Result<String, CommandError>;
}

/// Always answers with the same response
struct FixedResponse(String);

#[async_trait]
impl CommandHandler for FixedResponse {
    async fn handle(&self, _command: SimulatedCommand) -> Result<String, CommandError> {
        Ok(self.0.clone())
    }
}

/// Always fails with the same error
struct FixedError(CommandError);

#[async_trait]
impl CommandHandler for FixedError {
    async fn handle(&self, command: SimulatedCommand) -> Result<String, CommandError> {
        let mut error = self.0.clone();
        if error.command_name.is_empty() {
            error.command_name = command.name;
        }
        Err(error)
    }
}

/// A handler backed by an async closure
pub struct FnHandler<F> {
    handler: F,
}

impl<F, Fut> FnHandler<F>
where
    F: Fn(SimulatedCommand) -> Fut + Send + Sync,
    Fut: Future<Output = Result<String, CommandError>> + Send,
{
    pub fn new(handler: F) -> Self {
        Self { handler }
    }
}

#[async_trait]
impl<F, Fut> CommandHandler for FnHandler<F>
where
    F: Fn(SimulatedCommand) -> Fut + Send + Sync,
    Fut: Future<Output = Result<String, CommandError>> + Send,
{
    async fn handle(&self, command: SimulatedCommand) -> Result<String, CommandError> {
        (self.handler)(command).await
    }
}

/// Timing of the simulated engine
#[derive(Debug, Clone, Default)]
pub struct SimulatedEngineConfig {
    /// Latency of commands without an override
    pub default_latency: Duration,
    /// Per-command latency, keyed by executed command name
    pub latencies: HashMap<String, Duration>,
}

impl SimulatedEngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_default_latency(mut self, latency: Duration) -> Self {
        self.default_latency = latency;
        self
    }

    pub fn with_latency(mut self, command: impl Into<String>, latency: Duration) -> Self {
        self.latencies.insert(command.into(), latency);
        self
    }

    pub fn latency_for(&self, command: &str) -> Duration {
        self.latencies
            .get(command)
            .copied()
            .unwrap_or(self.default_latency)
    }
}

struct Job {
    command: SimulatedCommand,
    reply: Reply,
    handler: Option<Arc<dyn CommandHandler>>,
    latency: Duration,
    /// Cancelled by the next reset
    generation: CancellationToken,
}

struct EngineShared {
    config: SimulatedEngineConfig,
    handlers: RwLock<HashMap<String, Arc<dyn CommandHandler>>>,
    queue: Mutex<Option<mpsc::UnboundedSender<Job>>>,
    generation: Mutex<CancellationToken>,
    history: Mutex<Vec<String>>,
}

/// Serial, latency-simulating engine backend
#[derive(Clone)]
pub struct SimulatedEngine {
    shared: Arc<EngineShared>,
}

impl SimulatedEngine {
    /// Spawn the executor task. Must be called inside a tokio runtime.
    pub fn start(config: SimulatedEngineConfig) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(execute_jobs(rx));

        let engine = Self {
            shared: Arc::new(EngineShared {
                config,
                handlers: RwLock::new(HashMap::new()),
                queue: Mutex::new(Some(tx)),
                generation: Mutex::new(CancellationToken::new()),
                history: Mutex::new(Vec::new()),
            }),
        };

        engine.respond("createTracker", r#"{"trackerType":"ModelTracker"}"#);
        engine.respond("createTrackerFromString", r#"{"trackerType":"ModelTracker"}"#);
        for command in ["resetSoft", "resetHard", "runTracking", "pauseTracking"] {
            engine.respond(command, "");
        }
        engine
    }

    pub fn register<H: CommandHandler + 'static>(&self, command: impl Into<String>, handler: H) {
        self.shared
            .handlers
            .write()
            .insert(command.into(), Arc::new(handler));
    }

    pub fn register_fn<F, Fut>(&self, command: impl Into<String>, handler: F)
    where
        F: Fn(SimulatedCommand) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<String, CommandError>> + Send + 'static,
    {
        self.register(command, FnHandler::new(handler));
    }

    /// Answer `command` with a fixed JSON response
    pub fn respond(&self, command: impl Into<String>, response: impl Into<String>) {
        self.register(command, FixedResponse(response.into()));
    }

    /// Fail `command` with a fixed error
    pub fn fail(&self, command: impl Into<String>, error: CommandError) {
        self.register(command, FixedError(error));
    }

    /// Names of the executed commands, in the order they were received
    pub fn history(&self) -> Vec<String> {
        self.shared.history.lock().clone()
    }

    /// Stop accepting commands. Already queued commands still run.
    pub fn shutdown(&self) {
        if self.shared.queue.lock().take().is_some() {
            info!("Simulated engine shut down");
        }
    }

    fn handler_for(
        &self,
        request: &CommandRequest,
        command: &SimulatedCommand,
    ) -> Option<Arc<dyn CommandHandler>> {
        let handlers = self.shared.handlers.read();
        handlers
            .get(&request.name)
            .or_else(|| handlers.get(&command.name))
            .cloned()
    }
}

impl NativeBackend for SimulatedEngine {
    fn push(&self, request: CommandRequest, reply: Reply) -> Result<(), Rejected> {
        let queue = self.shared.queue.lock();
        let Some(tx) = queue.as_ref() else {
            return Err(Rejected("simulated engine is shut down".to_string()));
        };

        let command = SimulatedCommand::from_request(&request);
        let generation = {
            let mut generation = self.shared.generation.lock();
            if command.is_reset() {
                debug!(command = %command.name, "Reset aborts queued commands");
                generation.cancel();
                *generation = CancellationToken::new();
            }
            generation.clone()
        };

        self.shared.history.lock().push(command.name.clone());
        let job = Job {
            handler: self.handler_for(&request, &command),
            latency: self.shared.config.latency_for(&command.name),
            command,
            reply,
            generation,
        };

        tx.send(job)
            .map_err(|_| Rejected("simulated engine executor stopped".to_string()))
    }
}

async fn execute_jobs(mut rx: mpsc::UnboundedReceiver<Job>) {
    while let Some(job) = rx.recv().await {
        let Job {
            command,
            reply,
            handler,
            latency,
            generation,
        } = job;
        let name = command.name.clone();

        if generation.is_cancelled() {
            debug!(command = %name, "Command canceled before it started");
            reply.fail(CommandError::canceled(name));
            continue;
        }

        let run = async move {
            if !latency.is_zero() {
                tokio::time::sleep(latency).await;
            }
            match handler {
                Some(handler) => handler.handle(command).await,
                None => Err(CommandError::new(IssueCode::COMMAND_NOT_SUPPORTED, command.name)
                    .with_info("simulation")),
            }
        };

        tokio::select! {
            biased;
            _ = generation.cancelled() => {
                debug!(command = %name, "Command canceled while running");
                reply.fail(CommandError::canceled(name));
            }
            result = run => reply.complete(result),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::Command;
    use serde_json::json;

    fn request(command: Command) -> CommandRequest {
        command.into_request().unwrap()
    }

    #[test]
    fn test_simulated_command_unwraps_anchor() {
        let inner = Command::new("setModelProperties")
            .with_param(&json!({ "name": "door", "enabled": false }))
            .unwrap();
        let command = SimulatedCommand::from_request(&request(Command::anchored("car", inner)));

        assert_eq!(command.name, "setModelProperties");
        assert_eq!(command.anchor.as_deref(), Some("car"));
        assert_eq!(command.param, Some(json!({ "name": "door", "enabled": false })));
        assert!(!command.is_reset());

        let anchored = Command::anchored("car", Command::new("resetHard"));
        let reset = SimulatedCommand::from_request(&request(anchored));
        assert!(reset.is_reset());
    }

    #[test]
    fn test_latency_lookup() {
        let config = SimulatedEngineConfig::new()
            .with_default_latency(Duration::from_millis(5))
            .with_latency("createTracker", Duration::from_millis(50));
        assert_eq!(config.latency_for("createTracker"), Duration::from_millis(50));
        assert_eq!(config.latency_for("runTracking"), Duration::from_millis(5));
    }

    #[tokio::test]
    async fn test_shutdown_rejects() {
        let engine = SimulatedEngine::start(SimulatedEngineConfig::default());
        engine.shutdown();

        let (tx, _rx) = mpsc::unbounded_channel();
        let reply = Reply::new(0, "runTracking".to_string(), tx);
        let result = engine.push(request(Command::new("runTracking")), reply);
        assert!(result.is_err());
    }
}
