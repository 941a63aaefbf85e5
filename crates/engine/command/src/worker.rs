//! Serial command worker with in-order resolution
//!
//! A [`Worker`] hands every command to a [`NativeBackend`] and resolves the
//! returned futures strictly in submission order. Completions reported out
//! of order by the backend wait in a reorder buffer until every earlier
//! command has resolved.

use crate::backend::{Completion, NativeBackend, Reply};
use crate::command::Command;
use crate::error::{Error, Result};
use crate::issue::{CommandError, IssueCode};
use crate::pending::PendingCommand;
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::future::poll_fn;
use std::sync::{Arc, Weak};
use std::task::Poll;
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Lifecycle state of a worker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkerState {
    /// Created but not started, commands are refused
    Uninitialized,
    /// Started with nothing in flight
    Ready,
    /// At least one command is waiting for its result
    Busy,
    /// Torn down, commands are refused
    Disposed,
}

impl WorkerState {
    pub fn accepts_commands(&self) -> bool {
        matches!(self, WorkerState::Ready | WorkerState::Busy)
    }
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WorkerState::Uninitialized => "uninitialized",
            WorkerState::Ready => "ready",
            WorkerState::Busy => "busy",
            WorkerState::Disposed => "disposed",
        };
        f.write_str(name)
    }
}

/// How a command ended, as seen by completion subscribers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompletionOutcome {
    Succeeded,
    Failed(IssueCode),
    Canceled,
}

impl CompletionOutcome {
    fn of(result: &Result<String>) -> Self {
        match result {
            Ok(_) => CompletionOutcome::Succeeded,
            Err(Error::Canceled(_)) => CompletionOutcome::Canceled,
            Err(Error::Command(e)) => CompletionOutcome::Failed(e.error_code),
            Err(_) => CompletionOutcome::Failed(IssueCode::INTERNAL_ERROR),
        }
    }
}

/// Emitted once per command, in submission order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionEvent {
    pub sequence: u64,
    pub command: String,
    pub outcome: CompletionOutcome,
}

/// Worker configuration
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Name used in log output
    pub name: String,
    /// Buffer size of the completion event channel
    pub completion_capacity: usize,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            name: "worker".to_string(),
            completion_capacity: 64,
        }
    }
}

impl WorkerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_completion_capacity(mut self, capacity: usize) -> Self {
        self.completion_capacity = capacity.max(1);
        self
    }
}

struct PendingEntry {
    command: String,
    waiter: Option<oneshot::Sender<Result<String>>>,
    outcome: Option<Result<String>>,
}

#[derive(Default)]
struct Inner {
    next_sequence: u64,
    /// Keyed by sequence; the first key is always the oldest unresolved command
    pending: BTreeMap<u64, PendingEntry>,
    completions: Option<mpsc::UnboundedSender<Completion>>,
}

struct Shared {
    config: WorkerConfig,
    backend: Arc<dyn NativeBackend>,
    inner: Mutex<Inner>,
    /// Read by the dispatcher task; taken by `dispose` to drain late results
    receiver: Mutex<Option<mpsc::UnboundedReceiver<Completion>>>,
    state: watch::Sender<WorkerState>,
    events: broadcast::Sender<CompletionEvent>,
    shutdown: CancellationToken,
}

impl Shared {
    fn set_state(&self, state: WorkerState) {
        let previous = self.state.send_replace(state);
        if previous != state {
            info!(
                worker = %self.config.name,
                from = %previous,
                to = %state,
                "Worker state changed"
            );
        }
    }

    fn current_state(&self) -> WorkerState {
        *self.state.borrow()
    }

    fn complete(&self, completion: Completion) {
        let mut inner = self.inner.lock();
        self.record(&mut inner, completion);
        self.flush(&mut inner);
    }

    /// Store a backend result on its entry without resolving it
    fn record(&self, inner: &mut Inner, completion: Completion) {
        let sequence = completion.sequence;
        match inner.pending.get_mut(&sequence) {
            Some(entry) if entry.outcome.is_none() => entry.outcome = Some(completion.result),
            Some(_) => {
                debug!(worker = %self.config.name, sequence, "Duplicate completion ignored");
            }
            None => {
                debug!(
                    worker = %self.config.name,
                    sequence,
                    "Completion for unknown command ignored"
                );
            }
        }
    }

    /// Resolve every command at the head of the buffer that has an outcome
    fn flush(&self, inner: &mut Inner) {
        while let Some(head) = inner.pending.first_entry() {
            if head.get().outcome.is_none() {
                break;
            }
            let (sequence, entry) = head.remove_entry();
            if let Some(outcome) = entry.outcome {
                self.resolve(sequence, entry.command, entry.waiter, outcome);
            }
        }

        if inner.pending.is_empty() && self.current_state() == WorkerState::Busy {
            self.set_state(WorkerState::Ready);
        }
    }

    fn resolve(
        &self,
        sequence: u64,
        command: String,
        waiter: Option<oneshot::Sender<Result<String>>>,
        outcome: Result<String>,
    ) {
        let event = CompletionEvent {
            sequence,
            command,
            outcome: CompletionOutcome::of(&outcome),
        };
        debug!(
            worker = %self.config.name,
            sequence,
            command = %event.command,
            outcome = ?event.outcome,
            "Command resolved"
        );

        // No subscribers is fine
        let _ = self.events.send(event);
        if let Some(waiter) = waiter {
            let _ = waiter.send(outcome);
        }
    }
}

/// Handle to a command queue in front of a native engine
///
/// Cloning is cheap; all clones share the same queue.
#[derive(Clone)]
pub struct Worker {
    shared: Arc<Shared>,
}

impl fmt::Debug for Worker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Worker")
            .field("name", &self.shared.config.name)
            .field("state", &self.state())
            .finish()
    }
}

impl Worker {
    pub fn new<B: NativeBackend>(backend: B) -> Self {
        Self::with_config(backend, WorkerConfig::default())
    }

    pub fn with_config<B: NativeBackend>(backend: B, config: WorkerConfig) -> Self {
        let (state, _) = watch::channel(WorkerState::Uninitialized);
        let (events, _) = broadcast::channel(config.completion_capacity.max(1));
        Self {
            shared: Arc::new(Shared {
                config,
                backend: Arc::new(backend),
                inner: Mutex::new(Inner::default()),
                receiver: Mutex::new(None),
                state,
                events,
                shutdown: CancellationToken::new(),
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.shared.config.name
    }

    /// Start accepting commands. Must be called inside a tokio runtime.
    pub fn start(&self) -> Result<()> {
        let mut inner = self.shared.inner.lock();
        match self.shared.current_state() {
            WorkerState::Uninitialized => {}
            WorkerState::Disposed => return Err(Error::WorkerGone),
            WorkerState::Ready | WorkerState::Busy => return Ok(()),
        }

        let (tx, rx) = mpsc::unbounded_channel();
        inner.completions = Some(tx);
        *self.shared.receiver.lock() = Some(rx);
        tokio::spawn(dispatch_completions(
            Arc::downgrade(&self.shared),
            self.shared.shutdown.clone(),
        ));
        self.shared.set_state(WorkerState::Ready);
        Ok(())
    }

    pub fn state(&self) -> WorkerState {
        self.shared.current_state()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<WorkerState> {
        self.shared.state.subscribe()
    }

    /// Events for every resolved command, in submission order
    pub fn subscribe_completions(&self) -> broadcast::Receiver<CompletionEvent> {
        self.shared.events.subscribe()
    }

    /// Number of commands that have not resolved yet
    pub fn pending_count(&self) -> usize {
        self.shared.inner.lock().pending.len()
    }

    /// Queue a command and return a future for its raw JSON response
    ///
    /// The command is handed to the backend before this returns, so the
    /// submission order is the order of `push_command` calls.
    pub fn push_command(&self, command: Command) -> PendingCommand {
        let name = command.name.clone();
        let request = match command.into_request() {
            Ok(request) => request,
            Err(e) => return PendingCommand::failed(name, e),
        };

        let mut inner = self.shared.inner.lock();
        match self.shared.current_state() {
            WorkerState::Uninitialized => {
                return PendingCommand::failed(name, Error::NotInitialized);
            }
            WorkerState::Disposed => return PendingCommand::failed(name, Error::WorkerGone),
            WorkerState::Ready | WorkerState::Busy => {}
        }
        let Some(completions) = inner.completions.clone() else {
            return PendingCommand::failed(name, Error::WorkerGone);
        };

        let sequence = inner.next_sequence;
        inner.next_sequence += 1;

        let (waiter, rx) = oneshot::channel();
        inner.pending.insert(
            sequence,
            PendingEntry {
                command: name.clone(),
                waiter: Some(waiter),
                outcome: None,
            },
        );
        self.shared.set_state(WorkerState::Busy);

        debug!(
            worker = %self.shared.config.name,
            sequence,
            command = %name,
            json = %request.json,
            "Pushing command"
        );

        // The lock stays held so the backend sees commands in sequence order
        let reply = Reply::new(sequence, name.clone(), completions);
        if let Err(rejected) = self.shared.backend.push(request, reply) {
            warn!(
                worker = %self.shared.config.name,
                sequence,
                command = %name,
                reason = %rejected,
                "Backend rejected command"
            );
            if let Some(entry) = inner.pending.get_mut(&sequence) {
                entry.outcome = Some(Err(Error::Rejected(rejected.0)));
            }
            self.shared.flush(&mut inner);
        }

        PendingCommand::waiting(name, rx)
    }

    /// Queue a command and deserialize its response into `T`
    pub fn push_command_as<T: DeserializeOwned + Send + 'static>(
        &self,
        command: Command,
    ) -> impl Future<Output = Result<T>> + Send + 'static {
        self.push_command(command).into_json()
    }

    /// Tear down the worker. Commands whose result already arrived resolve
    /// with it, the rest resolve as canceled. Later submissions fail with
    /// [`Error::WorkerGone`].
    pub fn dispose(&self) {
        let mut inner = self.shared.inner.lock();
        if self.shared.current_state() == WorkerState::Disposed {
            return;
        }
        self.shared.set_state(WorkerState::Disposed);
        inner.completions = None;
        self.shared.shutdown.cancel();

        if let Some(mut rx) = self.shared.receiver.lock().take() {
            while let Ok(completion) = rx.try_recv() {
                self.shared.record(&mut inner, completion);
            }
        }

        let pending = std::mem::take(&mut inner.pending);
        if !pending.is_empty() {
            info!(
                worker = %self.shared.config.name,
                count = pending.len(),
                "Canceling pending commands"
            );
        }
        for (sequence, entry) in pending {
            let outcome = entry
                .outcome
                .unwrap_or_else(|| Err(CommandError::canceled(entry.command.clone()).into()));
            self.shared.resolve(sequence, entry.command, entry.waiter, outcome);
        }
    }
}

async fn dispatch_completions(shared: Weak<Shared>, shutdown: CancellationToken) {
    loop {
        let next = poll_fn(|cx| {
            let Some(shared) = shared.upgrade() else {
                return Poll::Ready(None);
            };
            let mut receiver = shared.receiver.lock();
            let poll = match receiver.as_mut() {
                Some(rx) => rx.poll_recv(cx),
                None => Poll::Ready(None),
            };
            poll
        });
        let completion = tokio::select! {
            _ = shutdown.cancelled() => break,
            completion = next => completion,
        };
        let (Some(completion), Some(shared)) = (completion, shared.upgrade()) else {
            break;
        };
        shared.complete(completion);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::Rejected;
    use crate::command::CommandRequest;
    use std::sync::atomic::{AtomicBool, Ordering};

    /// Answers every command immediately, inside `push`
    struct EchoBackend;

    impl NativeBackend for EchoBackend {
        fn push(&self, request: CommandRequest, reply: Reply) -> std::result::Result<(), Rejected> {
            reply.succeed(request.json);
            Ok(())
        }
    }

    /// Keeps replies until told to release them
    #[derive(Clone, Default)]
    struct HoldingBackend {
        replies: Arc<Mutex<Vec<Reply>>>,
        reject: Arc<AtomicBool>,
    }

    impl NativeBackend for HoldingBackend {
        fn push(
            &self,
            _request: CommandRequest,
            reply: Reply,
        ) -> std::result::Result<(), Rejected> {
            if self.reject.load(Ordering::SeqCst) {
                return Err(Rejected("queue full".to_string()));
            }
            self.replies.lock().push(reply);
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_not_initialized() {
        let worker = Worker::new(EchoBackend);
        assert_eq!(worker.state(), WorkerState::Uninitialized);
        let result = worker.push_command(Command::new("runTracking")).await;
        assert!(matches!(result, Err(Error::NotInitialized)));
    }

    #[tokio::test]
    async fn test_synchronous_completion() {
        let worker = Worker::new(EchoBackend);
        worker.start().unwrap();

        let response = worker.push_command(Command::new("runTracking")).await.unwrap();
        assert_eq!(response, r#"{"name":"runTracking"}"#);
    }

    #[tokio::test]
    async fn test_state_transitions() {
        let backend = HoldingBackend::default();
        let worker = Worker::new(backend.clone());
        worker.start().unwrap();
        assert_eq!(worker.state(), WorkerState::Ready);

        let pending = worker.push_command(Command::new("resetSoft"));
        assert_eq!(worker.state(), WorkerState::Busy);
        assert_eq!(worker.pending_count(), 1);

        let reply = backend.replies.lock().pop().unwrap();
        reply.succeed("");
        pending.await.unwrap();
        assert_eq!(worker.state(), WorkerState::Ready);

        worker.dispose();
        assert_eq!(worker.state(), WorkerState::Disposed);
        assert!(worker.start().is_err());
    }

    #[tokio::test]
    async fn test_dispose_cancels_pending() {
        let backend = HoldingBackend::default();
        let worker = Worker::new(backend.clone());
        worker.start().unwrap();

        let first = worker.push_command(Command::new("createTracker"));
        let second = worker.push_command(Command::new("runTracking"));
        worker.dispose();

        assert!(first.await.unwrap_err().is_canceled());
        assert!(second.await.unwrap_err().is_canceled());

        let late = worker.push_command(Command::new("resetHard")).await;
        assert!(matches!(late, Err(Error::WorkerGone)));
    }

    #[tokio::test]
    async fn test_dispose_keeps_delivered_results() {
        let backend = HoldingBackend::default();
        let worker = Worker::new(backend.clone());
        worker.start().unwrap();

        let created = worker.push_command(Command::new("createTracker"));
        let running = worker.push_command(Command::new("runTracking"));
        let echoed = Worker::new(EchoBackend);
        echoed.start().unwrap();
        let synchronous = echoed.push_command(Command::new("runTracking"));

        // Only the first result has been sent when the workers go away
        let first = backend.replies.lock().remove(0);
        first.succeed(r#"{"trackerType":"ModelTracker"}"#);
        worker.dispose();
        echoed.dispose();

        assert_eq!(created.await.unwrap(), r#"{"trackerType":"ModelTracker"}"#);
        assert!(running.await.unwrap_err().is_canceled());
        assert_eq!(synchronous.await.unwrap(), r#"{"name":"runTracking"}"#);
    }

    #[tokio::test]
    async fn test_rejected_command() {
        let backend = HoldingBackend::default();
        let worker = Worker::new(backend.clone());
        worker.start().unwrap();

        backend.reject.store(true, Ordering::SeqCst);
        let result = worker.push_command(Command::new("runTracking")).await;
        assert!(matches!(result, Err(Error::Rejected(reason)) if reason == "queue full"));
        assert_eq!(worker.state(), WorkerState::Ready);
    }

    #[tokio::test]
    async fn test_dropped_reply_is_worker_gone() {
        let backend = HoldingBackend::default();
        let worker = Worker::new(backend.clone());
        worker.start().unwrap();

        let pending = worker.push_command(Command::new("getInitPose"));
        backend.replies.lock().clear();
        assert!(matches!(pending.await, Err(Error::WorkerGone)));
    }
}
