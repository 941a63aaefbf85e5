//! Worker dispatch properties
//!
//! Verifies that:
//! 1. Commands resolve in submission order whatever the backend latency
//! 2. Warnings of concurrent commands concatenate in task order
//! 3. Cancellation is distinguishable from other engine errors
//! 4. A reset aborts a tracker creation that is still running
//! 5. Anchored resets abort queued work, later commands are unaffected

use futures::future::FutureExt;
use std::sync::Mutex;
use std::time::Duration;
use tracklink_command::commands::{anchor, model_tracker, worker as tracker};
use tracklink_command::{
    await_all, Command, CommandError, CommandRequest, CompletionOutcome, Error, Issue, IssueCode,
    ModelProperties, NativeBackend, Rejected, Reply, SimulatedEngine, SimulatedEngineConfig,
    Worker,
};

/// Helper: backend that completes every command on its own task after a
/// scripted delay, so completions arrive out of order
struct ScatteredBackend {
    delays_ms: Mutex<Vec<u64>>,
}

impl ScatteredBackend {
    fn new(mut delays_ms: Vec<u64>) -> Self {
        delays_ms.reverse();
        Self {
            delays_ms: Mutex::new(delays_ms),
        }
    }
}

impl NativeBackend for ScatteredBackend {
    fn push(&self, request: CommandRequest, reply: Reply) -> Result<(), Rejected> {
        let delay = self.delays_ms.lock().unwrap().pop().unwrap_or(0);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(delay)).await;
            reply.succeed(request.name);
        });
        Ok(())
    }
}

fn simulated(config: SimulatedEngineConfig) -> (SimulatedEngine, Worker) {
    let engine = SimulatedEngine::start(config);
    let worker = Worker::new(engine.clone());
    worker.start().unwrap();
    (engine, worker)
}

fn warnings_json(infos: &[&str]) -> String {
    let warnings: Vec<Issue> = infos
        .iter()
        .map(|info| Issue::warning(IssueCode::MODEL_LOAD_FAILED, *info))
        .collect();
    serde_json::json!({ "warnings": warnings }).to_string()
}

#[tokio::test(start_paused = true)]
async fn test_resolution_follows_submission_order() {
    let worker = Worker::new(ScatteredBackend::new(vec![30, 10, 20]));
    worker.start().unwrap();
    let mut events = worker.subscribe_completions();

    let a = worker.push_command(Command::new("A"));
    let b = worker.push_command(Command::new("B"));
    let c = worker.push_command(Command::new("C"));

    // B finishes first on the backend but cannot resolve before A
    assert_eq!(b.await.unwrap(), "B");
    assert_eq!(a.now_or_never().map(|r| r.unwrap()), Some("A".to_string()));
    assert_eq!(c.await.unwrap(), "C");

    let mut order = Vec::new();
    for _ in 0..3 {
        let event = events.recv().await.unwrap();
        assert_eq!(event.outcome, CompletionOutcome::Succeeded);
        order.push((event.sequence, event.command));
    }
    assert_eq!(
        order,
        vec![(0, "A".to_string()), (1, "B".to_string()), (2, "C".to_string())]
    );
}

#[tokio::test(start_paused = true)]
async fn test_many_scattered_commands_stay_ordered() {
    let delays: Vec<u64> = (0..20).map(|i| (i * 7 % 13) as u64).collect();
    let worker = Worker::new(ScatteredBackend::new(delays));
    worker.start().unwrap();
    let mut events = worker.subscribe_completions();

    let pending: Vec<_> = (0..20)
        .map(|i| worker.push_command(Command::new(format!("cmd{}", i))))
        .collect();
    let results = futures::future::join_all(pending).await;

    for (i, result) in results.into_iter().enumerate() {
        assert_eq!(result.unwrap(), format!("cmd{}", i));
        assert_eq!(events.recv().await.unwrap().sequence, i as u64);
    }
}

#[tokio::test]
async fn test_await_all_concatenates_warnings() {
    let (engine, worker) = simulated(SimulatedEngineConfig::default());
    engine.respond("addModel", warnings_json(&["w1"]));
    engine.respond("setModelProperties", warnings_json(&["w2", "w3"]));

    let merged = await_all(vec![
        model_tracker::add_model(&worker, &ModelProperties::new("car", "car.obj")).boxed(),
        model_tracker::set_model_enabled(&worker, "car", false).boxed(),
    ])
    .await
    .unwrap();

    let infos: Vec<_> = merged.iter().map(|w| w.info.as_str()).collect();
    assert_eq!(infos, vec!["w1", "w2", "w3"]);
}

#[tokio::test]
async fn test_await_all_propagates_first_error() {
    let (engine, worker) = simulated(SimulatedEngineConfig::default());
    engine.respond("addModel", warnings_json(&["w1"]));
    engine.fail(
        "setModelProperties",
        CommandError::new(IssueCode::MODEL_NOT_FOUND, "setModelProperties").with_info("car"),
    );

    let result = await_all(vec![
        model_tracker::add_model(&worker, &ModelProperties::new("car", "car.obj")).boxed(),
        model_tracker::set_model_enabled(&worker, "car", false).boxed(),
    ])
    .await;

    match result {
        Err(Error::Command(e)) => assert_eq!(e.error_code, IssueCode::MODEL_NOT_FOUND),
        other => panic!("unexpected result: {:?}", other),
    }
}

#[tokio::test]
async fn test_cancellation_is_distinguishable() {
    let (engine, worker) = simulated(SimulatedEngineConfig::default());
    engine.fail("readInitData", CommandError::canceled("readInitData"));
    engine.fail(
        "writeInitData",
        CommandError::new(IssueCode::FILE_WRITING_FAILED, "writeInitData"),
    );

    let canceled = model_tracker::read_init_data(&worker, "local-storage-dir:init.bin")
        .await
        .unwrap_err();
    assert!(canceled.is_canceled());
    assert!(matches!(canceled, Error::Canceled(_)));

    let failed = model_tracker::write_init_data(&worker, None).await.unwrap_err();
    assert!(!failed.is_canceled());
    assert_eq!(
        failed.command_error().map(|e| e.error_code),
        Some(IssueCode::FILE_WRITING_FAILED)
    );
}

#[tokio::test(start_paused = true)]
async fn test_reset_cancels_running_create_tracker() {
    let config =
        SimulatedEngineConfig::new().with_latency("createTracker", Duration::from_millis(500));
    let (engine, worker) = simulated(config);
    let mut events = worker.subscribe_completions();

    let create = tracker::create_tracker(&worker, "config.vl");
    let reset = model_tracker::reset_hard(&worker);

    let error = create.await.unwrap_err();
    assert!(error.is_canceled());
    assert_eq!(
        error.command_error().map(|e| e.error_code),
        Some(IssueCode::COMMAND_CANCELED)
    );
    reset.await.unwrap();

    assert_eq!(events.recv().await.unwrap().outcome, CompletionOutcome::Canceled);
    assert_eq!(events.recv().await.unwrap().outcome, CompletionOutcome::Succeeded);
    assert_eq!(engine.history(), vec!["createTracker", "resetHard"]);
}

#[tokio::test(start_paused = true)]
async fn test_anchored_reset_cancels_only_earlier_commands() {
    let config = SimulatedEngineConfig::new().with_default_latency(Duration::from_millis(10));
    let (engine, worker) = simulated(config);
    engine.respond("getInitPose", "null");

    let first = model_tracker::get_init_pose(&worker);
    let second = tracker::run_tracking(&worker);
    let reset = anchor::anchor_reset_soft(&worker, "car");
    let after = model_tracker::get_init_pose(&worker);

    assert!(first.await.unwrap_err().is_canceled());
    assert!(second.await.unwrap_err().is_canceled());
    reset.await.unwrap();
    assert_eq!(after.await.unwrap(), None);
}
