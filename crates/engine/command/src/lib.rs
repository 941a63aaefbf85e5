//! Typed command dispatch to a tracking engine worker
//!
//! The tracking engine executes named JSON commands one at a time. This
//! crate provides:
//!
//! - **Commands**: `{"name": .., "param": ..}` values with an optional
//!   out-of-band binary payload
//! - **Worker**: a queue in front of a [`NativeBackend`] that resolves
//!   results strictly in submission order
//! - **Catalogue**: typed functions for tracker, model and anchor commands
//! - **Issues**: engine error codes, warnings and their descriptions
//! - **Simulation**: an in-process engine with latency and reset semantics
//!
//! # Example
//!
//! ```rust,no_run
//! use tracklink_command::prelude::*;
//! use tracklink_command::commands::{model_tracker, worker as tracker};
//!
//! # async fn run() -> tracklink_command::Result<()> {
//! let engine = SimulatedEngine::start(SimulatedEngineConfig::default());
//! let worker = Worker::new(engine.clone());
//! worker.start()?;
//!
//! let create = tracker::create_tracker(&worker, "project-dir:car.vl");
//! let reset = model_tracker::reset_hard(&worker);
//!
//! // The reset aborts the tracker creation
//! assert!(create.await.unwrap_err().is_canceled());
//! reset.await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Modules
//!
//! - [`command`]: command values and requests
//! - [`commands`]: the typed command catalogue
//! - [`worker`]: ordered dispatch and worker lifecycle
//! - [`sim`]: simulated native engine

pub mod backend;
pub mod command;
pub mod commands;
pub mod error;
pub mod issue;
pub mod pending;
pub mod sim;
pub mod types;
pub mod value;
pub mod warnings;
pub mod worker;

pub use backend::{NativeBackend, Rejected, Reply};
pub use command::{BinaryPayload, Command, CommandRequest, ANCHOR_COMMAND};
pub use error::{Error, Result};
pub use issue::{CommandError, Issue, IssueCode, IssueLevel};
pub use pending::PendingCommand;
pub use sim::{CommandHandler, FnHandler, SimulatedCommand, SimulatedEngine, SimulatedEngineConfig};
pub use types::{
    AddedModel, AnchorValue, BinaryDataDescriptor, ModelDataDescriptor, ModelDataDescriptorList,
    ModelDeserializationResultList, ModelProperties, ModelPropertiesList, RotationConstraint,
    TrackerInfo, ValueResult,
};
pub use value::{parse_backend_value, BackendValue, LineColor};
pub use warnings::{await_all, CommandWarnings};
pub use worker::{CompletionEvent, CompletionOutcome, Worker, WorkerConfig, WorkerState};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::command::{BinaryPayload, Command};
    pub use crate::error::{Error, Result};
    pub use crate::issue::{CommandError, Issue, IssueCode};
    pub use crate::sim::{SimulatedEngine, SimulatedEngineConfig};
    pub use crate::warnings::{await_all, CommandWarnings};
    pub use crate::worker::{Worker, WorkerConfig, WorkerState};
}
