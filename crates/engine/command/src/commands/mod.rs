//! Typed command catalogue
//!
//! Every function pushes its command before returning, so the order of
//! calls is the order of execution. The returned futures only wait for and
//! interpret the response; they own no borrowed data.

pub mod anchor;
pub mod model_tracker;
pub mod worker;

use crate::command::Command;
use crate::error::Result;
use crate::pending::PendingCommand;
use crate::worker::Worker;
use serde::Serialize;

/// Build a command with parameters
pub(crate) fn build<P: Serialize + ?Sized>(name: &str, param: &P) -> Result<Command> {
    Command::new(name).with_param(&param)
}

/// Push a command that may have failed to build
pub(crate) fn submit(worker: &Worker, name: &str, command: Result<Command>) -> PendingCommand {
    match command {
        Ok(command) => worker.push_command(command),
        Err(e) => PendingCommand::failed(name, e),
    }
}

pub(crate) fn push(worker: &Worker, name: &str) -> PendingCommand {
    worker.push_command(Command::new(name))
}

pub(crate) fn push_param<P: Serialize + ?Sized>(
    worker: &Worker,
    name: &str,
    param: &P,
) -> PendingCommand {
    submit(worker, name, build(name, param))
}

/// Parameter of commands addressing a model by name
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ModelNameParam<'a> {
    pub model_name: &'a str,
}

/// Parameter of commands that take a single file location
#[derive(Serialize)]
pub(crate) struct UriParam<'a> {
    pub uri: &'a str,
}

/// Parameter of commands that take an attribute name
#[derive(Serialize)]
pub(crate) struct AttributeParam<'a> {
    pub att: &'a str,
}
