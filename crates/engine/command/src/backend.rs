//! The seam between the dispatch layer and the native engine

use crate::command::CommandRequest;
use crate::error::{Error, Result};
use crate::issue::{CommandError, IssueCode};
use tokio::sync::mpsc;
use tracing::warn;

/// A native engine that executes commands one at a time, in the order
/// they were pushed
///
/// `push` must not block on command execution. The backend keeps the
/// [`Reply`] and completes it once the command has run, from any thread.
pub trait NativeBackend: Send + Sync + 'static {
    fn push(&self, request: CommandRequest, reply: Reply) -> std::result::Result<(), Rejected>;
}

/// The backend refused a command without queuing it
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct Rejected(pub String);

/// Result of one command on its way back to the worker
#[derive(Debug)]
pub(crate) struct Completion {
    pub sequence: u64,
    pub result: Result<String>,
}

/// Completion handle for a single pushed command
///
/// Consumed by completing it. Dropping an uncompleted reply resolves the
/// command with [`Error::WorkerGone`].
#[derive(Debug)]
pub struct Reply {
    sequence: u64,
    command: String,
    tx: Option<mpsc::UnboundedSender<Completion>>,
}

impl Reply {
    pub(crate) fn new(
        sequence: u64,
        command: String,
        tx: mpsc::UnboundedSender<Completion>,
    ) -> Self {
        Self {
            sequence,
            command,
            tx: Some(tx),
        }
    }

    /// Submission sequence number of the command
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Top-level name of the command
    pub fn command(&self) -> &str {
        &self.command
    }

    /// Complete with the JSON response string
    pub fn succeed(mut self, response: impl Into<String>) {
        self.send(Ok(response.into()));
    }

    /// Complete with an engine error
    pub fn fail(mut self, error: CommandError) {
        self.send(Err(error.into()));
    }

    /// Complete with an error as reported by the engine in JSON form
    pub fn fail_json(self, error_json: &str) {
        let error = serde_json::from_str::<CommandError>(error_json).unwrap_or_else(|_| {
            CommandError::new(IssueCode::INTERNAL_ERROR, self.command.clone()).with_info(error_json)
        });
        self.fail(error);
    }

    /// Complete with either a response or an error
    pub fn complete(self, result: std::result::Result<String, CommandError>) {
        match result {
            Ok(response) => self.succeed(response),
            Err(error) => self.fail(error),
        }
    }

    fn send(&mut self, result: Result<String>) {
        if let Some(tx) = self.tx.take() {
            // The worker may already be disposed
            let _ = tx.send(Completion {
                sequence: self.sequence,
                result,
            });
        }
    }
}

impl Drop for Reply {
    fn drop(&mut self) {
        if self.tx.is_some() {
            warn!(
                sequence = self.sequence,
                command = %self.command,
                "Reply dropped without completing the command"
            );
            self.send(Err(Error::WorkerGone));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reply(sequence: u64) -> (Reply, mpsc::UnboundedReceiver<Completion>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Reply::new(sequence, "getAttribute".to_string(), tx), rx)
    }

    #[test]
    fn test_reply_succeeds_once() {
        let (reply, mut rx) = reply(3);
        reply.succeed("{\"value\":\"1\"}");

        let completion = rx.try_recv().unwrap();
        assert_eq!(completion.sequence, 3);
        assert_eq!(completion.result.unwrap(), "{\"value\":\"1\"}");
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_dropped_reply_reports_worker_gone() {
        let (reply, mut rx) = reply(7);
        drop(reply);

        let completion = rx.try_recv().unwrap();
        assert_eq!(completion.sequence, 7);
        assert!(matches!(completion.result, Err(Error::WorkerGone)));
    }

    #[test]
    fn test_fail_json() {
        let (canceled, mut rx) = reply(0);
        canceled.fail_json(r#"{"errorCode":200,"commandName":"getAttribute"}"#);
        assert!(rx.try_recv().unwrap().result.unwrap_err().is_canceled());

        let (garbled, mut rx) = reply(1);
        garbled.fail_json("not json");
        match rx.try_recv().unwrap().result {
            Err(Error::Command(e)) => {
                assert_eq!(e.error_code, IssueCode::INTERNAL_ERROR);
                assert_eq!(e.info, "not json");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
