//! Futures for commands that are already queued on a worker

use crate::error::{Error, Result};
use crate::warnings::CommandWarnings;
use serde::de::DeserializeOwned;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::oneshot;

/// The raw JSON response of a pushed command
///
/// The command is queued when the `PendingCommand` is created, not when it
/// is first polled. Dropping it does not withdraw the command.
#[derive(Debug)]
#[must_use = "the command is already queued; await it to observe its result"]
pub struct PendingCommand {
    command: String,
    inner: PendingInner,
}

#[derive(Debug)]
enum PendingInner {
    Waiting(oneshot::Receiver<Result<String>>),
    Done(Option<Result<String>>),
}

impl PendingCommand {
    pub(crate) fn waiting(
        command: impl Into<String>,
        rx: oneshot::Receiver<Result<String>>,
    ) -> Self {
        Self {
            command: command.into(),
            inner: PendingInner::Waiting(rx),
        }
    }

    /// A command that resolved without reaching the worker
    pub fn ready(command: impl Into<String>, result: Result<String>) -> Self {
        Self {
            command: command.into(),
            inner: PendingInner::Done(Some(result)),
        }
    }

    pub fn failed(command: impl Into<String>, error: Error) -> Self {
        Self::ready(command, Err(error))
    }

    /// Name of the command this future belongs to
    pub fn command(&self) -> &str {
        &self.command
    }

    /// Deserialize the response into `T`
    pub async fn into_json<T: DeserializeOwned>(self) -> Result<T> {
        let command = self.command.clone();
        let response = self.await?;
        serde_json::from_str(&response).map_err(|source| Error::Deserialization { command, source })
    }

    /// Like [`into_json`](Self::into_json), but an empty or `null` response is `None`
    pub async fn into_nullable_json<T: DeserializeOwned>(self) -> Result<Option<T>> {
        let command = self.command.clone();
        let response = self.await?;
        let trimmed = response.trim();
        if trimmed.is_empty() || trimmed == "null" {
            return Ok(None);
        }
        serde_json::from_str(trimmed)
            .map(Some)
            .map_err(|source| Error::Deserialization { command, source })
    }

    /// Warnings returned by the command; an empty response has none
    pub async fn into_warnings(self) -> Result<CommandWarnings> {
        Ok(self.into_nullable_json().await?.unwrap_or_default())
    }

    /// Wait for completion and discard the response
    pub async fn into_unit(self) -> Result<()> {
        self.await.map(|_| ())
    }
}

impl Future for PendingCommand {
    type Output = Result<String>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        match &mut this.inner {
            PendingInner::Waiting(rx) => match Pin::new(rx).poll(cx) {
                Poll::Ready(result) => {
                    this.inner = PendingInner::Done(None);
                    Poll::Ready(result.unwrap_or_else(|_| Err(Error::WorkerGone)))
                }
                Poll::Pending => Poll::Pending,
            },
            PendingInner::Done(result) => match result.take() {
                Some(result) => Poll::Ready(result),
                None => panic!("PendingCommand polled after completion"),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn responding(response: &str) -> PendingCommand {
        PendingCommand::ready("getInitPose", Ok(response.to_string()))
    }

    #[tokio::test]
    async fn test_into_json() {
        let value: Value = responding(r#"{"value":"3"}"#).into_json().await.unwrap();
        assert_eq!(value["value"], "3");

        match responding("{").into_json::<Value>().await {
            Err(Error::Deserialization { command, .. }) => assert_eq!(command, "getInitPose"),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_nullable_json() {
        assert!(responding("").into_nullable_json::<Value>().await.unwrap().is_none());
        assert!(responding(" null ").into_nullable_json::<Value>().await.unwrap().is_none());
        assert!(responding("{}").into_nullable_json::<Value>().await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_empty_response_has_no_warnings() {
        assert!(responding("").into_warnings().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_closed_channel_is_worker_gone() {
        let (tx, rx) = oneshot::channel();
        drop(tx);
        let result = PendingCommand::waiting("resetHard", rx).await;
        assert!(matches!(result, Err(Error::WorkerGone)));
    }
}
