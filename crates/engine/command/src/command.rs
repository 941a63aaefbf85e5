//! Command values sent to the native engine

use crate::error::Result;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;

/// Name of the command that scopes another command to an anchor
pub const ANCHOR_COMMAND: &str = "anchorCommand";

/// Out-of-band data sent next to the JSON description of a command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BinaryPayload {
    /// Bulk data such as serialized model geometry
    Bytes(Arc<[u8]>),
    /// Opaque platform handle, sent with a size of zero
    Handle(u64),
}

impl BinaryPayload {
    pub fn len(&self) -> usize {
        match self {
            BinaryPayload::Bytes(bytes) => bytes.len(),
            BinaryPayload::Handle(_) => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<Vec<u8>> for BinaryPayload {
    fn from(bytes: Vec<u8>) -> Self {
        BinaryPayload::Bytes(bytes.into())
    }
}

/// A named engine operation with its parameters
///
/// Serializes to `{"name": ..., "param": ...}`; `param` is omitted when the
/// command takes no arguments. The binary payload never appears in the JSON.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Command {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub param: Option<Value>,
    #[serde(skip)]
    pub binary: Option<BinaryPayload>,
}

impl Command {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            param: None,
            binary: None,
        }
    }

    /// Attach parameters, serialized immediately
    pub fn with_param<P: Serialize>(mut self, param: &P) -> Result<Self> {
        self.param = Some(serde_json::to_value(param)?);
        Ok(self)
    }

    pub fn with_binary(mut self, binary: impl Into<BinaryPayload>) -> Self {
        self.binary = Some(binary.into());
        self
    }

    /// Wrap `inner` so that it only applies to the named anchor.
    /// The binary payload of `inner` moves to the wrapper.
    pub fn anchored(anchor: impl Into<String>, mut inner: Command) -> Self {
        let binary = inner.binary.take();
        let mut content = json!({ "name": inner.name });
        if let Some(param) = inner.param {
            content["param"] = param;
        }
        Self {
            name: ANCHOR_COMMAND.to_string(),
            param: Some(json!({ "anchorName": anchor.into(), "content": content })),
            binary,
        }
    }

    /// Name of the command the engine will actually execute, looking
    /// through an anchor wrapper
    pub fn effective_name(&self) -> &str {
        if self.name == ANCHOR_COMMAND {
            if let Some(name) = self
                .param
                .as_ref()
                .and_then(|p| p.pointer("/content/name"))
                .and_then(Value::as_str)
            {
                return name;
            }
        }
        &self.name
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn into_request(self) -> Result<CommandRequest> {
        let json = self.to_json()?;
        Ok(CommandRequest {
            name: self.name,
            json,
            binary: self.binary,
        })
    }
}

/// A serialized command as handed to a [`NativeBackend`](crate::backend::NativeBackend)
#[derive(Debug, Clone, PartialEq)]
pub struct CommandRequest {
    /// Top-level command name, kept for logging
    pub name: String,
    pub json: String,
    pub binary: Option<BinaryPayload>,
}

impl CommandRequest {
    /// Parse the JSON description back into a value
    pub fn parsed(&self) -> Option<Value> {
        serde_json::from_str(&self.json).ok()
    }
}
