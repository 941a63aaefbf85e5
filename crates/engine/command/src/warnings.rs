//! Non-fatal issues returned next to successful results

use crate::error::Result;
use crate::issue::Issue;
use futures::future::try_join_all;
use serde::{Deserialize, Serialize};
use std::future::Future;

/// Ordered list of warnings produced by one or more commands
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CommandWarnings {
    #[serde(default)]
    pub warnings: Vec<Issue>,
}

impl CommandWarnings {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn new(warnings: Vec<Issue>) -> Self {
        Self { warnings }
    }

    /// Append `other` after the warnings of `self`
    pub fn concat(mut self, other: CommandWarnings) -> Self {
        self.warnings.extend(other.warnings);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.warnings.is_empty()
    }

    pub fn len(&self) -> usize {
        self.warnings.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Issue> {
        self.warnings.iter()
    }
}

impl Extend<Issue> for CommandWarnings {
    fn extend<I: IntoIterator<Item = Issue>>(&mut self, iter: I) {
        self.warnings.extend(iter);
    }
}

impl FromIterator<Issue> for CommandWarnings {
    fn from_iter<I: IntoIterator<Item = Issue>>(iter: I) -> Self {
        Self {
            warnings: iter.into_iter().collect(),
        }
    }
}

impl FromIterator<CommandWarnings> for CommandWarnings {
    fn from_iter<I: IntoIterator<Item = CommandWarnings>>(iter: I) -> Self {
        iter.into_iter().fold(Self::none(), Self::concat)
    }
}

impl IntoIterator for CommandWarnings {
    type Item = Issue;
    type IntoIter = std::vec::IntoIter<Issue>;

    fn into_iter(self) -> Self::IntoIter {
        self.warnings.into_iter()
    }
}

impl<'a> IntoIterator for &'a CommandWarnings {
    type Item = &'a Issue;
    type IntoIter = std::slice::Iter<'a, Issue>;

    fn into_iter(self) -> Self::IntoIter {
        self.warnings.iter()
    }
}

/// Await every task and concatenate their warnings in task order.
///
/// Fails fast: the first error observed is returned and the remaining
/// tasks are dropped. Commands already pushed still run on the worker.
pub async fn await_all<I, F>(tasks: I) -> Result<CommandWarnings>
where
    I: IntoIterator<Item = F>,
    F: Future<Output = Result<CommandWarnings>>,
{
    let results = try_join_all(tasks).await?;
    Ok(results.into_iter().collect())
}
