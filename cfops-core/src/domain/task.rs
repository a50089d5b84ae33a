//! Director task domain types
//!
//! A director task is a long-running operation on the deployment director,
//! tracked by a numeric identifier and a three-way classification.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Snapshot of a director task as returned by `GET /tasks/<id>`
///
/// Always a fresh copy of the remote document; the client never mutates it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteTask {
    pub id: u64,
    pub state: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub description: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub result: String,
}

impl RemoteTask {
    /// Classify the raw `state` string
    ///
    /// Returns the unrecognized value as the error so callers can decide how
    /// to surface it.
    pub fn classification(&self) -> Result<TaskState, UnrecognizedTaskState> {
        self.state.parse()
    }
}

/// Classification of a director task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskState {
    Error,
    Processing,
    Done,
}

impl TaskState {
    /// Fixed lookup table from wire value to classification
    pub const TABLE: [(&'static str, TaskState); 3] = [
        ("error", TaskState::Error),
        ("processing", TaskState::Processing),
        ("done", TaskState::Done),
    ];

    /// Whether the task will not change state again
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskState::Error | TaskState::Done)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TaskState::Error => "error",
            TaskState::Processing => "processing",
            TaskState::Done => "done",
        }
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A task `state` value outside the three-entry table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnrecognizedTaskState(pub String);

impl fmt::Display for UnrecognizedTaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unrecognized task state '{}'", self.0)
    }
}

impl std::error::Error for UnrecognizedTaskState {}

impl FromStr for TaskState {
    type Err = UnrecognizedTaskState;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TaskState::TABLE
            .iter()
            .find(|(name, _)| *name == s)
            .map(|(_, state)| *state)
            .ok_or_else(|| UnrecognizedTaskState(s.to_string()))
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}
