//! Event state domain types
//!
//! A generic remote job reports its lifecycle only through a `state` field.
//! `"done"` is the sole terminal-success value.

use serde::{Deserialize, Serialize};

/// Wire value that ends a poll successfully
pub const EVENT_STATE_DONE: &str = "done";

/// Minimal view of an event-state document
///
/// Any other fields in the body are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventDocument {
    pub state: String,
}

impl EventDocument {
    /// Decode a response body
    pub fn decode(body: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(body)
    }

    pub fn is_done(&self) -> bool {
        self.state == EVENT_STATE_DONE
    }
}

/// Caller-owned correlation handle passed through a poll
///
/// The poller only attaches it to log output.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventObject {
    pub label: String,
}

impl EventObject {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
        }
    }
}

/// Result of classifying one poll cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// Remote state is `done`
    Done,
    /// Any other state; poll again
    Continue,
    /// State listed as a failure by the caller
    Failed,
}

impl PollOutcome {
    /// Classify an observed state
    ///
    /// `failure_states` is empty unless the caller opts into early failure;
    /// with an empty list only `done` ends the poll.
    pub fn classify(state: &str, failure_states: &[String]) -> Self {
        if state == EVENT_STATE_DONE {
            PollOutcome::Done
        } else if failure_states.iter().any(|s| s == state) {
            PollOutcome::Failed
        } else {
            PollOutcome::Continue
        }
    }
}
