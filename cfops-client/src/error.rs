//! Error types for the cfops client

use reqwest::StatusCode;
use std::time::Duration;
use thiserror::Error;

/// Errors raised while submitting or reading director tasks
#[derive(Debug, Error)]
pub enum TaskError {
    /// A task-initiating request did not answer with a redirect
    #[error("expected a 302 redirect to a director task, got status {status}")]
    RedirectStatusCode { status: StatusCode },

    /// A task status request did not answer with 200
    #[error("expected status 200 for director task status, got {status}")]
    StatusCode { status: StatusCode },

    /// The redirect carried no `Location` header
    #[error("could not find redirect url for director task")]
    MissingLocation,

    /// The trailing fragment of the redirect is not a task id
    #[error("invalid task id '{value}' in redirect url")]
    InvalidTaskId {
        value: String,
        #[source]
        source: std::num::ParseIntError,
    },

    /// The task status body is not a task document
    #[error("failed to decode director task: {0}")]
    Decode(#[from] serde_json::Error),

    /// The task `state` is outside the known classification table
    #[error("director task {id} reported unrecognized state '{state}'")]
    UnrecognizedState { id: u64, state: String },

    /// The task finished with the `error` classification
    #[error("director task {id} failed: {description} ({result})")]
    Failed {
        id: u64,
        description: String,
        result: String,
    },

    /// The caller-supplied deadline elapsed before the task finished
    #[error("director task {id} did not finish within {after:?}")]
    DeadlineExceeded { id: u64, after: Duration },

    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),
}

/// Terminal failure reported by a Rest Runner
#[derive(Debug, Error)]
pub enum RestError {
    /// The remote answered with a non-2xx status
    #[error("request failed with status {status}: {}", String::from_utf8_lossy(.body))]
    Status { status: StatusCode, body: Vec<u8> },

    /// The request never produced a response
    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

impl RestError {
    pub fn status(status: StatusCode, body: impl Into<Vec<u8>>) -> Self {
        Self::Status {
            status,
            body: body.into(),
        }
    }

    /// Status code, when the remote answered at all
    pub fn status_code(&self) -> Option<StatusCode> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Transport(e) => e.status(),
        }
    }
}

/// Errors that end an event-state poll without success
#[derive(Debug, Error)]
pub enum PollError {
    /// A body could not be decoded as an event-state document
    #[error("failed to decode event state: {0}")]
    Decode(#[from] serde_json::Error),

    /// The Rest Runner reported a terminal failure mid-poll
    #[error("poll {polls} failed: {source}")]
    Terminal {
        polls: u64,
        #[source]
        source: RestError,
    },

    /// The remote reported a state the caller listed as failure
    #[error("event reached failure state '{state}'")]
    FailureState { state: String },

    /// The caller-supplied deadline elapsed before `done` was observed
    #[error("event did not reach done within {after:?}")]
    DeadlineExceeded { after: Duration },
}

/// Failure toggling one job
#[derive(Debug, Error)]
pub enum ToggleError {
    /// The toggle action itself failed
    #[error("toggle action for job '{job}' failed: {source}")]
    Action {
        job: String,
        #[source]
        source: TaskError,
    },

    /// Waiting for the job's event failed
    #[error("waiting for job '{job}' failed: {source}")]
    Poll {
        job: String,
        #[source]
        source: PollError,
    },

    /// The spawned toggle task panicked or was cancelled
    #[error("toggle of job '{job}' aborted: {message}")]
    Aborted { job: String, message: String },
}

impl ToggleError {
    /// Name of the job this error belongs to
    pub fn job(&self) -> &str {
        match self {
            Self::Action { job, .. } | Self::Poll { job, .. } | Self::Aborted { job, .. } => job,
        }
    }
}

/// One or more jobs in a batch failed
///
/// Keeps the jobs that succeeded alongside every failure.
#[derive(Debug, Error)]
#[error("{}", summarize(.succeeded, .failures))]
pub struct AggregateToggleError {
    pub succeeded: Vec<String>,
    pub failures: Vec<ToggleError>,
}

impl AggregateToggleError {
    /// Names of the failed jobs, in request order
    pub fn failed_jobs(&self) -> Vec<&str> {
        self.failures.iter().map(ToggleError::job).collect()
    }
}

fn summarize(succeeded: &[String], failures: &[ToggleError]) -> String {
    let details = failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ");
    format!(
        "{} of {} job toggles failed: {}",
        failures.len(),
        failures.len() + succeeded.len(),
        details
    )
}
