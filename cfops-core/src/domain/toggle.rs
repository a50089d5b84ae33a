//! Job toggle domain types

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Target state of a toggled job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    Started,
    Stopped,
}

impl JobState {
    pub fn as_str(self) -> &'static str {
        match self {
            JobState::Started => "started",
            JobState::Stopped => "stopped",
        }
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "started" | "start" => Ok(JobState::Started),
            "stopped" | "stop" => Ok(JobState::Stopped),
            other => Err(format!("unknown job state '{}'", other)),
        }
    }
}

/// Ordered list of job names to toggle
///
/// Each entry is independent: one job's outcome never gates another's attempt.
/// A job's position in the list is its instance index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobToggleRequest {
    pub jobs: Vec<String>,
}

impl JobToggleRequest {
    pub fn new<I, S>(jobs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            jobs: jobs.into_iter().map(Into::into).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Iterate `(index, job name)` pairs in request order
    pub fn indexed(&self) -> impl Iterator<Item = (usize, &str)> {
        self.jobs.iter().map(String::as_str).enumerate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_state_parse() {
        assert_eq!("stopped".parse::<JobState>(), Ok(JobState::Stopped));
        assert_eq!("Started".parse::<JobState>(), Ok(JobState::Started));
        assert!("paused".parse::<JobState>().is_err());
    }

    #[test]
    fn test_indexed_preserves_order() {
        let request = JobToggleRequest::new(["cloud_controller", "cloud_controller_worker"]);
        let pairs: Vec<_> = request.indexed().collect();
        assert_eq!(
            pairs,
            vec![(0, "cloud_controller"), (1, "cloud_controller_worker")]
        );
    }
}
