//! Client configuration
//!
//! Director coordinates and the knobs that shape polling. Every knob defaults
//! to the plain behavior: poll back-to-back, never give up, only `done` ends a
//! poll, toggle jobs one at a time.

use std::time::Duration;
use thiserror::Error;

/// Invalid configuration
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value '{value}' for {name}")]
    InvalidVar { name: &'static str, value: String },

    #[error("{0}")]
    Invalid(String),
}

/// Polling behavior shared by the event poller, the director retry loop and
/// the job toggler
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollerConfig {
    /// Pause between two polls; `None` polls back-to-back
    pub interval: Option<Duration>,

    /// Give up after this long; `None` waits for the remote indefinitely
    pub deadline: Option<Duration>,

    /// States that end an event poll with failure
    pub failure_states: Vec<String>,

    /// Jobs toggled at once by a batch
    pub max_parallel_jobs: usize,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval: None,
            deadline: None,
            failure_states: Vec::new(),
            max_parallel_jobs: 1,
        }
    }
}

impl PollerConfig {
    /// Creates configuration from environment variables
    ///
    /// Expected environment variables (all optional):
    /// - CFOPS_POLL_INTERVAL_MS (milliseconds between polls)
    /// - CFOPS_POLL_DEADLINE_SECS (seconds before a poll is abandoned)
    /// - CFOPS_FAILURE_STATES (comma separated, e.g. "error,cancelled")
    /// - CFOPS_MAX_PARALLEL_JOBS (default: 1)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&'static str) -> Option<String>,
    {
        let interval = parse_var(&lookup, "CFOPS_POLL_INTERVAL_MS")?.map(Duration::from_millis);
        let deadline = parse_var(&lookup, "CFOPS_POLL_DEADLINE_SECS")?.map(Duration::from_secs);

        let failure_states = lookup("CFOPS_FAILURE_STATES")
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        let max_parallel_jobs = parse_var(&lookup, "CFOPS_MAX_PARALLEL_JOBS")?
            .map(|n| n as usize)
            .unwrap_or(1);

        Ok(Self {
            interval,
            deadline,
            failure_states,
            max_parallel_jobs,
        })
    }

    /// Validates the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_parallel_jobs == 0 {
            return Err(ConfigError::Invalid(
                "max_parallel_jobs must be greater than 0".to_string(),
            ));
        }

        if self.deadline == Some(Duration::ZERO) {
            return Err(ConfigError::Invalid(
                "deadline must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

fn parse_var<F>(lookup: &F, name: &'static str) -> Result<Option<u64>, ConfigError>
where
    F: Fn(&'static str) -> Option<String>,
{
    match lookup(name) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse::<u64>()
            .map(Some)
            .map_err(|_| ConfigError::InvalidVar { name, value }),
    }
}

/// Director coordinates
#[derive(Clone)]
pub struct DirectorConfig {
    /// Director base URL (e.g., "https://10.0.0.6:25555")
    pub url: String,
    pub username: String,
    pub password: String,
    /// Accept self-signed director certificates
    pub skip_tls_verify: bool,
}

impl DirectorConfig {
    pub fn new(
        url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        let url = url.into();
        Self {
            url: url.trim_end_matches('/').to_string(),
            username: username.into(),
            password: password.into(),
            skip_tls_verify: false,
        }
    }

    pub fn with_skip_tls_verify(mut self, skip: bool) -> Self {
        self.skip_tls_verify = skip;
        self
    }

    /// Validates the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.url.starts_with("http://") && !self.url.starts_with("https://") {
            return Err(ConfigError::Invalid(
                "director url must start with http:// or https://".to_string(),
            ));
        }

        if self.username.is_empty() {
            return Err(ConfigError::Invalid("username cannot be empty".to_string()));
        }

        if self.password.is_empty() {
            return Err(ConfigError::Invalid("password cannot be empty".to_string()));
        }

        Ok(())
    }
}

impl std::fmt::Debug for DirectorConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DirectorConfig")
            .field("url", &self.url)
            .field("username", &self.username)
            .field("password", &"***")
            .field("skip_tls_verify", &self.skip_tls_verify)
            .finish()
    }
}
