//! Configuration module
//!
//! Director coordinates from the command line, polling knobs from the
//! environment.

use anyhow::{Context, Result};
use cfops_client::{DirectorConfig, PollerConfig};
use std::time::Duration;

/// Pause between director task polls when none is configured
const DIRECTOR_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Director task state that ends a poll with failure
const DIRECTOR_FAILURE_STATE: &str = "error";

/// CLI configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub director: DirectorConfig,
    pub poller: PollerConfig,
}

impl Config {
    /// Builds and validates the configuration
    pub fn load(
        director_url: String,
        username: String,
        password: String,
        skip_tls_verify: bool,
    ) -> Result<Self> {
        let director = DirectorConfig::new(director_url, username, password)
            .with_skip_tls_verify(skip_tls_verify);

        let poller = PollerConfig::from_env().context("Failed to read polling configuration")?;
        poller.validate().context("Invalid polling configuration")?;

        Ok(Self { director, poller })
    }

    /// Director config, checked before any remote call
    pub fn director(&self) -> Result<&DirectorConfig> {
        self.director
            .validate()
            .context("Invalid director configuration")?;
        Ok(&self.director)
    }

    /// Polling settings for director tasks
    ///
    /// Unset knobs fall back to a one second interval and to `error` as a
    /// failure state, so a failed task ends the poll instead of hanging it.
    pub fn director_poller(&self) -> PollerConfig {
        let mut poller = self.poller.clone();
        if poller.interval.is_none() {
            poller.interval = Some(DIRECTOR_POLL_INTERVAL);
        }
        if poller.failure_states.is_empty() {
            poller.failure_states = vec![DIRECTOR_FAILURE_STATE.to_string()];
        }
        poller
    }
}
