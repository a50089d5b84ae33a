//! Event State Poller
//!
//! Repeats one request through a [`RestRunner`] until the returned document
//! reports `state == "done"`. The loop only tolerates "state present but not
//! yet done"; a decode failure or a Rest Runner error ends it immediately.
//!
//! Without a deadline the loop is unbounded. Completion is signalled by the
//! remote system alone; callers wanting a limit set
//! [`PollerConfig::deadline`].

use async_trait::async_trait;
use cfops_core::domain::event::{EventDocument, EventObject, PollOutcome};
use cfops_core::dto::rest::RestRequest;
use std::sync::Arc;
use tracing::{debug, info};

use crate::config::PollerConfig;
use crate::error::PollError;
use crate::rest::RestRunner;

/// Waits for a remote event to reach `done`
#[async_trait]
pub trait EventWaiter: Send + Sync {
    /// Poll until the event is done
    ///
    /// # Arguments
    /// * `initial` - A body already in hand, classified before any request is
    ///   made; `None` starts with a fresh request
    /// * `event` - Caller-owned correlation handle, only used for logging
    async fn wait_for_event_state_done(
        &self,
        initial: Option<Vec<u8>>,
        event: &EventObject,
    ) -> Result<(), PollError>;
}

/// Builds one [`EventWaiter`] per awaited event
pub trait EventPollerFactory: Send + Sync {
    fn create(&self, request: RestRequest) -> Box<dyn EventWaiter>;
}

/// Adapts a plain function into an [`EventPollerFactory`]
pub struct PollerFactoryFn<F>(pub F);

impl<F> PollerFactoryFn<F>
where
    F: Fn(RestRequest) -> Box<dyn EventWaiter> + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

impl<F> EventPollerFactory for PollerFactoryFn<F>
where
    F: Fn(RestRequest) -> Box<dyn EventWaiter> + Send + Sync,
{
    fn create(&self, request: RestRequest) -> Box<dyn EventWaiter> {
        (self.0)(request)
    }
}

/// Polls a single event through a shared Rest Runner
pub struct EventStatePoller {
    request: RestRequest,
    runner: Arc<dyn RestRunner>,
    config: PollerConfig,
}

impl EventStatePoller {
    pub fn new(request: RestRequest, runner: Arc<dyn RestRunner>, config: PollerConfig) -> Self {
        Self {
            request,
            runner,
            config,
        }
    }

    pub fn request(&self) -> &RestRequest {
        &self.request
    }

    /// Request `polls + 1`, returning its body
    async fn fetch(&self, polls: &mut u64) -> Result<Vec<u8>, PollError> {
        *polls += 1;
        let response = self
            .runner
            .run(&self.request)
            .await
            .map_err(|source| PollError::Terminal {
                polls: *polls,
                source,
            })?;
        Ok(response.body)
    }

    async fn poll_until_done(
        &self,
        initial: Option<Vec<u8>>,
        event: &EventObject,
    ) -> Result<(), PollError> {
        let mut polls = 0u64;
        let mut body = match initial {
            Some(body) => body,
            None => self.fetch(&mut polls).await?,
        };

        loop {
            let document = EventDocument::decode(&body)?;

            match PollOutcome::classify(&document.state, &self.config.failure_states) {
                PollOutcome::Done => {
                    info!(event = %event.label, polls, "event reached done");
                    return Ok(());
                }
                PollOutcome::Failed => {
                    return Err(PollError::FailureState {
                        state: document.state,
                    });
                }
                PollOutcome::Continue => {
                    debug!(
                        event = %event.label,
                        polls,
                        state = %document.state,
                        "event not done yet"
                    );
                }
            }

            match self.config.interval {
                Some(interval) => tokio::time::sleep(interval).await,
                // Runners may answer without awaiting; let deadlines and sibling tasks run.
                None => tokio::task::yield_now().await,
            }

            body = self.fetch(&mut polls).await?;
        }
    }
}

#[async_trait]
impl EventWaiter for EventStatePoller {
    async fn wait_for_event_state_done(
        &self,
        initial: Option<Vec<u8>>,
        event: &EventObject,
    ) -> Result<(), PollError> {
        match self.config.deadline {
            None => self.poll_until_done(initial, event).await,
            Some(after) => tokio::time::timeout(after, self.poll_until_done(initial, event))
                .await
                .map_err(|_| PollError::DeadlineExceeded { after })?,
        }
    }
}

/// Factory producing [`EventStatePoller`]s that share one Rest Runner
#[derive(Clone)]
pub struct HttpEventPollerFactory {
    runner: Arc<dyn RestRunner>,
    config: PollerConfig,
}

impl HttpEventPollerFactory {
    pub fn new(runner: Arc<dyn RestRunner>, config: PollerConfig) -> Self {
        Self { runner, config }
    }
}

impl EventPollerFactory for HttpEventPollerFactory {
    fn create(&self, request: RestRequest) -> Box<dyn EventWaiter> {
        Box::new(EventStatePoller::new(
            request,
            Arc::clone(&self.runner),
            self.config.clone(),
        ))
    }
}
