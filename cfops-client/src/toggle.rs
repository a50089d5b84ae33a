//! Job Toggle Orchestrator
//!
//! Starts or stops named jobs of a deployment and waits for the director to
//! finish each change. Per job: toggle once, build a fresh event poller, wait
//! for `done`. Jobs in a batch are independent; every job is attempted and
//! all failures are reported together.

use async_trait::async_trait;
use cfops_core::domain::event::EventObject;
use cfops_core::domain::toggle::{JobState, JobToggleRequest};
use cfops_core::dto::rest::{BodyFormat, HttpMethod, RestRequest};
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use reqwest::redirect::Policy;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

use crate::error::{AggregateToggleError, TaskError, ToggleError};
use crate::event::EventPollerFactory;
use crate::rest::RestResponse;
use crate::task::redirect_location;

/// Remote operation that changes a job's state
///
/// Returns the location of the event that tracks the change.
#[async_trait]
pub trait ToggleAction: Send + Sync {
    async fn toggle(
        &self,
        server_url: &str,
        username: &str,
        password: &str,
    ) -> Result<String, TaskError>;
}

/// Adapts a plain function into a [`ToggleAction`]
pub struct ToggleFn<F>(pub F);

impl<F> ToggleFn<F>
where
    F: Fn(&str, &str, &str) -> Result<String, TaskError> + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

#[async_trait]
impl<F> ToggleAction for ToggleFn<F>
where
    F: Fn(&str, &str, &str) -> Result<String, TaskError> + Send + Sync,
{
    async fn toggle(
        &self,
        server_url: &str,
        username: &str,
        password: &str,
    ) -> Result<String, TaskError> {
        (self.0)(server_url, username, password)
    }
}

/// Toggle action that PUTs to the director job URL
///
/// The director accepts the change with a 302 pointing at the task that
/// carries it out; that location is the result.
#[derive(Debug, Clone)]
pub struct HttpToggleAction {
    client: Client,
}

impl HttpToggleAction {
    pub fn new(skip_tls_verify: bool) -> Result<Self, TaskError> {
        let client = Client::builder()
            .redirect(Policy::none())
            .danger_accept_invalid_certs(skip_tls_verify)
            .build()?;
        Ok(Self { client })
    }

    /// Use a pre-configured client
    ///
    /// The client must not follow redirects.
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ToggleAction for HttpToggleAction {
    async fn toggle(
        &self,
        server_url: &str,
        username: &str,
        password: &str,
    ) -> Result<String, TaskError> {
        let response = self
            .client
            .put(server_url)
            .basic_auth(username, Some(password))
            .header(CONTENT_TYPE, BodyFormat::Yaml.content_type())
            .send()
            .await?;

        toggle_location(&RestResponse::read(response).await?)
    }
}

/// Read the task location off a job toggle response
///
/// The director answers an accepted toggle with a 302; anything else is an
/// error, as is a redirect without a `Location`.
pub fn toggle_location(response: &RestResponse) -> Result<String, TaskError> {
    Ok(redirect_location(response)?.to_string())
}

/// What to do when the toggle action itself fails
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ToggleActionPolicy {
    /// Log the error and wait on the job URL anyway
    #[default]
    Proceed,
    /// Report the error without polling
    Abort,
}

/// Per-orchestrator settings, fixed for every job it toggles
#[derive(Clone)]
pub struct ToggleSettings {
    /// Director base URL (e.g., "https://10.0.0.6:25555")
    pub server_url: String,
    pub deployment: String,
    pub username: String,
    pub password: String,
    pub state: JobState,
    pub body_format: BodyFormat,
}

impl std::fmt::Debug for ToggleSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToggleSettings")
            .field("server_url", &self.server_url)
            .field("deployment", &self.deployment)
            .field("username", &self.username)
            .field("password", &"***")
            .field("state", &self.state)
            .field("body_format", &self.body_format)
            .finish()
    }
}

/// Per-job results of a batch
#[derive(Debug, Default)]
pub struct ToggleReport {
    pub succeeded: Vec<String>,
    pub failures: Vec<ToggleError>,
}

impl ToggleReport {
    fn record(&mut self, job: &str, result: Result<(), ToggleError>) {
        match result {
            Ok(()) => self.succeeded.push(job.to_string()),
            Err(e) => {
                error!("{}", e);
                self.failures.push(e);
            }
        }
    }

    /// Ok when every job succeeded, otherwise every failure at once
    pub fn into_result(self) -> Result<Vec<String>, AggregateToggleError> {
        if self.failures.is_empty() {
            Ok(self.succeeded)
        } else {
            Err(AggregateToggleError {
                succeeded: self.succeeded,
                failures: self.failures,
            })
        }
    }
}

/// Toggles deployment jobs and waits for each change to finish
pub struct JobToggler {
    settings: ToggleSettings,
    toggle_action: Arc<dyn ToggleAction>,
    poller_factory: Arc<dyn EventPollerFactory>,
    policy: ToggleActionPolicy,
}

impl JobToggler {
    pub fn new(
        settings: ToggleSettings,
        toggle_action: Arc<dyn ToggleAction>,
        poller_factory: Arc<dyn EventPollerFactory>,
    ) -> Self {
        Self {
            settings,
            toggle_action,
            poller_factory,
            policy: ToggleActionPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: ToggleActionPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn settings(&self) -> &ToggleSettings {
        &self.settings
    }

    /// Director URL that changes the state of one job instance
    pub fn job_url(&self, job: &str, server_url: &str, index: usize) -> String {
        format!(
            "{}/deployments/{}/jobs/{}/{}?state={}",
            server_url.trim_end_matches('/'),
            self.settings.deployment,
            job,
            index,
            self.settings.state
        )
    }

    /// Toggle one job and wait for its event to reach `done`
    ///
    /// The toggle action runs exactly once per call, whatever happens after.
    ///
    /// # Arguments
    /// * `job` - Job name
    /// * `server_url` - Director base URL
    /// * `index` - Job instance index
    pub async fn toggle_job(
        &self,
        job: &str,
        server_url: &str,
        index: usize,
    ) -> Result<(), ToggleError> {
        let job_url = self.job_url(job, server_url, index);
        info!("Toggling job {} to {}", job, self.settings.state);

        let toggled = self
            .toggle_action
            .toggle(&job_url, &self.settings.username, &self.settings.password)
            .await;

        let event_url = match toggled {
            Ok(location) if !location.is_empty() => location,
            Ok(_) => job_url,
            Err(source) => match self.policy {
                ToggleActionPolicy::Abort => {
                    return Err(ToggleError::Action {
                        job: job.to_string(),
                        source,
                    });
                }
                ToggleActionPolicy::Proceed => {
                    warn!("Toggle action for job {} failed, waiting anyway: {}", job, source);
                    job_url
                }
            },
        };

        let poller = self.poller_factory.create(RestRequest::new(
            HttpMethod::Get,
            event_url,
            self.settings.username.clone(),
            self.settings.password.clone(),
            self.settings.body_format,
        ));

        poller
            .wait_for_event_state_done(None, &EventObject::new(job))
            .await
            .map_err(|source| ToggleError::Poll {
                job: job.to_string(),
                source,
            })?;

        info!("Job {} is {}", job, self.settings.state);
        Ok(())
    }

    /// Toggle every job in order, one after the other
    ///
    /// A failed job never stops the batch.
    pub async fn toggle_jobs(
        &self,
        request: &JobToggleRequest,
    ) -> Result<Vec<String>, AggregateToggleError> {
        let mut report = ToggleReport::default();

        for (index, job) in request.indexed() {
            let result = self.toggle_job(job, &self.settings.server_url, index).await;
            report.record(job, result);
        }

        report.into_result()
    }

    /// Toggle jobs concurrently, at most `max_parallel` at a time
    ///
    /// Each job keeps its own toggle-then-poll order; results are reported in
    /// request order.
    pub async fn toggle_jobs_concurrent(
        self: Arc<Self>,
        request: &JobToggleRequest,
        max_parallel: usize,
    ) -> Result<Vec<String>, AggregateToggleError> {
        let semaphore = Arc::new(Semaphore::new(max_parallel.max(1)));
        let mut set = JoinSet::new();

        for (index, job) in request.indexed() {
            let toggler = Arc::clone(&self);
            let semaphore = Arc::clone(&semaphore);
            let job = job.to_string();

            set.spawn(async move {
                let result = match semaphore.acquire_owned().await {
                    Ok(_permit) => {
                        toggler
                            .toggle_job(&job, &toggler.settings.server_url, index)
                            .await
                    }
                    Err(e) => Err(ToggleError::Aborted {
                        job: job.clone(),
                        message: e.to_string(),
                    }),
                };
                (index, result)
            });
        }

        let mut results: Vec<Option<Result<(), ToggleError>>> =
            (0..request.len()).map(|_| None).collect();
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok((index, result)) => results[index] = Some(result),
                Err(e) => warn!("Toggle task panicked: {}", e),
            }
        }

        let mut report = ToggleReport::default();
        for ((_, job), result) in request.indexed().zip(results) {
            let result = result.unwrap_or_else(|| {
                Err(ToggleError::Aborted {
                    job: job.to_string(),
                    message: "toggle task did not complete".to_string(),
                })
            });
            report.record(job, result);
        }

        report.into_result()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{PollError, RestError};
    use crate::event::{EventWaiter, HttpEventPollerFactory, PollerFactoryFn};
    use crate::rest::{RestAdapter, RestRunner};
    use crate::PollerConfig;
    use reqwest::StatusCode;
    use reqwest::header::{HeaderValue, LOCATION};
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Counters {
        toggles: AtomicUsize,
        created: AtomicUsize,
        waits: AtomicUsize,
        toggled_urls: Mutex<Vec<String>>,
        polled_urls: Mutex<Vec<String>>,
    }

    struct SuccessWaiter(Arc<Counters>);

    #[async_trait]
    impl EventWaiter for SuccessWaiter {
        async fn wait_for_event_state_done(
            &self,
            _initial: Option<Vec<u8>>,
            _event: &EventObject,
        ) -> Result<(), PollError> {
            self.0.waits.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct FailureWaiter(Arc<Counters>);

    #[async_trait]
    impl EventWaiter for FailureWaiter {
        async fn wait_for_event_state_done(
            &self,
            _initial: Option<Vec<u8>>,
            _event: &EventObject,
        ) -> Result<(), PollError> {
            self.0.waits.fetch_add(1, Ordering::SeqCst);
            Err(PollError::Terminal {
                polls: 1,
                source: RestError::status(StatusCode::INTERNAL_SERVER_ERROR, "this is an error"),
            })
        }
    }

    fn settings() -> ToggleSettings {
        ToggleSettings {
            server_url: "https://10.0.0.6:25555".to_string(),
            deployment: "cf-deployment".to_string(),
            username: "director".to_string(),
            password: "secret".to_string(),
            state: JobState::Stopped,
            body_format: BodyFormat::Json,
        }
    }

    fn stop_url(job: &str, index: usize) -> String {
        format!(
            "https://10.0.0.6:25555/deployments/cf-deployment/jobs/{}/{}?state=stopped",
            job, index
        )
    }

    fn toggle_ok(counters: Arc<Counters>) -> Arc<dyn ToggleAction> {
        Arc::new(ToggleFn::new(move |url: &str, _: &str, _: &str| {
            counters.toggles.fetch_add(1, Ordering::SeqCst);
            counters.toggled_urls.lock().unwrap().push(url.to_string());
            Ok(format!("https://10.0.0.6:25555/tasks/{}", 100))
        }))
    }

    fn toggle_err(counters: Arc<Counters>) -> Arc<dyn ToggleAction> {
        Arc::new(ToggleFn::new(move |_: &str, _: &str, _: &str| {
            counters.toggles.fetch_add(1, Ordering::SeqCst);
            Err(TaskError::RedirectStatusCode {
                status: StatusCode::OK,
            })
        }))
    }

    /// Factory whose waiters all succeed, or all fail
    fn factory(counters: Arc<Counters>, fail: bool) -> Arc<dyn EventPollerFactory> {
        Arc::new(PollerFactoryFn::new(move |request: RestRequest| {
            counters.created.fetch_add(1, Ordering::SeqCst);
            counters.polled_urls.lock().unwrap().push(request.url.clone());
            if fail {
                Box::new(FailureWaiter(Arc::clone(&counters))) as Box<dyn EventWaiter>
            } else {
                Box::new(SuccessWaiter(Arc::clone(&counters)))
            }
        }))
    }

    #[test]
    fn test_toggle_location_returns_redirect_url() {
        let mut response = RestResponse::new(StatusCode::FOUND, Vec::new());
        response.headers.insert(
            LOCATION,
            HeaderValue::from_static("https://10.0.0.6:25555/tasks/42"),
        );

        assert_eq!(
            toggle_location(&response).unwrap(),
            "https://10.0.0.6:25555/tasks/42"
        );
    }

    #[test]
    fn test_toggle_location_rejects_non_redirect() {
        let mut response = RestResponse::new(StatusCode::OK, "{}");
        response.headers.insert(
            LOCATION,
            HeaderValue::from_static("https://10.0.0.6:25555/tasks/42"),
        );

        assert!(matches!(
            toggle_location(&response),
            Err(TaskError::RedirectStatusCode { status }) if status == StatusCode::OK
        ));
    }

    #[test]
    fn test_toggle_location_requires_location_header() {
        let response = RestResponse::new(StatusCode::FOUND, Vec::new());
        assert!(matches!(
            toggle_location(&response),
            Err(TaskError::MissingLocation)
        ));
    }

    #[tokio::test]
    async fn test_toggle_job_calls_through_the_whole_chain() {
        let counters = Arc::new(Counters::default());
        let toggler = JobToggler::new(
            settings(),
            toggle_ok(counters.clone()),
            factory(counters.clone(), false),
        );

        toggler
            .toggle_job("cloud_controller", "https://10.0.0.6:25555/", 1)
            .await
            .unwrap();

        assert_eq!(counters.toggles.load(Ordering::SeqCst), 1);
        assert_eq!(counters.created.load(Ordering::SeqCst), 1);
        assert_eq!(counters.waits.load(Ordering::SeqCst), 1);
        assert_eq!(
            counters.toggled_urls.lock().unwrap().as_slice(),
            [stop_url("cloud_controller", 1)]
        );
        assert_eq!(
            counters.polled_urls.lock().unwrap().as_slice(),
            ["https://10.0.0.6:25555/tasks/100"]
        );
    }

    #[tokio::test]
    async fn test_toggle_job_wait_failure_still_toggles_exactly_once() {
        let counters = Arc::new(Counters::default());
        let toggler = JobToggler::new(
            settings(),
            toggle_ok(counters.clone()),
            factory(counters.clone(), true),
        );

        let err = toggler
            .toggle_job("cloud_controller", "https://10.0.0.6:25555", 0)
            .await
            .unwrap_err();

        assert!(matches!(err, ToggleError::Poll { ref job, .. } if job == "cloud_controller"));
        assert_eq!(counters.toggles.load(Ordering::SeqCst), 1);
        assert_eq!(counters.waits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_toggle_error_proceeds_to_poll_job_url_by_default() {
        let counters = Arc::new(Counters::default());
        let toggler = JobToggler::new(
            settings(),
            toggle_err(counters.clone()),
            factory(counters.clone(), false),
        );

        toggler
            .toggle_job("cloud_controller", "https://10.0.0.6:25555", 0)
            .await
            .unwrap();

        assert_eq!(counters.toggles.load(Ordering::SeqCst), 1);
        assert_eq!(counters.waits.load(Ordering::SeqCst), 1);
        assert_eq!(
            counters.polled_urls.lock().unwrap().as_slice(),
            [stop_url("cloud_controller", 0)]
        );
    }

    #[tokio::test]
    async fn test_toggle_error_aborts_under_abort_policy() {
        let counters = Arc::new(Counters::default());
        let toggler = JobToggler::new(
            settings(),
            toggle_err(counters.clone()),
            factory(counters.clone(), false),
        )
        .with_policy(ToggleActionPolicy::Abort);

        let err = toggler
            .toggle_job("cloud_controller", "https://10.0.0.6:25555", 0)
            .await
            .unwrap_err();

        assert!(matches!(err, ToggleError::Action { ref job, .. } if job == "cloud_controller"));
        assert_eq!(counters.toggles.load(Ordering::SeqCst), 1);
        assert_eq!(counters.created.load(Ordering::SeqCst), 0);
        assert_eq!(counters.waits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_toggle_jobs_attempts_every_job_and_reports_partial_failure() {
        let counters = Arc::new(Counters::default());
        let waits = counters.clone();
        // Job A's event completes, job B's event poll fails.
        let factory: Arc<dyn EventPollerFactory> =
            Arc::new(PollerFactoryFn::new(move |request: RestRequest| {
                waits.created.fetch_add(1, Ordering::SeqCst);
                if request.url.contains("/jobs/job_b/") {
                    Box::new(FailureWaiter(Arc::clone(&waits))) as Box<dyn EventWaiter>
                } else {
                    Box::new(SuccessWaiter(Arc::clone(&waits)))
                }
            }));
        let toggle_counters = counters.clone();
        let toggle: Arc<dyn ToggleAction> =
            Arc::new(ToggleFn::new(move |url: &str, _: &str, _: &str| {
                toggle_counters.toggles.fetch_add(1, Ordering::SeqCst);
                // Empty location: poll the job URL itself.
                toggle_counters.toggled_urls.lock().unwrap().push(url.to_string());
                Ok(String::new())
            }));
        let toggler = JobToggler::new(settings(), toggle, factory);

        let err = toggler
            .toggle_jobs(&JobToggleRequest::new(["job_a", "job_b"]))
            .await
            .unwrap_err();

        assert_eq!(counters.toggles.load(Ordering::SeqCst), 2);
        assert_eq!(counters.waits.load(Ordering::SeqCst), 2);
        assert_eq!(err.succeeded, vec!["job_a"]);
        assert_eq!(err.failed_jobs(), vec!["job_b"]);
        assert_eq!(
            counters.toggled_urls.lock().unwrap().as_slice(),
            [
                stop_url("job_a", 0),
                stop_url("job_b", 1),
            ]
        );
    }

    #[tokio::test]
    async fn test_toggle_jobs_collects_every_failure() {
        let counters = Arc::new(Counters::default());
        let toggler = JobToggler::new(
            settings(),
            toggle_ok(counters.clone()),
            factory(counters.clone(), true),
        );

        let err = toggler
            .toggle_jobs(&JobToggleRequest::new(["job_a", "job_b", "job_c"]))
            .await
            .unwrap_err();

        assert!(err.succeeded.is_empty());
        assert_eq!(err.failed_jobs(), vec!["job_a", "job_b", "job_c"]);
        assert_eq!(counters.toggles.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_toggle_jobs_success_lists_jobs_in_order() {
        let counters = Arc::new(Counters::default());
        let toggler = JobToggler::new(
            settings(),
            toggle_ok(counters.clone()),
            factory(counters.clone(), false),
        );

        let done = toggler
            .toggle_jobs(&JobToggleRequest::new(["job_a", "someurl.com"]))
            .await
            .unwrap();

        assert_eq!(done, vec!["job_a", "someurl.com"]);
        assert_eq!(counters.created.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_toggle_jobs_concurrent_keeps_request_order() {
        let counters = Arc::new(Counters::default());
        let waits = counters.clone();
        let factory: Arc<dyn EventPollerFactory> =
            Arc::new(PollerFactoryFn::new(move |request: RestRequest| {
                if request.url.contains("/jobs/job_c/") {
                    Box::new(FailureWaiter(Arc::clone(&waits))) as Box<dyn EventWaiter>
                } else {
                    Box::new(SuccessWaiter(Arc::clone(&waits)))
                }
            }));
        let toggle: Arc<dyn ToggleAction> =
            Arc::new(ToggleFn::new(|_: &str, _: &str, _: &str| Ok(String::new())));
        let toggler = Arc::new(JobToggler::new(settings(), toggle, factory));

        let err = Arc::clone(&toggler)
            .toggle_jobs_concurrent(
                &JobToggleRequest::new(["job_a", "job_b", "job_c", "job_d"]),
                2,
            )
            .await
            .unwrap_err();

        assert_eq!(err.succeeded, vec!["job_a", "job_b", "job_d"]);
        assert_eq!(err.failed_jobs(), vec!["job_c"]);
        assert_eq!(counters.waits.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_toggle_job_end_to_end_with_event_poller() {
        let polls = Arc::new(AtomicUsize::new(0));
        let counter = polls.clone();
        let runner: Arc<dyn RestRunner> = Arc::new(RestAdapter::new(move |_: &RestRequest| {
            let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
            let body = if n < 3 {
                r#"{"id":100,"state":"processing"}"#
            } else {
                r#"{"id":100,"state":"done"}"#
            };
            Ok(crate::rest::RestResponse::new(StatusCode::OK, body))
        }));
        let counters = Arc::new(Counters::default());
        let toggler = JobToggler::new(
            settings(),
            toggle_ok(counters.clone()),
            Arc::new(HttpEventPollerFactory::new(runner, PollerConfig::default())),
        );

        toggler
            .toggle_job("cloud_controller", "https://10.0.0.6:25555", 0)
            .await
            .unwrap();

        assert_eq!(counters.toggles.load(Ordering::SeqCst), 1);
        assert_eq!(polls.load(Ordering::SeqCst), 3);
    }
}
