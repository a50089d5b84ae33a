//! Director client
//!
//! Drives director tasks end to end: submit a task-initiating request, read the
//! task id off the redirect once, then re-fetch the task status until the task
//! reaches a terminal classification.

use cfops_core::domain::task::{RemoteTask, TaskState};
use cfops_core::dto::rest::{BodyFormat, HttpMethod};
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use reqwest::redirect::Policy;
use tracing::{debug, info};

use crate::config::{DirectorConfig, PollerConfig};
use crate::error::TaskError;
use crate::rest::{RestResponse, to_reqwest_method};
use crate::task::{extract_task_id, fetch_task_status};

/// HTTP client for director tasks
///
/// Redirects are never followed so the 302 that accepts a task stays visible.
#[derive(Debug, Clone)]
pub struct DirectorClient {
    config: DirectorConfig,
    client: Client,
}

impl DirectorClient {
    /// Create a new director client
    ///
    /// # Example
    /// ```no_run
    /// use cfops_client::{DirectorClient, DirectorConfig, PollerConfig};
    ///
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let config = DirectorConfig::new("https://10.0.0.6:25555", "director", "secret")
    ///     .with_skip_tls_verify(true);
    /// let director = DirectorClient::new(config)?;
    /// let task = director.wait_for_task(42, &PollerConfig::default()).await?;
    /// println!("task {} finished: {}", task.id, task.result);
    /// # Ok(())
    /// # }
    /// ```
    pub fn new(config: DirectorConfig) -> Result<Self, TaskError> {
        let client = Client::builder()
            .redirect(Policy::none())
            .danger_accept_invalid_certs(config.skip_tls_verify)
            .build()?;
        Ok(Self { config, client })
    }

    /// Use a pre-configured client
    ///
    /// The client must not follow redirects.
    pub fn with_client(config: DirectorConfig, client: Client) -> Self {
        Self { config, client }
    }

    pub fn config(&self) -> &DirectorConfig {
        &self.config
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.config.url, path.trim_start_matches('/'))
    }

    async fn send(
        &self,
        method: HttpMethod,
        url: &str,
        body: Option<(Vec<u8>, BodyFormat)>,
    ) -> Result<RestResponse, TaskError> {
        let mut request = self
            .client
            .request(to_reqwest_method(method), url)
            .basic_auth(&self.config.username, Some(&self.config.password));

        if let Some((body, format)) = body {
            request = request.header(CONTENT_TYPE, format.content_type()).body(body);
        }

        Ok(RestResponse::read(request.send().await?).await?)
    }

    /// Submit a task-initiating request and return the new task id
    ///
    /// # Arguments
    /// * `method` - HTTP method of the operation
    /// * `path` - Path relative to the director URL (e.g., "deployments")
    /// * `body` - Optional payload and its format
    pub async fn submit(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<(Vec<u8>, BodyFormat)>,
    ) -> Result<u64, TaskError> {
        let url = self.url(path);
        let response = self.send(method, &url, body).await?;
        let id = extract_task_id(&response)?;

        info!("Director accepted {} {} as task {}", method, url, id);
        Ok(id)
    }

    /// Fetch one snapshot of a task
    pub async fn task_status(&self, id: u64) -> Result<RemoteTask, TaskError> {
        let url = self.url(&format!("tasks/{}", id));
        let response = self.send(HttpMethod::Get, &url, None).await?;
        fetch_task_status(response)
    }

    /// Re-fetch a task until it is done or errored
    ///
    /// Honours `config.interval` between fetches and `config.deadline` overall.
    pub async fn wait_for_task(
        &self,
        id: u64,
        config: &PollerConfig,
    ) -> Result<RemoteTask, TaskError> {
        match config.deadline {
            None => self.poll_task(id, config).await,
            Some(after) => tokio::time::timeout(after, self.poll_task(id, config))
                .await
                .map_err(|_| TaskError::DeadlineExceeded { id, after })?,
        }
    }

    async fn poll_task(&self, id: u64, config: &PollerConfig) -> Result<RemoteTask, TaskError> {
        loop {
            let task = self.task_status(id).await?;
            if let Some(task) = settle(task)? {
                return Ok(task);
            }

            match config.interval {
                Some(interval) => tokio::time::sleep(interval).await,
                None => tokio::task::yield_now().await,
            }
        }
    }
}

/// Decide what one task snapshot means for the retry loop
///
/// `Ok(None)` keeps waiting.
fn settle(task: RemoteTask) -> Result<Option<RemoteTask>, TaskError> {
    let state = task
        .classification()
        .map_err(|unrecognized| TaskError::UnrecognizedState {
            id: task.id,
            state: unrecognized.0,
        })?;

    match state {
        TaskState::Done => {
            info!("Director task {} done", task.id);
            Ok(Some(task))
        }
        TaskState::Error => Err(TaskError::Failed {
            id: task.id,
            description: task.description,
            result: task.result,
        }),
        TaskState::Processing => {
            debug!("Director task {} still processing", task.id);
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(state: &str) -> RemoteTask {
        RemoteTask {
            id: 17,
            state: state.to_string(),
            description: "stop job".to_string(),
            result: "boom".to_string(),
        }
    }

    #[test]
    fn test_settle_done_returns_task() {
        let settled = settle(task("done")).unwrap();
        assert_eq!(settled.map(|t| t.id), Some(17));
    }

    #[test]
    fn test_settle_processing_keeps_waiting() {
        assert!(settle(task("processing")).unwrap().is_none());
    }

    #[test]
    fn test_settle_error_carries_description_and_result() {
        match settle(task("error")) {
            Err(TaskError::Failed {
                id,
                description,
                result,
            }) => {
                assert_eq!(id, 17);
                assert_eq!(description, "stop job");
                assert_eq!(result, "boom");
            }
            other => panic!("expected failed task, got {:?}", other),
        }
    }

    #[test]
    fn test_settle_unrecognized_state() {
        assert!(matches!(
            settle(task("cancelled")),
            Err(TaskError::UnrecognizedState { id: 17, ref state }) if state == "cancelled"
        ));
    }

    #[test]
    fn test_url_joins_paths() {
        let config = DirectorConfig::new("https://10.0.0.6:25555/", "director", "secret");
        let director = DirectorClient::with_client(config, Client::new());
        assert_eq!(director.url("/tasks/3"), "https://10.0.0.6:25555/tasks/3");
        assert_eq!(director.url("deployments"), "https://10.0.0.6:25555/deployments");
    }
}
