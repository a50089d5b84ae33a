//! Cfops Client
//!
//! Tracks asynchronous operations on a platform's two control planes, the
//! deployment director and the platform controller, and composes them into
//! multi-step orchestrations.
//!
//! The crate is organized around three pollers:
//! - [`task`]: director task id extraction and status decoding, with
//!   [`DirectorClient`] running the retry loop on top
//! - [`event`]: generic event-state polling until `state == "done"`
//! - [`toggle`]: toggling named jobs, one event poll per job, with partial
//!   failures aggregated
//!
//! All HTTP goes through the [`RestRunner`] capability, so every poller can be
//! driven by an in-process fake.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use cfops_client::{
//!     HttpEventPollerFactory, HttpRestRunner, HttpToggleAction, JobToggler, PollerConfig,
//!     ToggleSettings,
//! };
//! use cfops_core::domain::toggle::{JobState, JobToggleRequest};
//! use cfops_core::dto::rest::BodyFormat;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let settings = ToggleSettings {
//!         server_url: "https://10.0.0.6:25555".to_string(),
//!         deployment: "cf".to_string(),
//!         username: "director".to_string(),
//!         password: "secret".to_string(),
//!         state: JobState::Stopped,
//!         body_format: BodyFormat::Json,
//!     };
//!     let runner = Arc::new(HttpRestRunner::new());
//!     let toggler = JobToggler::new(
//!         settings,
//!         Arc::new(HttpToggleAction::new(true)?),
//!         Arc::new(HttpEventPollerFactory::new(runner, PollerConfig::default())),
//!     );
//!
//!     toggler
//!         .toggle_jobs(&JobToggleRequest::new(["cloud_controller", "cloud_controller_worker"]))
//!         .await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod director;
pub mod error;
pub mod event;
pub mod rest;
pub mod task;
pub mod toggle;

// Re-export commonly used types
pub use config::{ConfigError, DirectorConfig, PollerConfig};
pub use director::DirectorClient;
pub use error::{AggregateToggleError, PollError, RestError, TaskError, ToggleError};
pub use event::{
    EventPollerFactory, EventStatePoller, EventWaiter, HttpEventPollerFactory, PollerFactoryFn,
};
pub use rest::{HttpRestRunner, RestAdapter, RestResponse, RestRunner};
pub use task::{extract_task_id, fetch_task_status};
pub use toggle::{
    HttpToggleAction, JobToggler, ToggleAction, ToggleActionPolicy, ToggleFn, ToggleReport,
    ToggleSettings, toggle_location,
};
