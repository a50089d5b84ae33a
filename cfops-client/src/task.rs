//! Director task poller
//!
//! Two single-shot operations on buffered responses:
//! - [`extract_task_id`] reads the task id from the redirect that accepted an
//!   asynchronous operation (applied once per operation)
//! - [`fetch_task_status`] decodes one task status document (applied as many
//!   times as the caller's retry loop needs)

use cfops_core::domain::task::RemoteTask;
use reqwest::StatusCode;
use reqwest::header::LOCATION;

use crate::error::TaskError;
use crate::rest::RestResponse;

const TASKS_SEGMENT: &str = "tasks/";

/// Value of the `Location` header of a 302 response
pub fn redirect_location(response: &RestResponse) -> Result<&str, TaskError> {
    if response.status != StatusCode::FOUND {
        return Err(TaskError::RedirectStatusCode {
            status: response.status,
        });
    }

    response
        .headers
        .get(LOCATION)
        .and_then(|value| value.to_str().ok())
        .ok_or(TaskError::MissingLocation)
}

/// Extract the director task id from a task-initiating response
///
/// Everything up to and including the last `tasks/` of the `Location` header
/// is dropped; the remainder must be a base-10 integer.
pub fn extract_task_id(response: &RestResponse) -> Result<u64, TaskError> {
    let location = redirect_location(response)?;

    let id = match location.rfind(TASKS_SEGMENT) {
        Some(pos) => &location[pos + TASKS_SEGMENT.len()..],
        None => location,
    };

    id.parse().map_err(|source| TaskError::InvalidTaskId {
        value: id.to_string(),
        source,
    })
}

/// Decode a director task status response
///
/// The response is consumed; its body is dropped on every path.
pub fn fetch_task_status(response: RestResponse) -> Result<RemoteTask, TaskError> {
    if response.status != StatusCode::OK {
        return Err(TaskError::StatusCode {
            status: response.status,
        });
    }

    Ok(serde_json::from_slice(&response.body)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cfops_core::domain::task::TaskState;
    use reqwest::header::HeaderValue;

    fn redirect(status: StatusCode, location: Option<&str>) -> RestResponse {
        let mut response = RestResponse::new(status, Vec::new());
        if let Some(location) = location {
            response
                .headers
                .insert(LOCATION, HeaderValue::from_str(location).unwrap());
        }
        response
    }

    #[test]
    fn test_extract_task_id_from_redirect() {
        for id in [1u64, 42, 123_456] {
            let location = format!("https://10.0.0.6:25555/tasks/{}", id);
            let response = redirect(StatusCode::FOUND, Some(&location));
            assert_eq!(extract_task_id(&response).unwrap(), id);
        }
    }

    #[test]
    fn test_extract_task_id_uses_last_tasks_segment() {
        let response = redirect(StatusCode::FOUND, Some("https://director/tasks/tasks/9"));
        assert_eq!(extract_task_id(&response).unwrap(), 9);
    }

    #[test]
    fn test_extract_task_id_rejects_non_redirect_regardless_of_headers() {
        for status in [StatusCode::OK, StatusCode::MOVED_PERMANENTLY, StatusCode::NOT_FOUND] {
            let response = redirect(status, Some("https://director/tasks/5"));
            assert!(matches!(
                extract_task_id(&response),
                Err(TaskError::RedirectStatusCode { status: s }) if s == status
            ));
        }
    }

    #[test]
    fn test_extract_task_id_missing_location() {
        let response = redirect(StatusCode::FOUND, None);
        assert!(matches!(
            extract_task_id(&response),
            Err(TaskError::MissingLocation)
        ));
    }

    #[test]
    fn test_extract_task_id_non_numeric() {
        let response = redirect(StatusCode::FOUND, Some("mysite.com"));
        match extract_task_id(&response) {
            Err(TaskError::InvalidTaskId { value, .. }) => assert_eq!(value, "mysite.com"),
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_fetch_task_status_decodes_document() {
        let body = r#"{"id":12,"state":"processing","description":"run errand","result":""}"#;
        let task = fetch_task_status(RestResponse::new(StatusCode::OK, body)).unwrap();

        assert_eq!(task.id, 12);
        assert_eq!(task.description, "run errand");
        assert_eq!(task.result, "");
        assert_eq!(task.classification(), Ok(TaskState::Processing));
    }

    #[test]
    fn test_fetch_task_status_rejects_non_200() {
        let body = r#"{"id":12,"state":"done","description":"","result":""}"#;
        let response = RestResponse::new(StatusCode::UNAUTHORIZED, body);
        assert!(matches!(
            fetch_task_status(response),
            Err(TaskError::StatusCode { status }) if status == StatusCode::UNAUTHORIZED
        ));
    }

    #[test]
    fn test_fetch_task_status_rejects_malformed_body() {
        let response = RestResponse::new(StatusCode::OK, "<html>oops</html>");
        assert!(matches!(
            fetch_task_status(response),
            Err(TaskError::Decode(_))
        ));
    }
}
