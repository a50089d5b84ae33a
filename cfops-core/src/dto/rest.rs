//! Rest Runner request description

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// HTTP method used by a Rest Runner call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(HttpMethod::Get),
            "POST" => Ok(HttpMethod::Post),
            "PUT" => Ok(HttpMethod::Put),
            "DELETE" => Ok(HttpMethod::Delete),
            _ => Err(format!("unsupported HTTP method '{}'", s)),
        }
    }
}

/// Format of the request body
///
/// The director accepts YAML manifests; the controller speaks JSON.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BodyFormat {
    #[default]
    Json,
    Yaml,
}

impl BodyFormat {
    pub fn content_type(self) -> &'static str {
        match self {
            BodyFormat::Json => "application/json",
            BodyFormat::Yaml => "text/yaml",
        }
    }
}

impl FromStr for BodyFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(BodyFormat::Json),
            "yaml" | "yml" => Ok(BodyFormat::Yaml),
            _ => Err(format!("unknown body format '{}' (expected json or yaml)", s)),
        }
    }
}

/// One authenticated call, fixed for the lifetime of a poll
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestRequest {
    pub method: HttpMethod,
    pub url: String,
    pub username: String,
    pub password: String,
    pub body_format: BodyFormat,
}

impl RestRequest {
    pub fn new(
        method: HttpMethod,
        url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
        body_format: BodyFormat,
    ) -> Self {
        Self {
            method,
            url: url.into(),
            username: username.into(),
            password: password.into(),
            body_format,
        }
    }
}

// Password stays out of logs.
impl fmt::Debug for RestRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RestRequest")
            .field("method", &self.method)
            .field("url", &self.url)
            .field("username", &self.username)
            .field("password", &"***")
            .field("body_format", &self.body_format)
            .finish()
    }
}
