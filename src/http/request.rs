use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::HttpError;

use super::template::resolve_url;

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HttpMethod {
    #[serde(alias = "GET")]
    Get,
    #[serde(alias = "POST")]
    Post,
}

impl HttpMethod {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
        }
    }
}

/// One entry of the ordered request sequence a worker runs per iteration.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestSpec {
    pub label: String,
    pub method: HttpMethod,
    /// Absolute URL, `{{base_url}}` template, or path relative to the base URL.
    pub url_template: String,
    pub headers: Vec<(String, String)>,
    /// Serialized as JSON for POST requests.
    pub payload: Option<serde_json::Value>,
    /// Pause after this request, before the next one in the sequence.
    pub think_time: Option<Duration>,
}

impl RequestSpec {
    #[must_use]
    pub fn get(label: impl Into<String>, url_template: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            method: HttpMethod::Get,
            url_template: url_template.into(),
            headers: Vec::new(),
            payload: None,
            think_time: None,
        }
    }

    #[must_use]
    pub fn post(
        label: impl Into<String>,
        url_template: impl Into<String>,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            label: label.into(),
            method: HttpMethod::Post,
            url_template: url_template.into(),
            headers: Vec::new(),
            payload: Some(payload),
            think_time: None,
        }
    }

    #[must_use]
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((key.into(), value.into()));
        self
    }

    /// Renders the URL template against `base_url`.
    ///
    /// # Errors
    ///
    /// Returns an error when the rendered URL cannot be parsed or joined, or
    /// is not http(s).
    pub fn resolve_url(&self, base_url: &Url) -> Result<Url, HttpError> {
        resolve_url(&self.url_template, base_url)
    }

    /// The request side of a telemetry record: method, headers and payload.
    #[must_use]
    pub fn request_data(&self) -> serde_json::Value {
        let headers: serde_json::Map<String, serde_json::Value> = self
            .headers
            .iter()
            .map(|(key, value)| (key.clone(), serde_json::Value::String(value.clone())))
            .collect();
        serde_json::json!({
            "method": self.method.as_str(),
            "headers": headers,
            "payload": self.payload,
        })
    }

    pub(crate) fn has_header(&self, name: &str) -> bool {
        self.headers
            .iter()
            .any(|(key, _)| key.eq_ignore_ascii_case(name))
    }
}
