use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::{Client, Response, header::CONTENT_TYPE};
use tokio::time::Instant;
use tracing::debug;
use url::Url;

use crate::args::DEFAULT_USER_AGENT;
use crate::error::HttpError;
use crate::metrics::{FailureKind, RequestResult, STATUS_NO_RESPONSE};

use super::{HttpMethod, RequestSpec};

/// Bytes of the response body kept on the result for the telemetry log.
const BODY_PREVIEW_LIMIT: usize = 4 * 1024;
const JSON_CONTENT_TYPE: &str = "application/json";

/// Issues one request and reports its outcome. Implementations never fail:
/// transport problems come back as a failed [`RequestResult`].
#[async_trait]
pub trait RequestExecutor: Send + Sync {
    async fn execute(&self, spec: &RequestSpec, base_url: &Url) -> RequestResult;
}

/// [`RequestExecutor`] backed by a shared `reqwest` connection pool.
#[derive(Debug, Clone)]
pub struct HttpExecutor {
    client: Client,
}

impl HttpExecutor {
    /// Builds the HTTP client with the per-request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error when the client cannot be constructed.
    pub fn new(request_timeout: Duration) -> Result<Self, HttpError> {
        let client = Client::builder()
            .timeout(request_timeout)
            .user_agent(DEFAULT_USER_AGENT)
            .build()
            .map_err(|err| HttpError::BuildClientFailed { source: err })?;
        Ok(Self { client })
    }

    async fn send(&self, spec: &RequestSpec, url: Url) -> Result<Response, SendError> {
        let mut request_builder = match spec.method {
            HttpMethod::Get => self.client.get(url),
            HttpMethod::Post => self.client.post(url),
        };

        for (key, value) in &spec.headers {
            request_builder = request_builder.header(key.as_str(), value.as_str());
        }

        if spec.method == HttpMethod::Post
            && let Some(payload) = spec.payload.as_ref()
        {
            let body = serde_json::to_vec(payload).map_err(|err| {
                SendError::Prepare(HttpError::SerializePayload { source: err })
            })?;
            if !spec.has_header(CONTENT_TYPE.as_str()) {
                request_builder = request_builder.header(CONTENT_TYPE, JSON_CONTENT_TYPE);
            }
            request_builder = request_builder.body(body);
        }

        request_builder.send().await.map_err(SendError::Transport)
    }
}

enum SendError {
    Prepare(HttpError),
    Transport(reqwest::Error),
}

#[async_trait]
impl RequestExecutor for HttpExecutor {
    async fn execute(&self, spec: &RequestSpec, base_url: &Url) -> RequestResult {
        let timestamp_ms = chrono::Utc::now().timestamp_millis();
        let start = Instant::now();
        let mut result = RequestResult {
            label: spec.label.clone(),
            endpoint: spec.url_template.clone(),
            status_code: STATUS_NO_RESPONSE,
            duration: Duration::ZERO,
            body_bytes: 0,
            body: String::new(),
            timestamp_ms,
            failure: None,
            error: None,
        };

        let url = match spec.resolve_url(base_url) {
            Ok(url) => url,
            Err(err) => {
                result.failure = Some(FailureKind::Transport);
                result.error = Some(err.to_string());
                return result;
            }
        };
        result.endpoint = url.to_string();

        match self.send(spec, url).await {
            Ok(response) => {
                let status = response.status().as_u16();
                match drain_response_body(response).await {
                    Ok((body_bytes, preview)) => {
                        result.status_code = status;
                        result.body_bytes = body_bytes;
                        result.body = String::from_utf8_lossy(&preview).into_owned();
                        if status >= 400 {
                            result.failure = Some(FailureKind::UnexpectedStatus);
                        }
                    }
                    Err(err) => {
                        debug!("Failed to read response body for {}: {}", spec.label, err);
                        result.failure = Some(transport_kind(&err));
                        result.error = Some(err.to_string());
                    }
                }
            }
            Err(SendError::Transport(err)) => {
                debug!("Request {} failed: {}", spec.label, err);
                result.failure = Some(transport_kind(&err));
                result.error = Some(err.to_string());
            }
            Err(SendError::Prepare(err)) => {
                result.failure = Some(FailureKind::Transport);
                result.error = Some(err.to_string());
            }
        }

        result.duration = start.elapsed();
        result
    }
}

fn transport_kind(err: &reqwest::Error) -> FailureKind {
    if err.is_timeout() {
        FailureKind::Timeout
    } else {
        FailureKind::Transport
    }
}

async fn drain_response_body(response: Response) -> Result<(u64, Vec<u8>), reqwest::Error> {
    let mut stream = response.bytes_stream();
    let mut total_bytes: u64 = 0;
    let mut preview = Vec::new();
    while let Some(chunk) = stream.next().await {
        let bytes = chunk?;
        total_bytes = total_bytes.saturating_add(u64::try_from(bytes.len()).unwrap_or(u64::MAX));
        let room = BODY_PREVIEW_LIMIT.saturating_sub(preview.len());
        if let Some(head) = bytes.get(..room.min(bytes.len())) {
            preview.extend_from_slice(head);
        }
    }
    Ok((total_bytes, preview))
}
