use thiserror::Error;

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("Failed to build HTTP client: {source}")]
    BuildClientFailed {
        #[source]
        source: reqwest::Error,
    },
    #[error("Invalid URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("Failed to join URL '{url}': {source}")]
    JoinUrlFailed {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("URL scheme '{scheme}' is not http or https.")]
    UnsupportedScheme { scheme: String },
    #[error("Failed to serialize payload: {source}")]
    SerializePayload {
        #[source]
        source: serde_json::Error,
    },
}
