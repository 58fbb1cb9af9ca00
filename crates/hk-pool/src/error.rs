/// A failed status fetch. Only ever logged by the poller, never surfaced to clients.
#[derive(thiserror::Error, Debug)]
pub enum RemoteFetchError {
    #[error("invalid status URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("status request failed: {0}")]
    Request(#[source] reqwest::Error),

    #[error("status request timed out")]
    Timeout,

    #[error("device answered with HTTP {0}")]
    Status(u16),

    #[error("status body is not valid JSON: {0}")]
    Body(#[source] serde_json::Error),

    #[error("status body is not a JSON object")]
    NotAnObject,
}

impl From<reqwest::Error> for RemoteFetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::Request(err)
        }
    }
}
