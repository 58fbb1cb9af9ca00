use std::time::Duration;

use async_trait::async_trait;
use reqwest::Url;
use serde_json::{Map, Value};

use crate::error::RemoteFetchError;

/// Where the poller gets device status from.
#[async_trait]
pub trait StatusSource: Send + Sync {
    /// Fetch the current status object.
    async fn fetch(&self) -> Result<Map<String, Value>, RemoteFetchError>;

    /// Human-readable endpoint description for logs.
    fn endpoint(&self) -> &str;
}

/// GETs a JSON status object from the sensor's HTTP endpoint.
#[derive(Debug, Clone)]
pub struct HttpStatusSource {
    url: Url,
    client: reqwest::Client,
}

impl HttpStatusSource {
    /// `url` must be an absolute `http` or `https` URL with a host.
    /// `timeout` bounds the whole request, connect through body.
    pub fn new(url: impl AsRef<str>, timeout: Duration) -> Result<Self, RemoteFetchError> {
        let raw = url.as_ref();
        let invalid = |reason: String| RemoteFetchError::InvalidUrl {
            url: raw.to_string(),
            reason,
        };
        let url = Url::parse(raw).map_err(|e| invalid(e.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(invalid(format!("unsupported scheme '{}'", url.scheme())));
        }
        if url.host_str().is_none_or(str::is_empty) {
            return Err(invalid("missing host".to_string()));
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()
            .map_err(RemoteFetchError::Request)?;
        Ok(Self { url, client })
    }
}

#[async_trait]
impl StatusSource for HttpStatusSource {
    async fn fetch(&self) -> Result<Map<String, Value>, RemoteFetchError> {
        let response = self.client.get(self.url.clone()).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(RemoteFetchError::Status(status.as_u16()));
        }

        let body = response.bytes().await?;
        parse_status_body(&body)
    }

    fn endpoint(&self) -> &str {
        self.url.as_str()
    }
}

/// Accept only a JSON object as a status body.
pub fn parse_status_body(body: &[u8]) -> Result<Map<String, Value>, RemoteFetchError> {
    match serde_json::from_slice::<Value>(body).map_err(RemoteFetchError::Body)? {
        Value::Object(map) => Ok(map),
        _ => Err(RemoteFetchError::NotAnObject),
    }
}
