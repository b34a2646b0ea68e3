//! Blocking HTTP client for the dataset backend.

use std::io::Cursor;
use std::time::Duration;

use serde_json::Value;

use super::Backend;
use crate::config::EngineConfig;
use crate::error::{Error, Result};
use crate::geometry::Dims;
use crate::session::{Method, Payload, Request};

/// HTTP client for one backend instance.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl ApiClient {
    /// Create a client for `base_url`, e.g. `http://localhost:8080`.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()?;
        Ok(Self::with_client(client, base_url))
    }

    /// Create a client reusing an existing [`reqwest::blocking::Client`].
    pub fn with_client(client: reqwest::blocking::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    pub fn from_config(config: &EngineConfig) -> Result<Self> {
        Self::new(
            config.server_url.clone(),
            Duration::from_secs(config.preferences.request_timeout_secs),
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL of a request, without its query.
    pub fn url(&self, request: &Request) -> String {
        format!("{}{}", self.base_url, request.path())
    }

    /// Pass the response through on success, or turn it into a transport
    /// error carrying the body text.
    fn ensure_success(
        response: reqwest::blocking::Response,
    ) -> Result<reqwest::blocking::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().unwrap_or_default();
        Err(Error::transport(status.as_u16(), body))
    }
}

impl Backend for ApiClient {
    fn execute(&self, request: &Request) -> Result<Payload> {
        let url = self.url(request);
        let builder = match request.method() {
            Method::Get => self.client.get(&url),
            Method::Post => self.client.post(&url),
        };
        let mut builder = builder.query(&request.query());
        if let Some(body) = request.body() {
            builder = builder.json(&body);
        }

        let response = Self::ensure_success(builder.send()?)?;
        let bytes = response.bytes()?;
        log::debug!("{} answered with {} bytes", url, bytes.len());
        if request.wants_image() {
            Ok(Payload::Image(image_dims(&bytes)?))
        } else {
            json_payload(&bytes)
        }
    }
}

/// Natural size of an encoded image, read from its header.
pub fn image_dims(bytes: &[u8]) -> Result<Dims> {
    let (width, height) = image::ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()?
        .into_dimensions()?;
    Ok(Dims::new(width, height))
}

/// Parse a JSON body. An empty body reads as `null`.
pub fn json_payload(bytes: &[u8]) -> Result<Payload> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Payload::Json(Value::Null));
    }
    Ok(Payload::Json(serde_json::from_slice(bytes)?))
}
