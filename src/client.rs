//! HTTP client wrapper for control-plane requests.

use std::time::Duration;

use reqwest::{Client, Response};

use crate::error::InspectError;

/// Default timeout for control-plane requests.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default IAM base URL. Hosts both the token and the account settings endpoints.
pub const DEFAULT_IAM_URL: &str = "https://iam.cloud.ibm.com";

/// Default cap on response bodies.
pub const DEFAULT_MAX_BODY_SIZE: usize = 1024 * 1024;

const USER_AGENT: &str = concat!("ibmcloud-inspect/", env!("CARGO_PKG_VERSION"));

/// Settings for the HTTP side of an inspector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InspectorConfig {
    /// IAM base URL, without trailing slash.
    pub iam_url: String,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Maximum accepted response body in bytes.
    pub max_body_size: usize,
}

impl InspectorConfig {
    /// Default configuration pointed at a different IAM host (for testing).
    pub fn with_iam_url(iam_url: &str) -> Self {
        Self {
            iam_url: iam_url.trim_end_matches('/').to_string(),
            ..Self::default()
        }
    }

    /// Override the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Override the response body limit.
    pub fn max_body_size(mut self, max_body_size: usize) -> Self {
        self.max_body_size = max_body_size;
        self
    }
}

impl Default for InspectorConfig {
    fn default() -> Self {
        Self {
            iam_url: DEFAULT_IAM_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            max_body_size: DEFAULT_MAX_BODY_SIZE,
        }
    }
}

/// HTTP client wrapper for IAM and control-plane requests.
#[derive(Debug, Clone)]
pub struct ApiClient {
    inner: Client,
    base_url: String,
    max_body_size: usize,
}

impl ApiClient {
    /// Create a new client from the given configuration.
    pub fn new(config: &InspectorConfig) -> Result<Self, reqwest::Error> {
        let inner = Client::builder()
            .timeout(config.timeout)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self {
            inner,
            base_url: config.iam_url.trim_end_matches('/').to_string(),
            max_body_size: config.max_body_size,
        })
    }

    /// Get the underlying reqwest client.
    pub fn inner(&self) -> &Client {
        &self.inner
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Resolve a request target: absolute URLs pass through, paths join the base URL.
    pub fn url(&self, target: &str) -> String {
        if target.starts_with("http://") || target.starts_with("https://") {
            return target.to_string();
        }
        if target.starts_with('/') {
            format!("{}{}", self.base_url, target)
        } else {
            format!("{}/{}", self.base_url, target)
        }
    }

    /// Read a response body as text, honoring the configured size limit.
    pub async fn read_text(&self, response: Response) -> Result<String, InspectError> {
        let body = read_body_limited(response, self.max_body_size).await?;
        Ok(String::from_utf8_lossy(&body).into_owned())
    }
}

/// Read response body with a size limit.
///
/// 1. Check the `Content-Length` header and fail early if it exceeds the limit
/// 2. Read the body chunk by chunk, aborting as soon as the limit is exceeded
pub async fn read_body_limited(
    response: Response,
    max_size: usize,
) -> Result<Vec<u8>, InspectError> {
    if let Some(content_length) = response.content_length() {
        if content_length as usize > max_size {
            return Err(InspectError::TooLarge(content_length as usize, max_size));
        }
    }

    // Capacity is capped even if Content-Length is missing or wrong.
    let capacity = response
        .content_length()
        .map(|cl| (cl as usize).min(max_size))
        .unwrap_or(max_size.min(8192));
    let mut body = Vec::with_capacity(capacity);
    let mut total_read = 0usize;

    let mut stream = response;
    while let Some(chunk) = stream.chunk().await? {
        if total_read.saturating_add(chunk.len()) > max_size {
            return Err(InspectError::TooLarge(
                total_read.saturating_add(chunk.len()),
                max_size,
            ));
        }
        total_read += chunk.len();
        body.extend_from_slice(&chunk);
    }

    Ok(body)
}
