//! Authenticated control-plane queries.

use reqwest::header::ACCEPT;
use reqwest::{Method, StatusCode};
use serde_json::Value;

use crate::client::ApiClient;
use crate::credential::AccessToken;
use crate::error::InspectError;

/// Description of a read-only control-plane request.
///
/// `Authorization` and `Accept` headers are added when the query is executed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    method: Method,
    target: String,
    params: Vec<(String, String)>,
}

impl Query {
    /// A GET request for a path (relative to the IAM base URL) or an absolute URL.
    pub fn get(target: impl Into<String>) -> Self {
        Self::new(Method::GET, target)
    }

    /// A request with an arbitrary method.
    pub fn new(method: Method, target: impl Into<String>) -> Self {
        Self {
            method,
            target: target.into(),
            params: Vec::new(),
        }
    }

    /// Append a query string parameter.
    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((key.into(), value.into()));
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }
}

/// Execute a query with a bearer token and return the parsed JSON body.
///
/// # Errors
///
/// Returns `InspectError::Query` on any non-200 status. Nothing is retried.
pub async fn execute(
    client: &ApiClient,
    token: &AccessToken,
    query: &Query,
) -> Result<Value, InspectError> {
    let url = client.url(&query.target);
    tracing::debug!(method = %query.method, %url, "sending query");

    let response = client
        .inner()
        .request(query.method.clone(), &url)
        .bearer_auth(token.secret())
        .header(ACCEPT, "application/json")
        .query(&query.params)
        .send()
        .await?;

    let status = response.status();
    let body = client.read_text(response).await?;

    if status != StatusCode::OK {
        tracing::warn!(status = status.as_u16(), %url, "query rejected");
        return Err(InspectError::query(status.as_u16(), &body));
    }

    Ok(serde_json::from_str(&body)?)
}
