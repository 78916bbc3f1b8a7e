//! Platform REST client implementation.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::{ErrorBody, PlatformError};

/// Query parameters for a call, excluding the account identifier.
pub type Query = Vec<(&'static str, String)>;

/// Connection settings for a [`PlatformClient`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the platform instance, without a trailing slash.
    pub base_url: String,
    /// API token sent in the `x-api-key` header.
    pub api_token: String,
    /// Account identifier attached to every call.
    pub account_id: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

impl ClientConfig {
    /// Create a config with the default timeouts.
    pub fn new(
        base_url: impl Into<String>,
        api_token: impl Into<String>,
        account_id: impl Into<String>,
    ) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_token: api_token.into(),
            account_id: account_id.into(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// Client for the platform's project-scoped REST APIs.
///
/// Every call is a single round-trip; there is no retry at this layer.
pub struct PlatformClient {
    http: Client,
    config: ClientConfig,
    api_calls: AtomicU64,
}

impl PlatformClient {
    /// Create a new client from the given config.
    pub fn new(config: ClientConfig) -> Result<Self, PlatformError> {
        let http = Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            http,
            config,
            api_calls: AtomicU64::new(0),
        })
    }

    /// Number of remote calls issued so far.
    pub fn api_calls(&self) -> u64 {
        self.api_calls.load(Ordering::Relaxed)
    }

    /// Issue a GET and parse the JSON response.
    pub async fn get(&self, path: &str, query: &[(&'static str, String)]) -> Result<Value, PlatformError> {
        let request = self.request(Method::GET, path, query);
        self.send(request, path).await
    }

    /// Issue a POST with a JSON body.
    pub async fn post_json<B: Serialize + ?Sized>(
        &self,
        path: &str,
        query: &[(&'static str, String)],
        body: &B,
    ) -> Result<Value, PlatformError> {
        let request = self.request(Method::POST, path, query).json(body);
        self.send(request, path).await
    }

    /// Issue a POST with a raw YAML body.
    pub async fn post_yaml(
        &self,
        path: &str,
        query: &[(&'static str, String)],
        body: String,
    ) -> Result<Value, PlatformError> {
        let request = self
            .request(Method::POST, path, query)
            .header("Content-Type", "application/yaml")
            .body(body);
        self.send(request, path).await
    }

    /// Issue a DELETE.
    pub async fn delete(&self, path: &str, query: &[(&'static str, String)]) -> Result<Value, PlatformError> {
        let request = self.request(Method::DELETE, path, query);
        self.send(request, path).await
    }

    fn request(&self, method: Method, path: &str, query: &[(&'static str, String)]) -> RequestBuilder {
        let url = format!("{}{}", self.config.base_url, path);

        let mut params: Vec<(&str, &str)> = Vec::with_capacity(query.len() + 1);
        params.push(("accountIdentifier", self.config.account_id.as_str()));
        params.extend(query.iter().map(|(k, v)| (*k, v.as_str())));

        self.http
            .request(method, url)
            .header("x-api-key", &self.config.api_token)
            .query(&params)
    }

    async fn send(&self, request: RequestBuilder, path: &str) -> Result<Value, PlatformError> {
        self.api_calls.fetch_add(1, Ordering::Relaxed);
        let response = request.send().await?;
        debug!(path = %path, status = %response.status(), "platform call");
        Self::handle_response(response).await
    }

    /// Handle HTTP response and parse JSON.
    ///
    /// An empty success body is returned as `Value::Null`.
    async fn handle_response(response: reqwest::Response) -> Result<Value, PlatformError> {
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            let body = serde_json::from_str::<ErrorBody>(&text)
                .unwrap_or_else(|_| ErrorBody::from_text(&text));
            return Err(PlatformError::Api {
                status: status.as_u16(),
                body,
            });
        }

        if text.trim().is_empty() {
            return Ok(Value::Null);
        }

        Ok(serde_json::from_str(&text)?)
    }
}
