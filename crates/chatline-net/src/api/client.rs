//! HTTP plumbing shared by every endpoint.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use url::Url;

use crate::config::EndpointConfig;
use crate::error::{NetworkError, Result};

const TARGET: &str = "chatline_net::api";

/// Builder for creating an [`ApiClient`].
pub struct ApiClientBuilder {
    base_url: String,
    http_client: Option<reqwest::Client>,
    bearer_token: Option<String>,
    timeout: Option<Duration>,
    user_agent: Option<String>,
}

impl ApiClientBuilder {
    /// Create a new builder with the specified base URL.
    ///
    /// All request paths are appended to this base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            http_client: None,
            bearer_token: None,
            timeout: Some(Duration::from_secs(30)),
            user_agent: None,
        }
    }

    /// Use an existing `reqwest` client. Timeout and user agent settings are
    /// then ignored.
    pub fn http_client(mut self, client: reqwest::Client) -> Self {
        self.http_client = Some(client);
        self
    }

    /// Send `Authorization: Bearer <token>` with every request.
    pub fn bearer_auth(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    /// Set the per-request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Disable the per-request timeout.
    pub fn no_timeout(mut self) -> Self {
        self.timeout = None;
        self
    }

    /// Set the User-Agent header.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Build the client.
    pub fn build(self) -> Result<ApiClient> {
        // Normalize base URL (remove trailing slash)
        let base = self.base_url.trim().trim_end_matches('/');
        let base_url = Url::parse(base)?;
        if !matches!(base_url.scheme(), "http" | "https") || base_url.cannot_be_a_base() {
            return Err(NetworkError::InvalidUrl(format!(
                "'{base}' is not an HTTP base URL"
            )));
        }

        let http = match self.http_client {
            Some(client) => client,
            None => {
                let mut builder = reqwest::Client::builder();
                if let Some(timeout) = self.timeout {
                    builder = builder.timeout(timeout);
                }
                if let Some(ref ua) = self.user_agent {
                    builder = builder.user_agent(ua);
                }
                builder.build()?
            }
        };

        Ok(ApiClient {
            inner: Arc::new(ApiClientInner {
                http,
                base_url,
                bearer_token: self.bearer_token,
            }),
        })
    }
}

struct ApiClientInner {
    http: reqwest::Client,
    base_url: Url,
    bearer_token: Option<String>,
}

/// Client for the chat server's REST API.
///
/// Cheap to clone; clones share the connection pool.
///
/// # Example
///
/// ```ignore
/// use chatline_net::api::ApiClient;
/// use chatline_net::{NewMessage, PageRequest};
///
/// let client = ApiClient::builder("http://localhost:8000")
///     .bearer_auth("token")
///     .build()?;
///
/// let sent = client.send_message(42, &NewMessage::new(7, "hello")).await?;
/// let page = client.list_messages(42, PageRequest::default()).await?;
/// ```
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

impl ApiClient {
    /// Create a new builder for configuring a client.
    pub fn builder(base_url: impl Into<String>) -> ApiClientBuilder {
        ApiClientBuilder::new(base_url)
    }

    /// Create a client with default settings.
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        Self::builder(base_url).build()
    }

    /// Create a client for the API base of an [`EndpointConfig`].
    pub fn from_endpoint(endpoint: &EndpointConfig) -> Result<Self> {
        Self::new(endpoint.api_base.clone())
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &str {
        self.inner.base_url.as_str().trim_end_matches('/')
    }

    /// Resolve path segments against the base URL. Segments are
    /// percent-encoded; an empty last segment yields a trailing slash.
    pub(crate) fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.inner.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| NetworkError::InvalidUrl(self.inner.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let builder = self.inner.http.request(method, url);
        match &self.inner.bearer_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn execute(&self, method: Method, url: Url, builder: RequestBuilder) -> Result<Response> {
        tracing::debug!(target: TARGET, %method, %url, "sending request");
        let response = builder.send().await.inspect_err(|e| {
            tracing::warn!(target: TARGET, %method, %url, error = %e, "request failed");
        })?;
        tracing::debug!(target: TARGET, %method, %url, status = response.status().as_u16(), "response received");
        Ok(response)
    }

    /// GET a JSON resource.
    pub(crate) async fn get_json<T, Q>(&self, segments: &[&str], query: &Q) -> Result<T>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        let url = self.endpoint(segments)?;
        let builder = self.request(Method::GET, url.clone()).query(query);
        let response = self.execute(Method::GET, url, builder).await?;
        Ok(error_for_status(response).await?.json().await?)
    }

    /// GET a JSON resource, mapping 404 to `None`.
    pub(crate) async fn get_optional<T>(&self, segments: &[&str]) -> Result<Option<T>>
    where
        T: DeserializeOwned,
    {
        let url = self.endpoint(segments)?;
        let builder = self.request(Method::GET, url.clone());
        let response = self.execute(Method::GET, url, builder).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        Ok(Some(error_for_status(response).await?.json().await?))
    }

    /// POST a JSON body and decode the JSON reply.
    pub(crate) async fn post_json<B, T>(&self, segments: &[&str], body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.endpoint(segments)?;
        let builder = self.request(Method::POST, url.clone()).json(body);
        let response = self.execute(Method::POST, url, builder).await?;
        Ok(error_for_status(response).await?.json().await?)
    }

    /// DELETE a resource. Returns `false` on 404.
    pub(crate) async fn delete<Q>(&self, segments: &[&str], query: &Q) -> Result<bool>
    where
        Q: Serialize + ?Sized,
    {
        let url = self.endpoint(segments)?;
        let builder = self.request(Method::DELETE, url.clone()).query(query);
        let response = self.execute(Method::DELETE, url, builder).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(false);
        }
        error_for_status(response).await?;
        Ok(true)
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url())
            .field("has_auth", &self.inner.bearer_token.is_some())
            .finish()
    }
}

/// Turn a non-2xx response into [`NetworkError::HttpStatus`], consuming the
/// body for the message.
async fn error_for_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let message = error_detail(&body);
    tracing::debug!(target: TARGET, status = status.as_u16(), ?message, "error response");
    Err(NetworkError::HttpStatus {
        status: status.as_u16(),
        message,
    })
}

/// Error bodies look like `{"detail": ...}`; anything else is passed through.
fn error_detail(body: &str) -> Option<String> {
    let body = body.trim();
    if body.is_empty() {
        return None;
    }
    match serde_json::from_str::<serde_json::Value>(body) {
        Ok(serde_json::Value::Object(map)) => match map.get("detail") {
            Some(serde_json::Value::String(detail)) => Some(detail.clone()),
            Some(detail) => Some(detail.to_string()),
            None => Some(body.to_string()),
        },
        _ => Some(body.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_normalization() {
        let client = ApiClient::new("http://localhost:8000/").unwrap();
        assert_eq!(client.base_url(), "http://localhost:8000");

        let client = ApiClient::new("https://example.com/api/").unwrap();
        assert_eq!(client.base_url(), "https://example.com/api");
    }

    #[test]
    fn test_rejects_non_http_base() {
        assert!(matches!(
            ApiClient::new("ws://localhost:8000"),
            Err(NetworkError::InvalidUrl(_))
        ));
        assert!(matches!(
            ApiClient::new("not a url"),
            Err(NetworkError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_endpoint_joining() {
        let client = ApiClient::new("https://example.com/api").unwrap();
        assert_eq!(
            client.endpoint(&["chats", "42", "messages"]).unwrap().as_str(),
            "https://example.com/api/chats/42/messages"
        );
        assert_eq!(
            client.endpoint(&["bookings", ""]).unwrap().as_str(),
            "https://example.com/api/bookings/"
        );
        assert_eq!(
            client.endpoint(&["users", "by-handle", "a b/c"]).unwrap().as_str(),
            "https://example.com/api/users/by-handle/a%20b%2Fc"
        );
    }

    #[test]
    fn test_error_detail() {
        assert_eq!(
            error_detail(r#"{"detail":"reaction not found"}"#).as_deref(),
            Some("reaction not found")
        );
        assert_eq!(
            error_detail(r#"{"detail":[{"loc":["body"]}]}"#).as_deref(),
            Some(r#"[{"loc":["body"]}]"#)
        );
        assert_eq!(error_detail("  ").as_deref(), None);
        assert_eq!(error_detail("Bad gateway").as_deref(), Some("Bad gateway"));
    }
}
