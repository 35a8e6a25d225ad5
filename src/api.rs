//! HTTP client for the SDG portal backend.
//!
//! Every endpoint takes and returns JSON. Requests to `api/admin/*` carry the
//! stored auth token; chatbot requests are anonymous.

use crate::auth::TokenStore;
use crate::config::Config;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

pub const CHAT_SESSION_PATH: &str = "api/chatbot/session/";
pub const CHAT_HISTORY_PATH: &str = "api/chatbot/history/";
pub const CHAT_MESSAGE_PATH: &str = "api/chatbot/chat/";
pub const ACTIVITY_ANALYTICS_PATH: &str = "api/admin/user/activity-analytics/";
pub const LOG_SEARCH_PATH: &str = "api/admin/log/search/";
pub const LOG_PAGE_ACTIVITY_PATH: &str = "api/admin/log/page-activity/";
pub const LOG_FORM_ACTIVITY_PATH: &str = "api/admin/log/form-activity/";
pub const LOG_BROWSER_ACTIVITY_PATH: &str = "api/admin/log/browser-activity/";

/// API client error types.
#[derive(Debug)]
pub enum ApiError {
    /// Configuration error
    Config(String),
    /// Network/HTTP error
    Network(String),
    /// Server returned an error response
    Server { status: u16, message: String },
    /// JSON serialization error
    Serialization(String),
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::Config(msg) => write!(f, "API config error: {msg}"),
            ApiError::Network(msg) => write!(f, "API network error: {msg}"),
            ApiError::Server { status, message } => {
                write!(f, "API server error ({status}): {message}")
            }
            ApiError::Serialization(msg) => write!(f, "API serialization error: {msg}"),
        }
    }
}

impl std::error::Error for ApiError {}

/// Client for the portal backend.
#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    auth_scheme: String,
    client: reqwest::Client,
    tokens: Arc<dyn TokenStore>,
}

impl ApiClient {
    /// Create a new client rooted at `base_url`.
    pub fn new(
        base_url: impl Into<String>,
        tokens: Arc<dyn TokenStore>,
        timeout: Duration,
    ) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::Config(format!("Failed to create HTTP client: {e}")))?;

        let mut base_url = base_url.into();
        if base_url.trim().is_empty() {
            return Err(ApiError::Config("API base URL is empty".to_string()));
        }
        if !base_url.ends_with('/') {
            base_url.push('/');
        }

        Ok(Self {
            base_url,
            auth_scheme: "Bearer".to_string(),
            client,
            tokens,
        })
    }

    /// Create a client from the portal configuration.
    pub fn from_config(config: &Config, tokens: Arc<dyn TokenStore>) -> Result<Self, ApiError> {
        let mut client = Self::new(config.api_base_url.clone(), tokens, config.request_timeout)?;
        client.auth_scheme = config.auth_scheme.clone();
        Ok(client)
    }

    /// Get the full URL of an endpoint path.
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Whether a token is available for authenticated requests.
    pub fn has_token(&self) -> bool {
        self.tokens.token().is_some()
    }

    fn authorize(
        &self,
        request: reqwest::RequestBuilder,
        authenticated: bool,
    ) -> reqwest::RequestBuilder {
        if !authenticated {
            return request;
        }
        match self.tokens.token() {
            Some(token) => request.header("Authorization", format!("{} {token}", self.auth_scheme)),
            None => {
                tracing::debug!("No auth token stored, sending request without Authorization");
                request
            }
        }
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response, ApiError> {
        let response = request
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ApiError::Server {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response)
    }

    /// POST a JSON body and decode the JSON response.
    pub async fn post_json<B, R>(&self, path: &str, body: &B, authenticated: bool) -> Result<R, ApiError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let request = self.authorize(self.client.post(self.url(path)).json(body), authenticated);
        let response = self.send(request).await?;

        response
            .json()
            .await
            .map_err(|e| ApiError::Serialization(e.to_string()))
    }

    /// POST a JSON body and only check the response status.
    pub async fn post_and_discard<B>(&self, path: &str, body: &B, authenticated: bool) -> Result<(), ApiError>
    where
        B: Serialize + ?Sized,
    {
        let request = self.authorize(self.client.post(self.url(path)).json(body), authenticated);
        self.send(request).await?;
        Ok(())
    }

    /// GET with query parameters and decode the JSON response.
    pub async fn get_json<R>(
        &self,
        path: &str,
        query: &[(&str, &str)],
        authenticated: bool,
    ) -> Result<R, ApiError>
    where
        R: DeserializeOwned,
    {
        let request = self.authorize(self.client.get(self.url(path)).query(query), authenticated);
        let response = self.send(request).await?;

        response
            .json()
            .await
            .map_err(|e| ApiError::Serialization(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::MemoryTokenStore;

    fn client(base: &str) -> ApiClient {
        ApiClient::new(base, Arc::new(MemoryTokenStore::default()), Duration::from_secs(1)).unwrap()
    }

    #[test]
    fn test_url_joining() {
        let api = client("http://127.0.0.1:8000");
        assert_eq!(
            api.url(CHAT_SESSION_PATH),
            "http://127.0.0.1:8000/api/chatbot/session/"
        );
        assert_eq!(api.url("/api/chatbot/chat/"), "http://127.0.0.1:8000/api/chatbot/chat/");

        let api = client("https://sdg.example.org/portal/");
        assert_eq!(
            api.url(LOG_SEARCH_PATH),
            "https://sdg.example.org/portal/api/admin/log/search/"
        );
    }

    #[test]
    fn test_empty_base_url_rejected() {
        let result = ApiClient::new("  ", Arc::new(MemoryTokenStore::default()), Duration::from_secs(1));
        assert!(matches!(result, Err(ApiError::Config(_))));
    }

    #[test]
    fn test_has_token_follows_store() {
        let tokens = Arc::new(MemoryTokenStore::default());
        let api = ApiClient::new("http://localhost", tokens.clone(), Duration::from_secs(1)).unwrap();
        assert!(!api.has_token());
        tokens.set(Some("secret".to_string()));
        assert!(api.has_token());
    }

    #[test]
    fn test_api_error_display() {
        let err = ApiError::Server {
            status: 401,
            message: "unauthorized".to_string(),
        };
        assert_eq!(err.to_string(), "API server error (401): unauthorized");
    }
}
