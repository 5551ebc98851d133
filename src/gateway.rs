// Authenticated request gateway
//
// Wraps outgoing requests with bearer-token injection and recovers from
// exactly one class of failure: a 401 caused by an expired access token.
// Callers never see tokens; they get back a plain HTTP response.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::header::{HeaderValue, AUTHORIZATION};
use reqwest::{Client, Method, Request, RequestBuilder, Response, StatusCode};

use crate::auth::coordinator::TokenRefreshCoordinator;
use crate::auth::refresh;
use crate::auth::store::CredentialStore;
use crate::auth::types::{ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY};
use crate::error::GatewayError;

/// Invoked exactly once per terminal refresh failure, telling the session
/// owner that the stored session is no longer valid.
pub type SessionNotifier = Arc<dyn Fn() + Send + Sync>;

pub struct AuthGateway {
    /// Shared HTTP client with connection pooling.
    client: Client,

    /// Backend origin, e.g. `http://localhost:8000`.
    base_url: String,

    /// Token storage, read before every request.
    store: Arc<dyn CredentialStore>,

    /// Single-flight refresh coordination.
    coordinator: TokenRefreshCoordinator,

    /// Session owner's logout notification.
    on_session_expired: SessionNotifier,
}

impl AuthGateway {
    /// Create a gateway against `base_url`.
    ///
    /// The session notifier is a required dependency: there is no later
    /// registration step a caller could forget before the first 401.
    pub fn new(
        base_url: impl Into<String>,
        connect_timeout: u64,
        request_timeout: u64,
        store: Arc<dyn CredentialStore>,
        on_session_expired: SessionNotifier,
    ) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(connect_timeout))
            .timeout(Duration::from_secs(request_timeout))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            store,
            coordinator: TokenRefreshCoordinator::new(),
            on_session_expired,
        })
    }

    /// Absolute URL for an API path.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub fn store(&self) -> &dyn CredentialStore {
        self.store.as_ref()
    }

    /// Underlying client, for requests that must bypass authentication
    /// (login, password reset).
    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn get(&self, path: &str) -> RequestBuilder {
        self.client.request(Method::GET, self.endpoint(path))
    }

    pub fn post(&self, path: &str) -> RequestBuilder {
        self.client.request(Method::POST, self.endpoint(path))
    }

    pub fn put(&self, path: &str) -> RequestBuilder {
        self.client.request(Method::PUT, self.endpoint(path))
    }

    pub fn patch(&self, path: &str) -> RequestBuilder {
        self.client.request(Method::PATCH, self.endpoint(path))
    }

    pub fn delete(&self, path: &str) -> RequestBuilder {
        self.client.request(Method::DELETE, self.endpoint(path))
    }

    /// Build and execute a request through the gateway.
    pub async fn send(&self, builder: RequestBuilder) -> Result<Response, GatewayError> {
        let request = builder.build()?;
        self.execute(request).await
    }

    /// Execute a request the gateway can rebuild from scratch.
    ///
    /// Multipart bodies cannot be cloned, so `send` has no request left to
    /// replay after a 401. Callers with such bodies pass a builder-producing
    /// closure instead; it is invoked once for the initial attempt and once
    /// more if a refreshed token warrants the retry.
    pub async fn send_with<F>(&self, build: F) -> Result<Response, GatewayError>
    where
        F: Fn() -> RequestBuilder,
    {
        let response = self.send_once(build().build()?).await?;

        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }
        if self.store.get(REFRESH_TOKEN_KEY).is_none() {
            return Ok(response);
        }

        self.refresh_and_retry(build().build()?).await
    }

    /// Execute a request with bearer injection and single-retry refresh.
    ///
    /// The gateway only ever touches the `Authorization` header; content
    /// types stay whatever the request builder set, so JSON and multipart
    /// bodies pass through untouched.
    pub async fn execute(&self, request: Request) -> Result<Response, GatewayError> {
        // Clone up front: a streaming body cannot be replayed later.
        let retry_request = request.try_clone();

        let response = self.send_once(request).await?;

        // Common path: anything but an auth failure goes straight back.
        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }
        if self.store.get(REFRESH_TOKEN_KEY).is_none() {
            return Ok(response);
        }
        let Some(retry) = retry_request else {
            // The first attempt consumed the body. Refresh anyway so the
            // stored session works again, then hand the 401 back; requests
            // that can be rebuilt go through `send_with` instead.
            tracing::warn!("401 on a non-replayable request body, refreshing without retry");
            let _ = self.refresh_access_token().await;
            return Ok(response);
        };

        self.refresh_and_retry(retry).await
    }

    /// Inject the stored bearer token and dispatch.
    async fn send_once(&self, mut request: Request) -> Result<Response, GatewayError> {
        if let Some(token) = self.store.get(ACCESS_TOKEN_KEY) {
            if let Some(value) = bearer_header(&token) {
                request.headers_mut().insert(AUTHORIZATION, value);
            }
        }

        tracing::debug!(method = %request.method(), url = %request.url(), "sending request");
        self.client
            .execute(request)
            .await
            .map_err(|e| GatewayError::Network(e.to_string()))
    }

    /// Refresh the session, then replay `retry` under the new token.
    async fn refresh_and_retry(&self, mut retry: Request) -> Result<Response, GatewayError> {
        let token = self.refresh_access_token().await?;
        let value = bearer_header(&token).ok_or_else(|| {
            GatewayError::InvalidRequest("refreshed token is not a valid header value".to_string())
        })?;
        retry.headers_mut().insert(AUTHORIZATION, value);

        tracing::debug!(url = %retry.url(), "retrying request with refreshed token");
        // At most one retry: a second 401 is the caller's to handle.
        self.client
            .execute(retry)
            .await
            .map_err(|e| GatewayError::Network(e.to_string()))
    }

    /// Obtain a fresh access token, sharing one refresh call across every
    /// request that hit a 401 in this window.
    async fn refresh_access_token(&self) -> Result<String, GatewayError> {
        self.coordinator
            .run_exclusive(|| async move {
                let url = self.endpoint("/api/auth/refresh");
                let outcome =
                    refresh::refresh_tokens(&self.client, &url, self.store.as_ref()).await;

                match &outcome {
                    Ok(_) => {}
                    Err(GatewayError::NoRefreshToken)
                    | Err(GatewayError::RefreshRejected { .. }) => {
                        // The session is definitely over.
                        self.store.clear_pair();
                        tracing::warn!("refresh token rejected, ending session");
                        (self.on_session_expired)();
                    }
                    Err(_) => {
                        // Transient failure: can't tell whether the session
                        // is still valid, so keep the tokens.
                    }
                }

                outcome
            })
            .await
    }
}

fn bearer_header(token: &str) -> Option<HeaderValue> {
    HeaderValue::from_str(&format!("Bearer {token}")).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::store::MemoryStore;

    fn noop_notifier() -> SessionNotifier {
        Arc::new(|| {})
    }

    #[test]
    fn test_endpoint_joins_base_url() {
        let gateway = AuthGateway::new(
            "http://localhost:8000/",
            5,
            30,
            Arc::new(MemoryStore::new()),
            noop_notifier(),
        )
        .unwrap();

        assert_eq!(
            gateway.endpoint("/api/exams"),
            "http://localhost:8000/api/exams"
        );
    }

    #[test]
    fn test_bearer_header_value() {
        let value = bearer_header("T1").unwrap();
        assert_eq!(value.to_str().unwrap(), "Bearer T1");

        // Control characters cannot form a header value.
        assert!(bearer_header("bad\ntoken").is_none());
    }
}
