// Session operations: login, registration, password reset.
//
// These endpoints run before a session exists, so they bypass the
// gateway's bearer injection and talk to the backend directly. Login
// writes the issued pair into the Credential Store; everything after
// that flows through the gateway.

use std::sync::Arc;

use crate::api::{into_json, into_unit};
use crate::auth::types::{
    LoginRequest, LoginResponse, RegisterRequest, ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY,
};
use crate::error::ApiError;
use crate::gateway::AuthGateway;
use crate::models::MessageResponse;

pub struct SessionClient {
    gateway: Arc<AuthGateway>,
}

impl SessionClient {
    pub fn new(gateway: Arc<AuthGateway>) -> Self {
        Self { gateway }
    }

    /// Authenticate and store the issued tokens.
    pub async fn login(&self, email: &str, password: &str) -> Result<(), ApiError> {
        let response = self
            .gateway
            .client()
            .post(self.gateway.endpoint("/api/auth/login"))
            .json(&LoginRequest {
                email: email.to_string(),
                password: password.to_string(),
            })
            .send()
            .await
            .map_err(crate::error::GatewayError::from)?;

        let issued: LoginResponse = into_json(response).await?;

        let store = self.gateway.store();
        store.set(ACCESS_TOKEN_KEY, &issued.access_token);
        if let Some(refresh_token) = &issued.refresh_token {
            store.set(REFRESH_TOKEN_KEY, refresh_token);
        }

        tracing::info!(email, "logged in");
        Ok(())
    }

    /// Create an account, then log straight into it.
    pub async fn register(
        &self,
        email: &str,
        username: &str,
        password: &str,
    ) -> Result<(), ApiError> {
        let response = self
            .gateway
            .client()
            .post(self.gateway.endpoint("/api/auth/register"))
            .json(&RegisterRequest {
                email: email.to_string(),
                username: username.to_string(),
                password: password.to_string(),
            })
            .send()
            .await
            .map_err(crate::error::GatewayError::from)?;

        into_unit(response).await?;
        self.login(email, password).await
    }

    /// Drop the stored session. Purely local; the backend keeps no
    /// server-side session to invalidate.
    pub fn logout(&self) {
        self.gateway.store().clear_pair();
        tracing::info!("logged out");
    }

    /// Ask the backend to email a password-reset link.
    pub async fn request_password_reset(&self, email: &str) -> Result<MessageResponse, ApiError> {
        let response = self
            .gateway
            .client()
            .post(self.gateway.endpoint("/api/auth/request-password-reset"))
            .json(&serde_json::json!({ "email": email }))
            .send()
            .await
            .map_err(crate::error::GatewayError::from)?;

        into_json(response).await
    }

    /// Complete a password reset with the emailed token.
    pub async fn reset_password(
        &self,
        token: &str,
        new_password: &str,
    ) -> Result<MessageResponse, ApiError> {
        let response = self
            .gateway
            .client()
            .post(self.gateway.endpoint("/api/auth/reset-password"))
            .query(&[("token", token), ("new_password", new_password)])
            .send()
            .await
            .map_err(crate::error::GatewayError::from)?;

        into_json(response).await
    }
}
