// User administration client

use std::sync::Arc;

use super::{into_json, present_pairs};
use crate::error::ApiError;
use crate::gateway::AuthGateway;
use crate::models::{
    CreateUser, MessageResponse, ResetPasswordResponse, UpdateUser, User, UserFilter,
    UserListResponse,
};

pub struct AdminClient {
    gateway: Arc<AuthGateway>,
}

impl AdminClient {
    pub fn new(gateway: Arc<AuthGateway>) -> Self {
        Self { gateway }
    }

    /// Filtered, paginated user listing.
    pub async fn list_users(&self, filter: &UserFilter) -> Result<UserListResponse, ApiError> {
        let query = present_pairs(vec![
            ("email", filter.email.clone()),
            ("username", filter.username.clone()),
            ("role", filter.role.map(|r| r.as_str().to_string())),
            ("is_active", filter.is_active.map(|v| v.to_string())),
            ("page", filter.page.map(|v| v.to_string())),
            ("page_size", filter.page_size.map(|v| v.to_string())),
        ]);

        let response = self
            .gateway
            .send(self.gateway.get("/api/users").query(&query))
            .await?;
        into_json(response).await
    }

    pub async fn get_user(&self, user_id: i64) -> Result<User, ApiError> {
        let response = self
            .gateway
            .send(self.gateway.get(&format!("/api/users/{user_id}")))
            .await?;
        into_json(response).await
    }

    pub async fn create_user(&self, data: &CreateUser) -> Result<User, ApiError> {
        let response = self
            .gateway
            .send(self.gateway.post("/api/users").json(data))
            .await?;
        into_json(response).await
    }

    pub async fn update_user(&self, user_id: i64, data: &UpdateUser) -> Result<User, ApiError> {
        let response = self
            .gateway
            .send(self.gateway.put(&format!("/api/users/{user_id}")).json(data))
            .await?;
        into_json(response).await
    }

    /// Lock an account for `duration_hours`.
    pub async fn lock_user(
        &self,
        user_id: i64,
        duration_hours: u32,
    ) -> Result<MessageResponse, ApiError> {
        let response = self
            .gateway
            .send(
                self.gateway
                    .post(&format!("/api/users/{user_id}/lock"))
                    .json(&serde_json::json!({ "duration_hours": duration_hours })),
            )
            .await?;
        into_json(response).await
    }

    pub async fn unlock_user(&self, user_id: i64) -> Result<MessageResponse, ApiError> {
        let response = self
            .gateway
            .send(self.gateway.post(&format!("/api/users/{user_id}/unlock")))
            .await?;
        into_json(response).await
    }

    /// Force-reset a user's password; the backend returns the temporary
    /// password to hand over out of band.
    pub async fn reset_password(&self, user_id: i64) -> Result<ResetPasswordResponse, ApiError> {
        let response = self
            .gateway
            .send(
                self.gateway
                    .post(&format!("/api/users/{user_id}/reset-password")),
            )
            .await?;
        into_json(response).await
    }
}
