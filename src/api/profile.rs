// Own-profile client

use std::sync::Arc;

use reqwest::multipart::{Form, Part};

use super::into_json;
use crate::error::ApiError;
use crate::gateway::AuthGateway;
use crate::models::{AvatarResponse, MessageResponse, ProfileUpdate, User};

pub struct ProfileClient {
    gateway: Arc<AuthGateway>,
}

impl ProfileClient {
    pub fn new(gateway: Arc<AuthGateway>) -> Self {
        Self { gateway }
    }

    /// Current user, `GET /api/auth/me`.
    pub async fn me(&self) -> Result<User, ApiError> {
        let response = self.gateway.send(self.gateway.get("/api/auth/me")).await?;
        into_json(response).await
    }

    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<User, ApiError> {
        let response = self
            .gateway
            .send(self.gateway.put("/api/auth/me").json(update))
            .await?;
        into_json(response).await
    }

    pub async fn change_password(
        &self,
        old_password: &str,
        new_password: &str,
    ) -> Result<MessageResponse, ApiError> {
        let response = self
            .gateway
            .send(
                self.gateway
                    .post("/api/auth/me/change-password")
                    .json(&serde_json::json!({
                        "old_password": old_password,
                        "new_password": new_password,
                    })),
            )
            .await?;
        into_json(response).await
    }

    pub async fn upload_avatar(
        &self,
        file_name: &str,
        data: Vec<u8>,
    ) -> Result<AvatarResponse, ApiError> {
        let response = self
            .gateway
            .send_with(|| {
                let form = Form::new()
                    .part("file", Part::bytes(data.clone()).file_name(file_name.to_string()));
                self.gateway.post("/api/auth/me/avatar").multipart(form)
            })
            .await?;
        into_json(response).await
    }
}
