// Authentication wire types

use serde::{Deserialize, Serialize};

/// Credential Store key holding the access token.
pub const ACCESS_TOKEN_KEY: &str = "token";

/// Credential Store key holding the refresh token.
pub const REFRESH_TOKEN_KEY: &str = "refresh_token";

/// Access/refresh token pair as issued by login and refresh.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Body of `POST /api/auth/refresh`.
#[derive(Debug, Serialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Body of `POST /api/auth/login`.
#[derive(Debug, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Login response. The backend may omit the refresh token for
/// short-lived sessions.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub refresh_token: Option<String>,
}

/// Body of `POST /api/auth/register`.
#[derive(Debug, Serialize)]
pub struct RegisterRequest {
    pub email: String,
    pub username: String,
    pub password: String,
}
