// Token refresh sub-operation

use reqwest::Client;

use super::store::CredentialStore;
use super::types::{RefreshRequest, TokenPair, REFRESH_TOKEN_KEY};
use crate::error::GatewayError;

/// Exchange the stored refresh token for a new token pair.
///
/// On success both tokens are written to the store before the new access
/// token is returned, so no caller released afterwards can observe a mix
/// of old and new credentials. Failures leave the store untouched; the
/// gateway decides whether the session ends.
pub async fn refresh_tokens(
    client: &Client,
    refresh_url: &str,
    store: &dyn CredentialStore,
) -> Result<String, GatewayError> {
    let refresh_token = store
        .get(REFRESH_TOKEN_KEY)
        .ok_or(GatewayError::NoRefreshToken)?;

    tracing::debug!("refreshing access token");

    let response = client
        .post(refresh_url)
        .json(&RefreshRequest { refresh_token })
        .send()
        .await
        .map_err(|e| GatewayError::Network(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        let detail = response.text().await.unwrap_or_default();
        tracing::warn!(status = status.as_u16(), detail = %detail, "token refresh rejected");
        return Err(GatewayError::RefreshRejected {
            status: status.as_u16(),
        });
    }

    let pair: TokenPair = response
        .json()
        .await
        .map_err(|e| GatewayError::Network(e.to_string()))?;

    store.put_pair(&pair.access_token, &pair.refresh_token);
    tracing::debug!("access token refreshed");

    Ok(pair.access_token)
}
