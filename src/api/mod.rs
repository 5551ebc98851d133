// Typed API clients
// Thin wrappers over the gateway; every endpoint speaks the backend's
// `{detail}` error envelope.

mod admin;
mod ai;
mod exams;
mod profile;

pub use admin::AdminClient;
pub use ai::AiExamClient;
pub use exams::ExamClient;
pub use profile::ProfileClient;

use reqwest::Response;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::error::ApiError;

#[derive(Deserialize)]
struct ErrorBody {
    detail: String,
}

/// Decode a success body, or turn an error response into [`ApiError::Api`]
/// using the backend's `detail` message when it sends one.
pub(crate) async fn into_json<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    let status = response.status();
    if !status.is_success() {
        return Err(error_from(status, response).await);
    }
    response
        .json::<T>()
        .await
        .map_err(|e| ApiError::Decode(e.to_string()))
}

/// Check status on endpoints whose success body carries nothing of use.
pub(crate) async fn into_unit(response: Response) -> Result<(), ApiError> {
    let status = response.status();
    if !status.is_success() {
        return Err(error_from(status, response).await);
    }
    Ok(())
}

async fn error_from(status: reqwest::StatusCode, response: Response) -> ApiError {
    let detail = match response.json::<ErrorBody>().await {
        Ok(body) => body.detail,
        Err(_) => status
            .canonical_reason()
            .unwrap_or("API request failed")
            .to_string(),
    };
    ApiError::Api {
        status: status.as_u16(),
        detail,
    }
}

/// Collect the query pairs that actually have a value.
pub(crate) fn present_pairs(pairs: Vec<(&str, Option<String>)>) -> Vec<(&str, String)> {
    pairs
        .into_iter()
        .filter_map(|(key, value)| value.map(|v| (key, v)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_present_pairs_skips_absent_values() {
        let pairs = present_pairs(vec![
            ("email", Some("a@b.jp".to_string())),
            ("role", None),
            ("page", Some("2".to_string())),
        ]);
        assert_eq!(
            pairs,
            vec![
                ("email", "a@b.jp".to_string()),
                ("page", "2".to_string())
            ]
        );
    }
}
