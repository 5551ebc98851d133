// Wire types shared by the API clients

mod ai;
mod exam;
mod user;

pub use ai::*;
pub use exam::*;
pub use user::*;

use serde::Deserialize;

/// Plain acknowledgement body, `{"message": "..."}`.
#[derive(Debug, Clone, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}
