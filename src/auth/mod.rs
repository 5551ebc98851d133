// Authentication module
// Token storage, single-flight refresh, and session lifecycle.

pub mod coordinator;
pub mod refresh;
pub mod store;
pub mod types;

mod session;

pub use session::SessionClient;
pub use store::{CredentialStore, MemoryStore, SqliteStore};
pub use types::{TokenPair, ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY};
