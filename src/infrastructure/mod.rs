pub mod api_client;
pub mod envelope;
pub mod session;

pub use api_client::ApiClient;
pub use session::{AuthSession, StoredSession};
