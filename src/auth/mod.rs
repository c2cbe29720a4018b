// Authentication module
// Token storage and coordinated token refresh

mod coordinator;
mod refresh;
mod sqlite;
mod store;
mod types;

pub use coordinator::RefreshCoordinator;
pub use refresh::REFRESH_PATH;
pub use sqlite::SqliteTokenStore;
pub use store::{MemoryTokenStore, TokenStore};
pub use types::{Credentials, UnauthorizedHandler};
