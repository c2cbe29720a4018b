// SSW Galaxy API client - library root

pub mod auth;
pub mod cli;
pub mod config;
pub mod endpoints;
pub mod error;
pub mod http_client;
pub mod models;
pub mod request;
pub mod response;

pub use auth::{MemoryTokenStore, SqliteTokenStore, TokenStore};
pub use config::ClientSettings;
pub use error::ApiError;
pub use http_client::ApiClient;
pub use request::{ApiRequest, HttpMethod};
