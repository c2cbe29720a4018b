// Typed endpoint facades over the authenticated client

mod auth;
mod characters;
mod ships;

pub use auth::AuthApi;
pub use characters::CharacterApi;
pub use ships::ShipApi;
