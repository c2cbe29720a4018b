// Wire contracts shared with the SSW backend

pub mod auth;
pub mod character;
pub mod envelope;
pub mod ship;

pub use auth::{AuthResponse, LoginCredentials, RefreshRequest, RefreshResponse, SignupCredentials, UserProfile};
pub use character::{Character, CharacterAttributes, CreateCharacterRequest};
pub use envelope::{DataEnvelope, ErrorBody, ErrorEnvelope, MessageResponse};
pub use ship::{CreateShipRequest, Ship, ShipStats, ShipType};
