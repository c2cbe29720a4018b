use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Point-bounded attribute spread. Totals are validated by the caller and the
/// backend, never by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterAttributes {
    pub piloting: u8,
    pub engineering: u8,
    pub science: u8,
    pub tactics: u8,
    pub leadership: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Character {
    pub id: String,
    pub profile_id: String,
    pub name: String,
    pub home_sector: String,
    pub attributes: CharacterAttributes,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateCharacterRequest {
    pub profile_id: String,
    pub name: String,
    pub home_sector: String,
    pub attributes: CharacterAttributes,
}
