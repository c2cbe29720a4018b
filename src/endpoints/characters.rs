use serde_json::json;
use std::sync::Arc;

use crate::error::Result;
use crate::http_client::ApiClient;
use crate::models::{Character, CreateCharacterRequest, MessageResponse};

#[derive(Clone)]
pub struct CharacterApi {
    client: Arc<ApiClient>,
}

impl CharacterApi {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    pub async fn create(&self, request: &CreateCharacterRequest) -> Result<Character> {
        self.client.post("/characters", request).await
    }

    pub async fn get_by_id(&self, id: &str) -> Result<Character> {
        self.client.get(&format!("/characters/{}", id)).await
    }

    pub async fn get_by_profile(&self, profile_id: &str) -> Result<Vec<Character>> {
        self.client
            .get(&format!("/characters/by-profile/{}", profile_id))
            .await
    }

    pub async fn rename(&self, id: &str, name: &str) -> Result<MessageResponse> {
        self.client
            .patch(&format!("/characters/{}", id), &json!({ "name": name }))
            .await
    }
}
