use serde_json::json;
use std::sync::Arc;

use crate::error::Result;
use crate::http_client::ApiClient;
use crate::models::{CreateShipRequest, MessageResponse, Ship};

#[derive(Clone)]
pub struct ShipApi {
    client: Arc<ApiClient>,
}

impl ShipApi {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    pub async fn create(&self, request: &CreateShipRequest) -> Result<Ship> {
        self.client.post("/ships", request).await
    }

    pub async fn get_by_id(&self, id: &str) -> Result<Ship> {
        self.client.get(&format!("/ships/{}", id)).await
    }

    pub async fn get_by_owner(&self, owner_id: &str) -> Result<Vec<Ship>> {
        self.client.get(&format!("/ships/by-owner/{}", owner_id)).await
    }

    pub async fn rename(&self, id: &str, name: &str) -> Result<MessageResponse> {
        self.client
            .patch(&format!("/ships/{}", id), &json!({ "name": name }))
            .await
    }
}
