use super::types::ConfigResponse;
use crate::api::ClientConfig;
use axum::{extract::Extension, response::IntoResponse, Json};
use std::sync::Arc;

#[utoipa::path(
    get,
    path = "/api/get-config",
    responses(
        (status = 200, description = "Client configuration", body = ConfigResponse)
    ),
    tag = "reset"
)]
pub async fn get_config(client: Extension<Arc<ClientConfig>>) -> impl IntoResponse {
    Json(ConfigResponse {
        api_base_url: client.api_base_url().to_string(),
    })
}
