use crate::APP_USER_AGENT;
use axum::response::IntoResponse;

pub async fn root() -> impl IntoResponse {
    APP_USER_AGENT
}
