use super::{
    run_to_completion,
    types::{ApiResponse, ResetPasswordRequest},
};
use crate::reset::ResetService;
use axum::{extract::Extension, response::IntoResponse, Json};
use std::sync::Arc;
use tracing::instrument;

#[utoipa::path(
    post,
    path = "/api/reset-password",
    request_body = ResetPasswordRequest,
    responses(
        (status = 200, description = "Password reset", body = ApiResponse),
        (status = 400, description = "Missing fields, identity mismatch or bad code", body = ApiResponse),
        (status = 500, description = "Directory write failed", body = ApiResponse)
    ),
    tag = "reset"
)]
#[instrument(skip(reset, payload))]
pub async fn reset_password(
    reset: Extension<Arc<ResetService>>,
    payload: Option<Json<ResetPasswordRequest>>,
) -> impl IntoResponse {
    let request = payload.map(|Json(payload)| payload).unwrap_or_default();

    let reset = Arc::clone(&reset.0);
    run_to_completion(async move {
        reset.complete_reset(request.into()).await.map(|()| "Password reset successful")
    })
    .await
}
