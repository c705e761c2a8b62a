use super::{
    run_to_completion,
    types::{ApiResponse, SendCodeRequest},
};
use crate::reset::ResetService;
use axum::{extract::Extension, response::IntoResponse, Json};
use std::sync::Arc;
use tracing::instrument;

#[utoipa::path(
    post,
    path = "/api/send-code",
    request_body = SendCodeRequest,
    responses(
        (status = 200, description = "Verification code sent", body = ApiResponse),
        (status = 400, description = "Username or email missing", body = ApiResponse),
        (status = 500, description = "Lookup failed, email mismatch or mail not sent", body = ApiResponse)
    ),
    tag = "reset"
)]
// axum handler for code requests
#[instrument(skip(reset, payload))]
pub async fn send_code(
    reset: Extension<Arc<ResetService>>,
    payload: Option<Json<SendCodeRequest>>,
) -> impl IntoResponse {
    // A missing or malformed body is handled like empty fields.
    let request = payload.map(|Json(payload)| payload).unwrap_or_default();

    let reset = Arc::clone(&reset.0);
    run_to_completion(async move {
        reset.request_code(request.into()).await.map(|()| "Verification code sent")
    })
    .await
}
