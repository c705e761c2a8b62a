//! API handlers and the JSON envelope shared by the reset endpoints.

pub mod config;
pub mod health;
pub mod reset_password;
pub mod root;
pub mod send_code;
pub mod types;

use crate::reset::ResetError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use std::future::Future;
use tracing::{error, Instrument};
use types::ApiResponse;

impl ResetError {
    /// 400 for problems with the caller's input, 500 for backend failures.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MissingField(_) | Self::MissingFields | Self::InvalidIdentity | Self::Code(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::LookupFailed | Self::SendFailed | Self::WriteFailed(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ResetError {
    fn into_response(self) -> Response {
        (self.status(), Json(ApiResponse::failure(self.to_string()))).into_response()
    }
}

/// Run a reset step on its own task so a disconnecting client cannot cancel
/// directory or mail calls halfway through.
pub(crate) async fn run_to_completion<F>(step: F) -> Response
where
    F: Future<Output = Result<&'static str, ResetError>> + Send + 'static,
{
    match tokio::spawn(step.in_current_span()).await {
        Ok(Ok(message)) => ApiResponse::ok(message).into_response(),
        Ok(Err(err)) => err.into_response(),
        Err(err) => {
            error!("Reset task failed: {err}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::failure("Internal server error")),
            )
                .into_response()
        }
    }
}
