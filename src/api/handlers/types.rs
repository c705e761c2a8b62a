//! Request/response types for the reset endpoints.

use crate::reset::{CodeRequest, ResetRequest};
use axum::{http::StatusCode, Json};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(ToSchema, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub success: bool,
    pub message: String,
}

impl ApiResponse {
    #[must_use]
    pub fn ok(message: impl Into<String>) -> (StatusCode, Json<Self>) {
        (
            StatusCode::OK,
            Json(Self {
                success: true,
                message: message.into(),
            }),
        )
    }

    #[must_use]
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

#[derive(ToSchema, Serialize, Deserialize, Debug, Default)]
pub struct SendCodeRequest {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

impl From<SendCodeRequest> for CodeRequest {
    fn from(request: SendCodeRequest) -> Self {
        Self {
            username: request.username,
            email: request.email,
        }
    }
}

#[derive(ToSchema, Deserialize, Default)]
pub struct ResetPasswordRequest {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub new_password: Option<String>,
}

impl std::fmt::Debug for ResetPasswordRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResetPasswordRequest")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("code", &self.code.as_ref().map(|_| "***"))
            .field("new_password", &self.new_password.as_ref().map(|_| "***"))
            .finish()
    }
}

impl From<ResetPasswordRequest> for ResetRequest {
    fn from(request: ResetPasswordRequest) -> Self {
        Self {
            username: request.username,
            email: request.email,
            code: request.code,
            new_password: request.new_password.map(SecretString::from),
        }
    }
}

#[derive(ToSchema, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ConfigResponse {
    pub api_base_url: String,
}
