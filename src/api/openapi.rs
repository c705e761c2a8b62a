use crate::api::handlers::{config, health, reset_password, send_code, types};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(health::health, send_code::send_code, reset_password::reset_password, config::get_config),
    components(
        schemas(
            health::Health,
            types::ApiResponse,
            types::SendCodeRequest,
            types::ResetPasswordRequest,
            types::ConfigResponse
        )
    ),
    tags(
        (name = "reset", description = "Self-service directory password reset API"),
        (name = "health", description = "Liveness")
    )
)]
pub struct ApiDoc;

#[must_use]
pub fn openapi() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn documents_all_routes() {
        let doc = openapi();
        for path in [
            "/health",
            "/api/send-code",
            "/api/reset-password",
            "/api/get-config",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }
}
