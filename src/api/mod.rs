use crate::{
    api::handlers::{config, health, reset_password, root, send_code},
    reset::ResetService,
};
use anyhow::{Context, Result};
use axum::{
    body::Body,
    extract::MatchedPath,
    http::{header::CONTENT_TYPE, HeaderName, HeaderValue, Method, Request},
    routing::{get, post},
    Extension, Json, Router,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::PropagateRequestIdLayer,
    set_header::SetRequestHeaderLayer,
    trace::TraceLayer,
};
use tracing::{info, info_span, Span};
use ulid::Ulid;
use url::Url;

pub mod handlers;
mod openapi;

pub use openapi::{openapi, ApiDoc};

const REQUEST_ID_HEADER: &str = "x-request-id";

/// Client settings served by `GET /api/get-config`.
#[derive(Clone, Debug)]
pub struct ClientConfig {
    api_base_url: String,
}

impl ClientConfig {
    /// Base URL advertised to the frontend: `http://<host>:<port>/api`.
    ///
    /// # Errors
    /// Returns an error if the host does not form a valid URL.
    pub fn new(advertised_host: &str, port: u16) -> Result<Self> {
        let api_base_url = format!("http://{}:{port}/api", advertised_host.trim());
        Url::parse(&api_base_url)
            .with_context(|| format!("Invalid advertised host: {advertised_host}"))?;
        Ok(Self { api_base_url })
    }

    #[must_use]
    pub fn api_base_url(&self) -> &str {
        &self.api_base_url
    }
}

/// Build the application router with all layers attached.
pub fn router(reset: Arc<ResetService>, client: ClientConfig) -> Router {
    let cors = CorsLayer::new()
        .allow_headers([CONTENT_TYPE])
        .allow_methods([Method::GET, Method::POST])
        .allow_origin(Any);

    Router::new()
        .route("/", get(root::root))
        .route("/health", get(health::health).options(health::health))
        .route("/api/send-code", post(send_code::send_code))
        .route("/api/reset-password", post(reset_password::reset_password))
        .route("/api/get-config", get(config::get_config))
        .route("/api/openapi.json", get(|| async { Json(openapi()) }))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestHeaderLayer::if_not_present(
                    HeaderName::from_static(REQUEST_ID_HEADER),
                    |_req: &_| HeaderValue::from_str(Ulid::new().to_string().as_str()).ok(),
                ))
                .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
                    REQUEST_ID_HEADER,
                )))
                .layer(TraceLayer::new_for_http().make_span_with(make_span))
                .layer(cors)
                .layer(Extension(reset))
                .layer(Extension(Arc::new(client))),
        )
}

/// Start the server
/// # Errors
/// Return error if failed to start the server
pub async fn new(port: u16, reset: Arc<ResetService>, client: ClientConfig) -> Result<()> {
    let app = router(reset, client);

    let listener = TcpListener::bind(format!("::0:{port}"))
        .await
        .with_context(|| format!("Failed to bind port {port}"))?;

    info!("Listening on [::]:{}", port);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

fn make_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|val| val.to_str().ok())
        .unwrap_or("none");
    let matched_path = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| request.uri().path(), MatchedPath::as_str);

    info_span!(
        "http.request",
        http.method = %request.method(),
        http.route = matched_path,
        request_id
    )
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {err}");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => tracing::error!("Failed to listen for SIGTERM: {err}"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("Gracefully shutdown");
}
