//! HTTP gateway in front of the static web bundle. Every page request passes
//! through the navigation gate before the bundle is served, so onboarding is
//! enforced on full page loads as well as in-app navigation.

pub mod handlers;
pub mod middleware;

use anyhow::Result;
use axum::{
    body::Body,
    extract::MatchedPath,
    http::{HeaderName, HeaderValue, Request},
    routing::get,
    Router,
};
use std::path::PathBuf;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    request_id::PropagateRequestIdLayer,
    services::{ServeDir, ServeFile},
    set_header::SetRequestHeaderLayer,
    trace::TraceLayer,
};
use tracing::{info, info_span, Span};
use ulid::Ulid;

const REQUEST_ID: &str = "x-request-id";

/// Build the gateway router. Without a `web_root`, gated pages that pass
/// answer `404`.
#[must_use]
pub fn router(web_root: Option<PathBuf>) -> Router {
    let router = Router::new()
        .route("/health", get(handlers::health))
        .route("/logout", get(handlers::logout).post(handlers::logout));

    let router = match web_root {
        // Unknown paths fall back to index.html so client-side routes resolve.
        Some(root) => {
            let index = root.join("index.html");
            router.fallback_service(ServeDir::new(root).fallback(ServeFile::new(index)))
        }
        None => router.fallback(handlers::not_found),
    };

    router
        .layer(axum::middleware::from_fn(middleware::gate))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestHeaderLayer::if_not_present(
                    HeaderName::from_static(REQUEST_ID),
                    |_req: &_| HeaderValue::from_str(Ulid::new().to_string().as_str()).ok(),
                ))
                .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
                    REQUEST_ID,
                )))
                .layer(TraceLayer::new_for_http().make_span_with(make_span)),
        )
}

/// Start the gateway
/// # Errors
/// Return error if failed to bind or serve
pub async fn new(port: u16, web_root: Option<PathBuf>) -> Result<()> {
    let app = router(web_root);

    let listener = TcpListener::bind(format!("::0:{port}")).await?;

    info!("Listening on [::]:{}", port);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(async {
            if let Err(err) = tokio::signal::ctrl_c().await {
                // Without a signal handler, keep serving until the process is killed.
                tracing::error!("Failed to listen for shutdown signal: {err}");
                std::future::pending::<()>().await;
            }
            info!("Gracefully shutdown");
        })
        .await?;

    Ok(())
}

fn make_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get(REQUEST_ID)
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
