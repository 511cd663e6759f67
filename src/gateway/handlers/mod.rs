pub mod health;
pub use self::health::health;

pub mod logout;
pub use self::logout::logout;

use axum::{http::StatusCode, response::IntoResponse};

/// Fallback when no static bundle is configured.
pub async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, "Not Found")
}
