use crate::{gateway::middleware::clear_token_cookie, session::gate::LOGIN_PATH};
use axum::{
    http::{header::SET_COOKIE, HeaderMap},
    response::{IntoResponse, Redirect},
};
use tracing::error;

/// Expires the credential cookie and sends the browser to the login page.
pub async fn logout() -> impl IntoResponse {
    // Always redirect, even if the cookie header could not be built.
    let mut headers = HeaderMap::new();
    match clear_token_cookie() {
        Ok(cookie) => {
            headers.insert(SET_COOKIE, cookie);
        }
        Err(err) => error!("Failed to build cookie header: {err}"),
    }
    (headers, Redirect::to(LOGIN_PATH))
}
