//! Navigation gate applied to every page request, reading the credential from
//! the `token` cookie. Redirects use `307 Temporary Redirect`; an unusable
//! credential is expired on the way out so the browser stops sending it.

use crate::session::{classify, evaluate, RouteClass, TOKEN_KEY};
use axum::{
    extract::Request,
    http::{
        header::{InvalidHeaderValue, COOKIE, SET_COOKIE},
        HeaderMap, HeaderValue,
    },
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use tracing::{debug, error};

/// Paths served without consulting the gate.
const UNGATED_PATHS: [&str; 2] = ["/health", "/logout"];

pub async fn gate(request: Request, next: Next) -> Response {
    let path = request.uri().path().to_string();
    if is_ungated(&path) {
        return next.run(request).await;
    }

    let token = extract_token(request.headers());
    let evaluation = evaluate(&path, token.as_deref());
    debug!(path = %path, decision = %evaluation.decision, "Gate evaluated");

    let mut response = match evaluation.decision.location() {
        Some(location) => Redirect::temporary(location).into_response(),
        None => next.run(request).await,
    };

    if evaluation.discard_credential() {
        match clear_token_cookie() {
            Ok(cookie) => {
                response.headers_mut().append(SET_COOKIE, cookie);
            }
            Err(err) => error!("Failed to build cookie header: {err}"),
        }
    }

    response
}

/// Health, logout and static assets skip the gate. An asset is a public path
/// whose last segment has an extension; dotted paths under a gated route are
/// still gated.
fn is_ungated(path: &str) -> bool {
    if UNGATED_PATHS.contains(&path) {
        return true;
    }
    classify(path) == RouteClass::Public
        && path
            .rsplit('/')
            .next()
            .is_some_and(|segment| segment.contains('.'))
}

/// Reads the credential from the `token` cookie.
pub(crate) fn extract_token(headers: &HeaderMap) -> Option<String> {
    for header in headers.get_all(COOKIE) {
        let Ok(value) = header.to_str() else {
            continue;
        };
        for pair in value.split(';') {
            let mut parts = pair.trim().splitn(2, '=');
            let key = parts.next().map(str::trim);
            let val = parts.next().map(str::trim);
            if let (Some(TOKEN_KEY), Some(val)) = (key, val) {
                if !val.is_empty() {
                    return Some(val.to_string());
                }
            }
        }
    }
    None
}

/// Cookie header that expires the credential.
pub(crate) fn clear_token_cookie() -> Result<HeaderValue, InvalidHeaderValue> {
    HeaderValue::from_str(&format!("{TOKEN_KEY}=; Path=/; SameSite=Lax; Max-Age=0"))
}
