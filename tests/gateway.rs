//! End-to-end checks of the HTTP gateway: the navigation gate must run on full
//! page loads, redirect with `Location`, drop bad credential cookies, and leave
//! health and static assets alone.

use anyhow::Result;
use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use base64ct::{Base64UrlUnpadded, Encoding};
use serde_json::{json, Value};
use solvana::gateway::{handlers::health::Health, router};
use std::fs;
use tower::ServiceExt;

const FAR_FUTURE: i64 = 4_000_000_000;

fn token(payload: &Value) -> Result<String> {
    let body = Base64UrlUnpadded::encode_string(&serde_json::to_vec(payload)?);
    Ok(format!("eyJhbGciOiJIUzI1NiJ9.{body}.sig"))
}

fn onboarded_token() -> Result<String> {
    token(&json!({
        "id": 7,
        "email": "sam@solvana.app",
        "role": "USER",
        "profile": {"bio": "hi", "age": 30, "gender": "other"},
        "questionnaire": {"id": 1},
        "exp": FAR_FUTURE,
    }))
}

fn fresh_token() -> Result<String> {
    token(&json!({
        "id": 8,
        "email": "new@solvana.app",
        "role": "USER",
        "exp": FAR_FUTURE,
    }))
}

async fn get(app: Router, path: &str, cookie: Option<&str>) -> Result<axum::response::Response> {
    let mut request = Request::builder().uri(path);
    if let Some(cookie) = cookie {
        request = request.header(header::COOKIE, cookie);
    }
    Ok(app.oneshot(request.body(Body::empty())?).await?)
}

fn location(response: &axum::response::Response) -> Option<&str> {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|value| value.to_str().ok())
}

#[tokio::test]
async fn anonymous_protected_page_redirects_to_login() -> Result<()> {
    let response = get(router(None), "/dashboard", None).await?;
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&response), Some("/login"));
    Ok(())
}

#[tokio::test]
async fn anonymous_public_page_passes_through() -> Result<()> {
    let response = get(router(None), "/community", None).await?;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn fresh_account_is_sent_to_profile_completion() -> Result<()> {
    let cookie = format!("token={}", fresh_token()?);
    let response = get(router(None), "/pets", Some(&cookie)).await?;
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&response), Some("/completed-profile"));
    Ok(())
}

#[tokio::test]
async fn onboarded_user_is_kept_off_login() -> Result<()> {
    let cookie = format!("theme=dark; token={}", onboarded_token()?);
    let response = get(router(None), "/login?next=/pets", Some(&cookie)).await?;
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&response), Some("/dashboard"));
    Ok(())
}

#[tokio::test]
async fn invalid_cookie_is_dropped_and_login_is_served() -> Result<()> {
    let response = get(router(None), "/login", Some("token=garbage")).await?;
    // No redirect loop: the login page itself is served.
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    assert!(cookie.starts_with("token=;"));
    assert!(cookie.contains("Max-Age=0"));
    Ok(())
}

#[tokio::test]
async fn expired_cookie_on_protected_page_redirects_and_drops() -> Result<()> {
    let expired = token(&json!({
        "id": 7,
        "email": "sam@solvana.app",
        "role": "USER",
        "profile": {"bio": "hi", "age": 30, "gender": "other"},
        "questionnaire": {"id": 1},
        "exp": 1,
    }))?;
    let cookie = format!("token={expired}");
    let response = get(router(None), "/profile", Some(&cookie)).await?;
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&response), Some("/login"));
    assert!(response.headers().contains_key(header::SET_COOKIE));
    Ok(())
}

#[tokio::test]
async fn health_is_not_gated() -> Result<()> {
    let response = get(router(None), "/health", Some("token=garbage")).await?;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-app"));
    assert!(response.headers().contains_key("x-request-id"));

    let body = to_bytes(response.into_body(), usize::MAX).await?;
    let health: Health = serde_json::from_slice(&body)?;
    assert_eq!(health.name, env!("CARGO_PKG_NAME"));
    assert_eq!(health.version, env!("CARGO_PKG_VERSION"));
    Ok(())
}

#[tokio::test]
async fn logout_clears_cookie_and_goes_to_login() -> Result<()> {
    let cookie = format!("token={}", onboarded_token()?);
    let response = get(router(None), "/logout", Some(&cookie)).await?;
    assert!(response.status().is_redirection());
    assert_eq!(location(&response), Some("/login"));
    assert!(response.headers().contains_key(header::SET_COOKIE));
    Ok(())
}

#[tokio::test]
async fn web_root_serves_index_for_allowed_pages() -> Result<()> {
    let dir = tempfile::tempdir()?;
    fs::write(dir.path().join("index.html"), "<html>solvana</html>")?;
    fs::write(dir.path().join("app.js"), "console.log(1)")?;
    let app = router(Some(dir.path().to_path_buf()));

    let cookie = format!("token={}", onboarded_token()?);
    let response = get(app.clone(), "/dashboard", Some(&cookie)).await?;
    assert_eq!(response.status(), StatusCode::OK);
    let body = to_bytes(response.into_body(), usize::MAX).await?;
    assert_eq!(&body[..], b"<html>solvana</html>");

    // Assets are never gated, even for anonymous visitors.
    let response = get(app, "/app.js", None).await?;
    assert_eq!(response.status(), StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn dotted_protected_paths_stay_gated() -> Result<()> {
    let dir = tempfile::tempdir()?;
    fs::write(dir.path().join("index.html"), "<html>app shell</html>")?;
    let app = router(Some(dir.path().to_path_buf()));

    for path in ["/dashboard/settings.v2", "/pets/1.0", "/profile/john.doe"] {
        let response = get(app.clone(), path, None).await?;
        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT, "{path}");
        assert_eq!(location(&response), Some("/login"), "{path}");
    }

    let response = get(router(None), "/dashboard/x.y", None).await?;
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    Ok(())
}

#[tokio::test]
async fn minimal_payload_is_routed_to_profile_completion() -> Result<()> {
    let credential = token(&json!({"profile": {"bio": "", "age": null, "gender": null}}))?;
    let cookie = format!("token={credential}");
    let response = get(router(None), "/community", Some(&cookie)).await?;
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&response), Some("/completed-profile"));
    assert!(!response.headers().contains_key(header::SET_COOKIE));
    Ok(())
}

#[tokio::test]
async fn whitespace_bio_reaches_the_dashboard() -> Result<()> {
    let credential = token(&json!({
        "id": "u-1",
        "profile": {"bio": " ", "age": 30, "gender": "other"},
        "questionnaire": {"id": 1},
        "exp": FAR_FUTURE,
    }))?;
    let cookie = format!("token={credential}");
    let response = get(router(None), "/dashboard", Some(&cookie)).await?;
    // Allowed through to the (absent) bundle.
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(location(&response).is_none());
    Ok(())
}
