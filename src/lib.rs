//! # Solvana
//!
//! Session gate and onboarding flow for the Solvana mental-wellness web app.
//!
//! A visitor moves through a fixed sequence before reaching the members area:
//!
//! 1. **Authenticate** by logging in or registering against the backend API.
//! 2. **Complete the profile** (bio, age, gender).
//! 3. **Answer the questionnaire**, which yields a mental score and a pet.
//!
//! Every navigation is checked by a pure decision function ([`session::gate`])
//! that reads only the stored credential (a JWT) and the requested path. The
//! same function backs the HTTP gateway in front of the static web bundle and
//! the in-process [`auth::AuthContext`], so full page loads and client-side
//! navigation agree on where a visitor may go.
//!
//! ## Layout
//!
//! - [`session`]: credential storage, claim decoding, and the navigation gate.
//! - [`auth`]: the observable auth context and the onboarding flow sequencer.
//! - [`api`]: typed client for the auth, profile, and questionnaire endpoints.
//! - [`gateway`]: axum server that enforces the gate before serving pages.
//! - [`cli`]: argument parsing, telemetry, and action dispatch for the binary.

pub mod api;
pub mod auth;
pub mod cli;
pub mod gateway;
pub mod session;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);
