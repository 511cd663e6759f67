//! Navigation gate. Every navigation is classified by path and checked against
//! the credential's claims; the result is either "allow" or a single redirect.
//!
//! Rules, in order:
//! 1. Protected path without a usable credential goes to `/login`.
//! 2. Signed-in users never see `/login` or `/register`; they go to `/dashboard`.
//! 3. An incomplete profile sends every non-onboarding page to `/completed-profile`.
//! 4. A missing questionnaire sends protected pages to `/questioner`.
//!
//! An undecodable or expired credential counts as no credential. The gate holds
//! no state: the same path and credential always yield the same decision.

use super::{claims, Session};
use serde::Serialize;
use std::fmt;
use tracing::debug;

pub const LOGIN_PATH: &str = "/login";
pub const REGISTER_PATH: &str = "/register";
pub const DASHBOARD_PATH: &str = "/dashboard";
pub const ADMIN_DASHBOARD_PATH: &str = "/admin/dashboard";
pub const PROFILE_COMPLETION_PATH: &str = "/completed-profile";
pub const QUESTIONNAIRE_PATH: &str = "/questioner";

const PROTECTED_ROUTES: [&str; 3] = ["/dashboard", "/profile", "/pets"];
const AUTH_ROUTES: [&str; 2] = [LOGIN_PATH, REGISTER_PATH];
const ONBOARDING_ROUTES: [&str; 2] = [PROFILE_COMPLETION_PATH, QUESTIONNAIRE_PATH];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteClass {
    Protected,
    AuthOnly,
    Onboarding,
    Public,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Allow,
    RedirectToLogin,
    RedirectToDashboard,
    RedirectToProfileCompletion,
    RedirectToQuestionnaire,
}

impl Decision {
    /// Redirect target, or `None` when the navigation is allowed.
    #[must_use]
    pub const fn location(self) -> Option<&'static str> {
        match self {
            Decision::Allow => None,
            Decision::RedirectToLogin => Some(LOGIN_PATH),
            Decision::RedirectToDashboard => Some(DASHBOARD_PATH),
            Decision::RedirectToProfileCompletion => Some(PROFILE_COMPLETION_PATH),
            Decision::RedirectToQuestionnaire => Some(QUESTIONNAIRE_PATH),
        }
    }

    #[must_use]
    pub const fn is_allow(self) -> bool {
        matches!(self, Decision::Allow)
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.location() {
            None => f.write_str("allow"),
            Some(location) => write!(f, "redirect {location}"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum CredentialState {
    Absent,
    Valid { session: Session },
    /// Present but undecodable or expired; the holder should drop it.
    Invalid,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Evaluation {
    pub route: RouteClass,
    pub credential: CredentialState,
    pub decision: Decision,
}

impl Evaluation {
    #[must_use]
    pub const fn discard_credential(&self) -> bool {
        matches!(self.credential, CredentialState::Invalid)
    }
}

/// Strips query string and fragment from a navigation target.
fn route_path(path: &str) -> &str {
    let end = path.find(|c: char| c == '?' || c == '#').unwrap_or(path.len());
    &path[..end]
}

fn matches_route(path: &str, route: &str) -> bool {
    path.strip_prefix(route)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
}

fn matches_any(path: &str, routes: &[&str]) -> bool {
    routes.iter().any(|route| matches_route(path, route))
}

#[must_use]
pub fn classify(path: &str) -> RouteClass {
    let path = route_path(path);
    if matches_any(path, &PROTECTED_ROUTES) {
        RouteClass::Protected
    } else if matches_any(path, &AUTH_ROUTES) {
        RouteClass::AuthOnly
    } else if matches_any(path, &ONBOARDING_ROUTES) {
        RouteClass::Onboarding
    } else {
        RouteClass::Public
    }
}

fn decide(route: RouteClass, session: Option<&Session>) -> Decision {
    let Some(session) = session else {
        return if route == RouteClass::Protected {
            Decision::RedirectToLogin
        } else {
            Decision::Allow
        };
    };

    match route {
        RouteClass::AuthOnly => Decision::RedirectToDashboard,
        RouteClass::Protected | RouteClass::Public if !session.profile_complete => {
            Decision::RedirectToProfileCompletion
        }
        RouteClass::Protected if !session.questionnaire_complete => {
            Decision::RedirectToQuestionnaire
        }
        _ => Decision::Allow,
    }
}

/// Evaluate a navigation to `path` holding `credential`, with `exp` checked
/// against `now_unix_seconds`.
#[must_use]
pub fn evaluate_at(path: &str, credential: Option<&str>, now_unix_seconds: i64) -> Evaluation {
    let route = classify(path);

    let credential = match credential.map(str::trim).filter(|raw| !raw.is_empty()) {
        None => CredentialState::Absent,
        Some(raw) => match claims::decode_session_at(raw, now_unix_seconds) {
            Ok(claims) => CredentialState::Valid {
                session: Session::from(&claims),
            },
            Err(err) => {
                debug!("Ignoring unusable credential: {err}");
                CredentialState::Invalid
            }
        },
    };

    let session = match &credential {
        CredentialState::Valid { session } => Some(session),
        CredentialState::Absent | CredentialState::Invalid => None,
    };
    let decision = decide(route, session);

    Evaluation {
        route,
        credential,
        decision,
    }
}

/// Evaluate a navigation against the system clock.
#[must_use]
pub fn evaluate(path: &str, credential: Option<&str>) -> Evaluation {
    evaluate_at(path, credential, claims::now_unix_seconds())
}
