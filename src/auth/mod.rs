//! Auth state and the onboarding flow built on top of it.
//!
//! Flow overview: registration signs the user in and sends them to profile
//! completion, profile completion sends them to the questionnaire, and the
//! questionnaire sends them to the dashboard. The navigation gate in
//! [`crate::session::gate`] enforces the same order on every page load, so the
//! forms only need to point forward.

pub mod context;
pub mod flow;

pub use context::{AuthContext, AuthError};
pub use flow::{FlowError, Navigation, Onboarding, ProfileForm};
