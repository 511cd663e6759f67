//! Client session: the stored bearer credential, its decoded claims, and the
//! gate that routes every navigation from them.
//!
//! The session is never persisted on its own. It is recomputed from the
//! credential on every navigation, so the gate stays stateless and the
//! credential slot is the single source of truth.

pub mod claims;
pub mod gate;
pub mod token;

use crate::api::types::{Role, User};
use serde::Serialize;

pub use gate::{classify, evaluate, evaluate_at, CredentialState, Decision, Evaluation, RouteClass};
pub use token::{Credential, FileStorage, MemoryStorage, Storage, StorageError, TokenStore, TOKEN_KEY};

/// Routing-relevant view of a credential's claims.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Session {
    pub authenticated: bool,
    pub role: Option<Role>,
    pub profile_complete: bool,
    pub questionnaire_complete: bool,
}

impl Session {
    #[must_use]
    pub const fn anonymous() -> Self {
        Self {
            authenticated: false,
            role: None,
            profile_complete: false,
            questionnaire_complete: false,
        }
    }

    #[must_use]
    pub fn from_user(user: &User) -> Self {
        Self {
            authenticated: true,
            role: Some(user.role),
            profile_complete: user.profile_complete(),
            questionnaire_complete: user.questionnaire_complete(),
        }
    }

    #[must_use]
    pub fn stage(&self) -> OnboardingStage {
        if !self.authenticated {
            OnboardingStage::Anonymous
        } else if !self.profile_complete {
            OnboardingStage::ProfileIncomplete
        } else if !self.questionnaire_complete {
            OnboardingStage::QuestionnaireIncomplete
        } else {
            OnboardingStage::Onboarded
        }
    }
}

impl From<&claims::SessionClaims> for Session {
    fn from(claims: &claims::SessionClaims) -> Self {
        Self {
            authenticated: true,
            role: claims.role,
            profile_complete: claims.profile_complete(),
            questionnaire_complete: claims.questionnaire_complete(),
        }
    }
}

/// Where a user stands in onboarding. Ordered: a signed-in user only ever
/// moves towards `Onboarded`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum OnboardingStage {
    Anonymous,
    ProfileIncomplete,
    QuestionnaireIncomplete,
    Onboarded,
}

impl OnboardingStage {
    #[must_use]
    pub fn of(user: Option<&User>) -> Self {
        user.map_or(Self::Anonymous, |user| Session::from_user(user).stage())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::types::Profile;
    use serde_json::json;

    fn user(profile: Option<Profile>, questionnaire: bool) -> User {
        User {
            id: 1,
            email: "a@b.co".to_string(),
            name: "A".to_string(),
            role: Role::User,
            profile,
            questionnaire: questionnaire.then(|| json!({"id": 1})),
        }
    }

    fn complete_profile() -> Profile {
        Profile {
            bio: Some("bio".to_string()),
            age: Some(20),
            gender: Some("male".to_string()),
            ..Profile::default()
        }
    }

    #[test]
    fn stages_follow_completeness() {
        assert_eq!(OnboardingStage::of(None), OnboardingStage::Anonymous);
        assert_eq!(
            OnboardingStage::of(Some(&user(None, false))),
            OnboardingStage::ProfileIncomplete
        );
        // The questionnaire alone does not skip the profile step.
        assert_eq!(
            OnboardingStage::of(Some(&user(None, true))),
            OnboardingStage::ProfileIncomplete
        );
        assert_eq!(
            OnboardingStage::of(Some(&user(Some(complete_profile()), false))),
            OnboardingStage::QuestionnaireIncomplete
        );
        assert_eq!(
            OnboardingStage::of(Some(&user(Some(complete_profile()), true))),
            OnboardingStage::Onboarded
        );
    }

    #[test]
    fn stages_are_ordered() {
        assert!(OnboardingStage::Anonymous < OnboardingStage::ProfileIncomplete);
        assert!(OnboardingStage::ProfileIncomplete < OnboardingStage::QuestionnaireIncomplete);
        assert!(OnboardingStage::QuestionnaireIncomplete < OnboardingStage::Onboarded);
    }

    #[test]
    fn anonymous_session_has_no_role() {
        let session = Session::anonymous();
        assert!(!session.authenticated);
        assert_eq!(session.role, None);
        assert_eq!(session.stage(), OnboardingStage::Anonymous);
    }
}
