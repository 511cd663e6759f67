//! Auth state shared by everything that renders or navigates. The context owns
//! the in-memory user record and is the only writer of the credential slot;
//! consumers read the record or subscribe to changes.

use crate::{
    api::types::User,
    session::{
        claims, evaluate, gate::LOGIN_PATH, Credential, Evaluation, OnboardingStage, StorageError,
        TokenStore,
    },
};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum AuthError {
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("not signed in")]
    NotAuthenticated,
    #[error("onboarding cannot move back from {current:?} to {requested:?}")]
    StageRegression {
        current: OnboardingStage,
        requested: OnboardingStage,
    },
}

#[derive(Clone, Debug)]
/// Auth context handle. Clones share the same record and credential slot.
pub struct AuthContext {
    tokens: TokenStore,
    user: Arc<watch::Sender<Option<User>>>,
}

impl AuthContext {
    #[must_use]
    pub fn new(tokens: TokenStore) -> Self {
        let (user, _) = watch::channel(None);
        Self {
            tokens,
            user: Arc::new(user),
        }
    }

    /// Builds a context and hydrates the record from a stored credential.
    #[must_use]
    pub fn restored(tokens: TokenStore) -> Self {
        let context = Self::new(tokens);
        context.restore();
        context
    }

    #[must_use]
    pub fn token_store(&self) -> &TokenStore {
        &self.tokens
    }

    #[must_use]
    pub fn credential(&self) -> Option<Credential> {
        self.tokens.get()
    }

    #[must_use]
    pub fn current_user(&self) -> Option<User> {
        self.user.borrow().clone()
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.user.borrow().is_some()
    }

    #[must_use]
    pub fn stage(&self) -> OnboardingStage {
        OnboardingStage::of(self.user.borrow().as_ref())
    }

    /// Receiver that observes every record change, starting from the current one.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Option<User>> {
        self.user.subscribe()
    }

    /// Persists the credential, then replaces the record and notifies subscribers.
    ///
    /// # Errors
    /// Returns an error if the credential cannot be stored; the record is left untouched.
    pub fn login(&self, credential: &Credential, user: User) -> Result<(), AuthError> {
        self.tokens.set(credential)?;
        debug!(user_id = user.id, "Signed in");
        self.user.send_replace(Some(user));
        Ok(())
    }

    /// Clears the credential and the record. Returns the page to navigate to.
    ///
    /// The record is cleared even when the storage backend fails, so the UI
    /// never keeps showing a signed-in user.
    ///
    /// # Errors
    /// Returns the storage error after the in-memory state has been reset.
    pub fn logout(&self) -> Result<&'static str, AuthError> {
        let cleared = self.tokens.clear();
        self.user.send_replace(None);
        debug!("Signed out");
        cleared?;
        Ok(LOGIN_PATH)
    }

    /// Replaces the record after a profile or questionnaire update.
    ///
    /// # Errors
    /// Returns [`AuthError::NotAuthenticated`] without a signed-in user and
    /// [`AuthError::StageRegression`] if the update would undo onboarding progress.
    pub fn update_user(&self, user: User) -> Result<(), AuthError> {
        let current = match self.user.borrow().as_ref() {
            Some(current) => OnboardingStage::of(Some(current)),
            None => return Err(AuthError::NotAuthenticated),
        };
        let requested = OnboardingStage::of(Some(&user));
        if requested < current {
            return Err(AuthError::StageRegression { current, requested });
        }

        self.user.send_replace(Some(user));
        Ok(())
    }

    /// Stores a credential reissued by the API without touching the record.
    ///
    /// # Errors
    /// Returns an error if the credential cannot be stored.
    pub fn replace_credential(&self, credential: &Credential) -> Result<(), AuthError> {
        if !self.is_authenticated() {
            return Err(AuthError::NotAuthenticated);
        }
        self.tokens.set(credential)?;
        Ok(())
    }

    /// Hydrates the record from the stored credential's claims. An unusable
    /// credential is dropped. Returns whether a user was restored.
    pub fn restore(&self) -> bool {
        let Some(credential) = self.tokens.get() else {
            return false;
        };

        match claims::decode(credential.expose()) {
            Ok(claims) => {
                self.user.send_replace(Some(claims.user));
                true
            }
            Err(err) => {
                debug!("Dropping stored credential: {err}");
                self.drop_credential();
                false
            }
        }
    }

    /// Runs the navigation gate against the stored credential, dropping the
    /// credential (and the record) when the gate finds it unusable.
    #[must_use]
    pub fn navigate(&self, path: &str) -> Evaluation {
        let credential = self.tokens.get();
        let evaluation = evaluate(path, credential.as_ref().map(Credential::expose));
        if evaluation.discard_credential() {
            self.drop_credential();
        }
        debug!(path, decision = %evaluation.decision, "Navigation evaluated");
        evaluation
    }

    fn drop_credential(&self) {
        if let Err(err) = self.tokens.clear() {
            warn!("Failed to clear invalid credential: {err}");
        }
        self.user.send_replace(None);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::{
        api::types::{Profile, Role},
        session::{Decision, Storage, StorageError},
    };
    use base64ct::{Base64UrlUnpadded, Encoding};
    use serde_json::json;

    fn user() -> User {
        User {
            id: 5,
            email: "kai@solvana.app".to_string(),
            name: "Kai".to_string(),
            role: Role::User,
            profile: None,
            questionnaire: None,
        }
    }

    fn with_profile(mut user: User) -> User {
        user.profile = Some(Profile {
            bio: Some("hello".to_string()),
            age: Some(28),
            gender: Some("other".to_string()),
            ..Profile::default()
        });
        user
    }

    fn credential_for(user: &User) -> Credential {
        let body = Base64UrlUnpadded::encode_string(&serde_json::to_vec(user).unwrap());
        Credential::new(format!("h.{body}.s"))
    }

    #[test]
    fn login_persists_and_notifies() {
        let context = AuthContext::new(TokenStore::in_memory());
        let mut receiver = context.subscribe();
        assert!(receiver.borrow_and_update().is_none());

        let user = user();
        context.login(&credential_for(&user), user.clone()).unwrap();

        assert!(receiver.has_changed().unwrap());
        assert_eq!(receiver.borrow_and_update().as_ref(), Some(&user));
        assert_eq!(context.current_user(), Some(user));
        assert!(context.credential().is_some());
        assert_eq!(context.stage(), OnboardingStage::ProfileIncomplete);
    }

    #[test]
    fn logout_resets_from_any_stage() {
        let context = AuthContext::new(TokenStore::in_memory());
        let user = with_profile(user());
        context.login(&credential_for(&user), user).unwrap();

        assert_eq!(context.logout().unwrap(), "/login");
        assert_eq!(context.current_user(), None);
        assert!(context.credential().is_none());
        assert_eq!(context.stage(), OnboardingStage::Anonymous);
    }

    #[test]
    fn update_only_moves_forward() {
        let context = AuthContext::new(TokenStore::in_memory());
        assert!(matches!(
            context.update_user(user()),
            Err(AuthError::NotAuthenticated)
        ));

        let user = user();
        context.login(&credential_for(&user), user.clone()).unwrap();

        let profiled = with_profile(user.clone());
        context.update_user(profiled.clone()).unwrap();
        assert_eq!(context.stage(), OnboardingStage::QuestionnaireIncomplete);

        assert!(matches!(
            context.update_user(user),
            Err(AuthError::StageRegression { .. })
        ));
        assert_eq!(context.current_user(), Some(profiled.clone()));

        let mut onboarded = profiled;
        onboarded.questionnaire = Some(json!({"id": 1}));
        context.update_user(onboarded).unwrap();
        assert_eq!(context.stage(), OnboardingStage::Onboarded);
    }

    #[test]
    fn restore_hydrates_from_claims() {
        let tokens = TokenStore::in_memory();
        let user = with_profile(user());
        tokens.set(&credential_for(&user)).unwrap();

        let context = AuthContext::restored(tokens);
        assert_eq!(context.current_user(), Some(user));
    }

    #[test]
    fn restore_drops_invalid_credential() {
        let tokens = TokenStore::in_memory();
        tokens.set(&Credential::new("not-a-jwt")).unwrap();

        let context = AuthContext::new(tokens);
        assert!(!context.restore());
        assert!(context.credential().is_none());
    }

    #[test]
    fn navigate_drops_invalid_credential() {
        let context = AuthContext::new(TokenStore::in_memory());
        let user = user();
        context.login(&Credential::new("broken"), user).unwrap();

        let evaluation = context.navigate("/dashboard");
        assert_eq!(evaluation.decision, Decision::RedirectToLogin);
        assert!(context.credential().is_none());
        assert!(!context.is_authenticated());
    }

    #[test]
    fn navigate_follows_stored_claims() {
        let context = AuthContext::new(TokenStore::in_memory());
        let user = with_profile(user());
        context.login(&credential_for(&user), user).unwrap();

        assert_eq!(
            context.navigate("/dashboard").decision,
            Decision::RedirectToQuestionnaire
        );
        assert_eq!(context.navigate("/resthub").decision, Decision::Allow);
        assert!(context.credential().is_some());
    }

    struct FailingStorage;

    impl Storage for FailingStorage {
        fn get_item(&self, _key: &str) -> Option<String> {
            None
        }

        fn set_item(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
            Err(StorageError::Poisoned)
        }

        fn remove_item(&self, _key: &str) -> Result<(), StorageError> {
            Err(StorageError::Poisoned)
        }
    }

    #[test]
    fn failed_login_leaves_record_untouched() {
        let context = AuthContext::new(TokenStore::new(Arc::new(FailingStorage)));
        let user = user();
        assert!(context.login(&credential_for(&user), user).is_err());
        assert!(!context.is_authenticated());
        // Logout still resets memory even though storage fails.
        assert!(context.logout().is_err());
        assert!(!context.is_authenticated());
    }
}
