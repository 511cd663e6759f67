//! Onboarding flow: the success and failure handling of the login,
//! registration, profile and questionnaire forms.
//!
//! Each step validates its form, calls the API, updates the auth context and
//! resolves to the next page. Failures come back as a [`FlowError`] whose
//! message is meant to be shown inline on the form; nothing is retried. Steps
//! do not re-check completeness themselves: the navigation gate bounces any
//! attempt to skip ahead.

use super::context::{AuthContext, AuthError};
use crate::{
    api::{
        types::{
            LoginCredentials, Profile, ProfileUpdate, Question, QuestionnaireResponse,
            RegisterCredentials, Role,
        },
        ApiClient, ApiError,
    },
    session::{
        gate::{
            ADMIN_DASHBOARD_PATH, DASHBOARD_PATH, PROFILE_COMPLETION_PATH, QUESTIONNAIRE_PATH,
        },
        Credential,
    },
};
use regex::Regex;
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::{error, instrument, warn};

pub const GENDERS: [&str; 3] = ["male", "female", "other"];
const MAX_AGE: i64 = 150;
const ANSWER_SCALE: std::ops::RangeInclusive<u8> = 1..=5;

/// A form failure, displayed verbatim next to the form.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct FlowError {
    pub message: String,
}

impl FlowError {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<AuthError> for FlowError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::NotAuthenticated => Self::new("Please sign in again"),
            AuthError::Storage(_) | AuthError::StageRegression { .. } => {
                error!("Failed to update auth state: {err}");
                Self::new("Something went wrong, please try again")
            }
        }
    }
}

/// Where to go after a step succeeded.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Navigation {
    pub to: &'static str,
}

impl Navigation {
    const fn to(to: &'static str) -> Self {
        Self { to }
    }
}

#[must_use]
pub fn valid_email(email: &str) -> bool {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").map_or(false, |re| re.is_match(email))
}

/// Raw profile form input, as typed by the user.
#[derive(Clone, Debug, Default)]
pub struct ProfileForm {
    pub bio: String,
    pub age: String,
    pub gender: String,
}

impl ProfileForm {
    /// Prefills the form from the current record.
    #[must_use]
    pub fn from_profile(profile: Option<&Profile>) -> Self {
        let Some(profile) = profile else {
            return Self::default();
        };
        Self {
            bio: profile.bio.clone().unwrap_or_default(),
            age: profile.age.map(|age| age.to_string()).unwrap_or_default(),
            gender: profile.gender.clone().unwrap_or_default(),
        }
    }

    /// # Errors
    /// Returns a [`FlowError`] naming the first invalid field.
    pub fn validate(&self) -> Result<ProfileUpdate, FlowError> {
        let bio = self.bio.trim();
        if bio.is_empty() {
            return Err(FlowError::new("Bio is required"));
        }
        let age = self
            .age
            .trim()
            .parse::<i64>()
            .ok()
            .filter(|age| (1..=MAX_AGE).contains(age))
            .ok_or_else(|| FlowError::new("Please enter a valid age"))?;
        let gender = self.gender.trim().to_lowercase();
        if !GENDERS.contains(&gender.as_str()) {
            return Err(FlowError::new("Please select a gender"));
        }

        Ok(ProfileUpdate {
            bio: Some(bio.to_string()),
            age: Some(age),
            gender: Some(gender),
        })
    }
}

/// Checks that every question has an answer on the 1..=5 scale.
///
/// # Errors
/// Returns "Please answer all questions" when anything is missing or out of range.
pub fn validate_answers(
    questions: &BTreeMap<String, Question>,
    answers: &BTreeMap<String, u8>,
) -> Result<(), FlowError> {
    let complete = answers.len() == questions.len()
        && questions.keys().all(|id| {
            answers
                .get(id)
                .is_some_and(|answer| ANSWER_SCALE.contains(answer))
        });
    if complete {
        Ok(())
    } else {
        Err(FlowError::new("Please answer all questions"))
    }
}

/// Drives the onboarding forms against the API and the auth context.
#[derive(Clone, Debug)]
pub struct Onboarding {
    api: ApiClient,
    auth: AuthContext,
}

impl Onboarding {
    #[must_use]
    pub fn new(api: ApiClient, auth: AuthContext) -> Self {
        Self { api, auth }
    }

    #[must_use]
    pub fn auth(&self) -> &AuthContext {
        &self.auth
    }

    /// Signs in. Admins land on the admin dashboard, everyone else on the
    /// dashboard (from where the gate may send them on to onboarding).
    ///
    /// # Errors
    /// Returns the inline message for the login form.
    #[instrument(skip_all)]
    pub async fn login(&self, credentials: &LoginCredentials) -> Result<Navigation, FlowError> {
        if !valid_email(credentials.email.trim()) {
            return Err(FlowError::new("Please enter a valid email"));
        }

        let response = self.api.login(credentials).await.map_err(|err| {
            warn!("Login failed: {err}");
            match err.status() {
                Some(401) => FlowError::new("Invalid credentials"),
                _ => FlowError::new(err.server_message().unwrap_or("Login failed")),
            }
        })?;

        let role = response.user.role;
        self.auth
            .login(&Credential::new(response.token), response.user)?;

        Ok(match role {
            Role::Admin => Navigation::to(ADMIN_DASHBOARD_PATH),
            Role::User => Navigation::to(DASHBOARD_PATH),
        })
    }

    /// Creates an account, signs in with the returned credential and heads to
    /// profile completion.
    ///
    /// # Errors
    /// Returns the inline message for the registration form.
    #[instrument(skip_all)]
    pub async fn register(
        &self,
        credentials: &RegisterCredentials,
    ) -> Result<Navigation, FlowError> {
        if !valid_email(credentials.email.trim()) {
            return Err(FlowError::new("Please enter a valid email"));
        }
        if credentials.name.trim().is_empty() {
            return Err(FlowError::new("Name is required"));
        }

        let response = self.api.register(credentials).await.map_err(|err| {
            warn!("Registration failed: {err}");
            FlowError::new(err.server_message().unwrap_or("Registration failed"))
        })?;

        self.auth
            .login(&Credential::new(response.token), response.user)?;

        Ok(Navigation::to(PROFILE_COMPLETION_PATH))
    }

    /// Saves the profile, merges it into the record and heads to the questionnaire.
    ///
    /// # Errors
    /// Returns the inline message for the profile form.
    #[instrument(skip_all)]
    pub async fn complete_profile(&self, form: &ProfileForm) -> Result<Navigation, FlowError> {
        let update = form.validate()?;
        let Some(mut user) = self.auth.current_user() else {
            return Err(AuthError::NotAuthenticated.into());
        };

        let response = self.api.update_profile(&update).await.map_err(|err| {
            warn!("Profile update failed: {err}");
            FlowError::new(err.server_message().unwrap_or("Failed to update profile"))
        })?;

        if let Some(token) = response.token {
            self.auth.replace_credential(&Credential::new(token))?;
        }
        user.profile
            .get_or_insert_with(Profile::default)
            .merge(response.profile);
        self.auth.update_user(user)?;

        Ok(Navigation::to(QUESTIONNAIRE_PATH))
    }

    /// Loads the questionnaire.
    ///
    /// # Errors
    /// Returns "Failed to load questions" on any API failure.
    #[instrument(skip_all)]
    pub async fn questions(&self) -> Result<BTreeMap<String, Question>, FlowError> {
        self.api.questions().await.map_err(|err: ApiError| {
            warn!("Loading questions failed: {err}");
            FlowError::new("Failed to load questions")
        })
    }

    /// Submits the answers, records the questionnaire on the user and heads to
    /// the dashboard. Returns the API's analysis alongside the navigation.
    ///
    /// # Errors
    /// Returns the inline message for the questionnaire form.
    #[instrument(skip_all)]
    pub async fn submit_questionnaire(
        &self,
        questions: &BTreeMap<String, Question>,
        answers: &BTreeMap<String, u8>,
    ) -> Result<(Navigation, QuestionnaireResponse), FlowError> {
        validate_answers(questions, answers)?;
        let Some(mut user) = self.auth.current_user() else {
            return Err(AuthError::NotAuthenticated.into());
        };

        let response = self.api.submit_questionnaire(answers).await.map_err(|err| {
            warn!("Questionnaire submission failed: {err}");
            FlowError::new("Failed to submit questionnaire")
        })?;

        if let Some(token) = &response.token {
            self.auth.replace_credential(&Credential::new(token.clone()))?;
        }
        user.questionnaire = Some(serde_json::json!({
            "id": response.questionnaire.id,
            "answers": answers,
            "mentalScore": response.questionnaire.mental_score,
            "recommendations": response.questionnaire.analysis.recommendations,
        }));
        self.auth.update_user(user)?;

        Ok((Navigation::to(DASHBOARD_PATH), response))
    }

    /// Signs out and heads to the login page.
    ///
    /// # Errors
    /// Returns a message if the credential could not be cleared; the user is
    /// signed out in memory regardless.
    pub fn logout(&self) -> Result<Navigation, FlowError> {
        Ok(Navigation::to(self.auth.logout()?))
    }
}
