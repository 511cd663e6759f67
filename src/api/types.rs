//! Request and response payloads exchanged with the backend API. Credentials
//! and passwords flow through some of these types, so they must never be
//! logged verbatim.

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    #[default]
    User,
    Admin,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub age: Option<i64>,
    #[serde(default)]
    pub gender: Option<String>,
}

impl Profile {
    /// A profile is complete when bio, age and gender are all filled in.
    /// An age of zero counts as missing.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        filled(self.bio.as_deref())
            && self.age.is_some_and(|age| age != 0)
            && filled(self.gender.as_deref())
    }

    /// Overlays the non-empty fields of `other` on top of this profile.
    pub fn merge(&mut self, other: Profile) {
        if other.id.is_some() {
            self.id = other.id;
        }
        if other.avatar.is_some() {
            self.avatar = other.avatar;
        }
        if other.bio.is_some() {
            self.bio = other.bio;
        }
        if other.age.is_some() {
            self.age = other.age;
        }
        if other.gender.is_some() {
            self.gender = other.gender;
        }
    }
}

fn filled(value: Option<&str>) -> bool {
    value.is_some_and(|value| !value.is_empty())
}

/// User record as returned by login/registration and mirrored in the token claims.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    #[serde(default)]
    pub name: String,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<Profile>,
    /// Presence marks the questionnaire as submitted; the shape is owned by the API.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub questionnaire: Option<serde_json::Value>,
}

impl User {
    #[must_use]
    pub fn profile_complete(&self) -> bool {
        self.profile.as_ref().is_some_and(Profile::is_complete)
    }

    #[must_use]
    pub fn questionnaire_complete(&self) -> bool {
        self.questionnaire.is_some()
    }
}

#[derive(Clone, Debug)]
pub struct LoginCredentials {
    pub email: String,
    pub password: SecretString,
}

#[derive(Clone, Debug)]
pub struct RegisterCredentials {
    pub email: String,
    pub password: SecretString,
    pub name: String,
    pub whatsapp_number: String,
}

/// Wire body for `/auth/login`; borrows the password only for serialization.
#[derive(Serialize)]
pub(crate) struct LoginBody<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

impl<'a> From<&'a LoginCredentials> for LoginBody<'a> {
    fn from(credentials: &'a LoginCredentials) -> Self {
        Self {
            email: &credentials.email,
            password: credentials.password.expose_secret(),
        }
    }
}

/// Wire body for `/auth/register`. Self-registration always requests `USER`.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RegisterBody<'a> {
    pub email: &'a str,
    pub password: &'a str,
    pub name: &'a str,
    pub whatsapp_number: &'a str,
    pub role: Role,
}

impl<'a> From<&'a RegisterCredentials> for RegisterBody<'a> {
    fn from(credentials: &'a RegisterCredentials) -> Self {
        Self {
            email: &credentials.email,
            password: credentials.password.expose_secret(),
            name: &credentials.name,
            whatsapp_number: &credentials.whatsapp_number,
            role: Role::User,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct AuthResponse {
    #[serde(default)]
    pub message: Option<String>,
    pub token: String,
    pub user: User,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
}

/// Profile returned by `PUT /profile`. Some deployments reissue the bearer
/// token alongside so the claims reflect the new profile.
#[derive(Clone, Debug, Deserialize)]
pub struct ProfileResponse {
    #[serde(flatten)]
    pub profile: Profile,
    #[serde(default)]
    pub token: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub question: String,
    /// Labels for the 1..=5 answer scale.
    pub scale: BTreeMap<String, String>,
}

#[derive(Clone, Debug, Serialize)]
pub(crate) struct QuestionnaireBody<'a> {
    pub answers: &'a BTreeMap<String, u8>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Analysis {
    pub overview: String,
    #[serde(default)]
    pub concerns: Vec<String>,
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub recommendations: Vec<String>,
    #[serde(default)]
    pub daily_activities: Vec<String>,
    #[serde(default)]
    pub professional_help_recommended: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionnaireResult {
    pub id: i64,
    pub mental_score: f64,
    pub analysis: Analysis,
    pub created_at: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pet {
    pub name: String,
    pub stage: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct QuestionnaireResponse {
    pub questionnaire: QuestionnaireResult,
    pub pet: Pet,
    #[serde(default)]
    pub token: Option<String>,
}
