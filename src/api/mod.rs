//! Typed client for the backend REST API. Every request carries the stored
//! bearer credential when one exists, uses one timeout policy, and maps
//! failures into [`ApiError`] with sanitized messages suitable for inline form
//! errors. Request bodies may contain passwords and must never be logged.

pub mod errors;
pub mod types;

pub use errors::ApiError;

use crate::{session::TokenStore, APP_USER_AGENT};
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::{de::DeserializeOwned, Serialize};
use std::{collections::BTreeMap, time::Duration};
use tracing::{debug, instrument};
use types::{
    AuthResponse, LoginBody, LoginCredentials, ProfileResponse, ProfileUpdate, Question,
    QuestionnaireBody, QuestionnaireResponse, RegisterBody, RegisterCredentials,
};
use url::Url;

/// Backend used when nothing else is configured.
pub const DEFAULT_API_URL: &str = "http://localhost:5000/api";

/// Default request timeout applied to every call.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Clone, Debug)]
pub struct ApiClient {
    client: Client,
    base_url: Url,
    tokens: TokenStore,
}

impl ApiClient {
    /// Build a client for `base_url` that authenticates from `tokens`.
    ///
    /// # Errors
    /// Returns [`ApiError::Config`] if the URL is invalid or the HTTP client
    /// cannot be created.
    pub fn new(base_url: &str, tokens: TokenStore) -> Result<Self, ApiError> {
        Self::with_timeout(base_url, tokens, DEFAULT_TIMEOUT)
    }

    /// # Errors
    /// See [`ApiClient::new`].
    pub fn with_timeout(
        base_url: &str,
        tokens: TokenStore,
        timeout: Duration,
    ) -> Result<Self, ApiError> {
        let base_url = parse_base_url(base_url)?;
        let client = Client::builder()
            .user_agent(APP_USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|err| ApiError::Config(format!("Error creating HTTP client: {err}")))?;

        Ok(Self {
            client,
            base_url,
            tokens,
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// `POST /auth/login`.
    ///
    /// # Errors
    /// Returns an error on network failure, non-2xx status, or an unexpected body.
    #[instrument(skip_all, fields(email = %credentials.email))]
    pub async fn login(&self, credentials: &LoginCredentials) -> Result<AuthResponse, ApiError> {
        self.send_json(Method::POST, "auth/login", Some(&LoginBody::from(credentials)))
            .await
    }

    /// `POST /auth/register`.
    ///
    /// # Errors
    /// Returns an error on network failure, non-2xx status, or an unexpected body.
    #[instrument(skip_all, fields(email = %credentials.email))]
    pub async fn register(
        &self,
        credentials: &RegisterCredentials,
    ) -> Result<AuthResponse, ApiError> {
        self.send_json(
            Method::POST,
            "auth/register",
            Some(&RegisterBody::from(credentials)),
        )
        .await
    }

    /// `PUT /profile`.
    ///
    /// # Errors
    /// Returns an error on network failure, non-2xx status, or an unexpected body.
    #[instrument(skip_all)]
    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<ProfileResponse, ApiError> {
        self.send_json(Method::PUT, "profile", Some(update)).await
    }

    /// `GET /questionnaire/questions`, keyed by question id.
    ///
    /// # Errors
    /// Returns an error on network failure, non-2xx status, or an unexpected body.
    #[instrument(skip_all)]
    pub async fn questions(&self) -> Result<BTreeMap<String, Question>, ApiError> {
        self.send_json::<(), _>(Method::GET, "questionnaire/questions", None)
            .await
    }

    /// `POST /questionnaire`.
    ///
    /// # Errors
    /// Returns an error on network failure, non-2xx status, or an unexpected body.
    #[instrument(skip_all, fields(answers = answers.len()))]
    pub async fn submit_questionnaire(
        &self,
        answers: &BTreeMap<String, u8>,
    ) -> Result<QuestionnaireResponse, ApiError> {
        self.send_json(
            Method::POST,
            "questionnaire",
            Some(&QuestionnaireBody { answers }),
        )
        .await
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|err| ApiError::Config(format!("Invalid endpoint {path}: {err}")))
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let builder = self.client.request(method, url);
        match self.tokens.get() {
            Some(credential) => builder.bearer_auth(credential.expose()),
            None => builder,
        }
    }

    async fn send_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<T, ApiError> {
        let url = self.endpoint(path)?;
        debug!("{method} {url}");

        let mut builder = self.request(method, url);
        if let Some(body) = body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        handle_json_response(response).await
    }
}

/// Parses JSON responses and surfaces HTTP errors with sanitized bodies.
async fn handle_json_response<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    let status = response.status();
    if status.is_success() {
        response
            .json::<T>()
            .await
            .map_err(|err| ApiError::Parse(format!("Failed to decode response: {err}")))
    } else {
        let body = response.text().await.unwrap_or_default();
        Err(ApiError::from_body(status.as_u16(), &body))
    }
}

/// Parses the base URL, forcing a trailing slash so relative joins keep the
/// path prefix (`/api`).
fn parse_base_url(base_url: &str) -> Result<Url, ApiError> {
    let trimmed = base_url.trim();
    if trimmed.is_empty() {
        return Err(ApiError::Config("API base URL is not configured.".to_string()));
    }
    let normalized = format!("{}/", trimmed.trim_end_matches('/'));
    Url::parse(&normalized)
        .map_err(|err| ApiError::Config(format!("Invalid API base URL {trimmed}: {err}")))
}
