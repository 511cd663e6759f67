use serde::Deserialize;
use thiserror::Error;

/// Maximum number of error body characters surfaced to the UI.
const MAX_ERROR_CHARS: usize = 200;

#[derive(Clone, Debug, Error)]
pub enum ApiError {
    #[error("Config error: {0}")]
    Config(String),
    #[error("Network error: {0}")]
    Network(String),
    #[error("Timeout: {0}")]
    Timeout(String),
    /// `message` is for logs; `server_message` holds only the JSON `message`
    /// the backend sent, which is safe to show next to a form.
    #[error("Request failed ({status}): {message}")]
    Http {
        status: u16,
        message: String,
        server_message: Option<String>,
    },
    #[error("Response error: {0}")]
    Parse(String),
}

impl ApiError {
    /// Builds an [`ApiError::Http`] from a failed response body.
    #[must_use]
    pub fn from_body(status: u16, body: &str) -> Self {
        let server_message = json_message(body).filter(|message| !message.is_empty());
        ApiError::Http {
            status,
            message: server_message
                .clone()
                .unwrap_or_else(|| sanitize_body(body)),
            server_message,
        }
    }

    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// JSON `message` the backend attached to a failed request, if any. Raw
    /// bodies (proxy error pages and the like) are never returned here.
    #[must_use]
    pub fn server_message(&self) -> Option<&str> {
        match self {
            ApiError::Http {
                server_message: Some(message),
                ..
            } => Some(message),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::Timeout("Request timed out. Please try again.".to_string())
        } else if err.is_decode() {
            ApiError::Parse(format!("Failed to decode response: {err}"))
        } else if err.is_builder() {
            ApiError::Config(format!("Failed to build request: {err}"))
        } else {
            ApiError::Network(format!("Unable to reach the server: {err}"))
        }
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

/// The JSON `message` field of an error body, trimmed and truncated.
fn json_message(body: &str) -> Option<String> {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(ErrorBody {
            message: Some(message),
        }) => Some(sanitize_body(&message)),
        _ => None,
    }
}

fn sanitize_body(body: &str) -> String {
    body.trim().chars().take(MAX_ERROR_CHARS).collect()
}
