use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

#[derive(Debug, Clone, PartialEq)]
pub enum AppError {
    NotFound(String),
    Unauthenticated(String),
    BadRequest(String),
    /// Failure reported by the identity provider, document store or blob store.
    /// `code` follows the provider's `service/reason` convention.
    Provider { code: String, message: String },
    Network(String),
    Internal(String),
}

impl AppError {
    pub fn provider(code: impl Into<String>, message: impl Into<String>) -> Self {
        AppError::Provider {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn not_authenticated() -> Self {
        AppError::Unauthenticated("User not authenticated".to_string())
    }

    /// Provider code, if any.
    pub fn code(&self) -> Option<&str> {
        match self {
            AppError::Provider { code, .. } => Some(code),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        match self {
            AppError::NotFound(_) => true,
            AppError::Provider { code, .. } => code.ends_with("not-found"),
            _ => false,
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Provider { code, .. } => provider_status(code),
            AppError::Network(_) => StatusCode::BAD_GATEWAY,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

fn provider_status(code: &str) -> StatusCode {
    match code {
        "auth/invalid-credential"
        | "auth/user-not-found"
        | "auth/wrong-password"
        | "auth/user-disabled"
        | "auth/user-token-expired"
        | "auth/invalid-user-token" => StatusCode::UNAUTHORIZED,
        "auth/email-already-in-use" => StatusCode::CONFLICT,
        "auth/weak-password" | "auth/invalid-email" | "auth/missing-password" => {
            StatusCode::BAD_REQUEST
        }
        "auth/too-many-requests" => StatusCode::TOO_MANY_REQUESTS,
        c if c.ends_with("permission-denied") || c.ends_with("unauthorized") => {
            StatusCode::FORBIDDEN
        }
        c if c.ends_with("not-found") => StatusCode::NOT_FOUND,
        _ => StatusCode::BAD_GATEWAY,
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AppError::NotFound(msg) => write!(f, "{msg}"),
            AppError::Unauthenticated(msg) => write!(f, "{msg}"),
            AppError::BadRequest(msg) => write!(f, "{msg}"),
            AppError::Provider { code, message } => write!(f, "{message} ({code})"),
            AppError::Network(msg) => write!(f, "Network error: {msg}"),
            AppError::Internal(msg) => write!(f, "Internal error: {msg}"),
        }
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            AppError::Provider { code, message } => json!({ "error": message, "code": code }),
            AppError::Network(msg) => {
                tracing::error!("Upstream network error: {msg}");
                json!({ "error": "Backend service unavailable" })
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {msg}");
                json!({ "error": "Internal server error" })
            }
            other => json!({ "error": other.to_string() }),
        };

        (status, axum::Json(body)).into_response()
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::Network(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Internal(format!("Malformed document: {err}"))
    }
}
