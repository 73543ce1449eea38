//! Unified error types for the status service.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use strum::IntoStaticStr;
use thiserror::Error;

/// Unified error type for the status service.
#[derive(Error, Debug)]
pub enum ServiceError {
    /// Configuration loading or validation error.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Metrics recorder could not be installed.
    #[error("metrics error: {0}")]
    Metrics(#[from] metrics_exporter_prometheus::BuildError),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Startup configuration errors. All of them are fatal.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Environment variables could not be deserialized.
    #[error("invalid environment: {0}")]
    Env(#[from] envy::Error),

    /// The `.env` file could not be loaded outside production.
    #[error("error loading .env file: {0}")]
    EnvFile(#[from] dotenvy::Error),

    /// `AUTHORIZATION` is set but empty.
    #[error("AUTHORIZATION must not be empty")]
    MissingAuthorization,

    /// `LOCATION` does not name a known timezone.
    #[error("invalid location: {0}")]
    InvalidLocation(String),
}

/// Rejections from the update endpoints.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum UpdateError {
    /// `Authorization` header missing or wrong.
    #[error("Unauthorized.")]
    Unauthorized,

    /// Anything other than POST.
    #[error("Invalid request method.")]
    MethodNotAllowed,

    /// Body is not a valid `{"cancelled": bool}` document.
    #[error("Invalid request body.")]
    InvalidBody,
}

impl UpdateError {
    /// HTTP status for this rejection.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::InvalidBody => StatusCode::BAD_REQUEST,
        }
    }

    /// Short label for metrics.
    pub fn reason(&self) -> &'static str {
        self.into()
    }
}

impl IntoResponse for UpdateError {
    fn into_response(self) -> Response {
        (self.status_code(), self.to_string()).into_response()
    }
}

/// Convenient Result type alias.
pub type Result<T> = std::result::Result<T, ServiceError>;
