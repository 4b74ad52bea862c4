//! Unified error type and its HTTP mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use gatehouse_account::{AccountError, AccountField};
use gatehouse_session::AuthError;

use crate::config::ConfigError;
use crate::handler::DetailResponse;

/// Top-level error that wraps all crate-specific errors.
///
/// Handlers return this, and [`IntoResponse`] turns it into a status
/// code and a `{"detail": ...}` body. Each session-layer error maps to
/// exactly one status.
#[derive(Debug, thiserror::Error)]
pub enum GatehouseError {
    /// A session-layer error (conflict, bad credentials, no session...).
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// Startup configuration was invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Binding or serving the listener failed.
    #[error("server I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

impl GatehouseError {
    /// The HTTP status this error is reported with.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Auth(err) => match err {
                AuthError::Conflict(_) => StatusCode::CONFLICT,
                AuthError::Unauthorized | AuthError::Unauthenticated => {
                    StatusCode::UNAUTHORIZED
                }
                AuthError::Validation(_) => StatusCode::BAD_REQUEST,
                AuthError::Account(AccountError::Unavailable(_))
                | AuthError::Cache(_) => StatusCode::SERVICE_UNAVAILABLE,
                AuthError::Account(_) | AuthError::Hashing(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::Config(_) | Self::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The message sent to the client. Internal details stay in the logs.
    pub fn detail(&self) -> String {
        match self {
            Self::Auth(AuthError::Conflict(AccountField::Name)) => {
                "User with the same name already exists.".into()
            }
            Self::Auth(AuthError::Conflict(AccountField::Email)) => {
                "User with the same email address already exists.".into()
            }
            Self::Auth(AuthError::Unauthorized) => "Incorrect name or password.".into(),
            Self::Auth(AuthError::Unauthenticated) => "Not authenticated.".into(),
            Self::Auth(AuthError::Validation(msg)) => msg.clone(),
            _ if self.status() == StatusCode::SERVICE_UNAVAILABLE => {
                "Service temporarily unavailable.".into()
            }
            _ => "Internal server error.".into(),
        }
    }
}

impl IntoResponse for GatehouseError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(status = %status, error = %self, "server error");
        } else {
            tracing::warn!(status = %status, error = %self, "client error");
        }
        (status, Json(DetailResponse::new(self.detail()))).into_response()
    }
}
