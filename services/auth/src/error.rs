//! Error taxonomy of the authentication service
//!
//! Every failure is a value the caller can branch on. Storage failures stay
//! distinguishable from input problems so clients can tell "try again" from
//! "fix your input".

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use common::{authz::Forbidden, error::DatabaseError};
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Custom error type for the authentication service
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("The user already exists.")]
    DuplicateUser,

    #[error("Username must have from 3 to 20 characters and contain only letters or numbers.")]
    InvalidUsername,

    #[error(
        "Password must have from 8 to 24 characters and contain at least one upper letter, \
         one lower letter, one number, and one special character."
    )]
    InvalidPassword,

    #[error("Invalid username.")]
    UnknownUser,

    #[error("Invalid password.")]
    BadPassword,

    #[error("New password and confirmation do not match.")]
    PasswordMismatch,

    #[error("New password is the same as the old one.")]
    SameAsOldPassword,

    #[error("Unknown role: {0}")]
    InvalidRole(String),

    /// Missing, malformed or expired session token
    #[error("Unauthorized")]
    Unauthorized,

    #[error("Forbidden: {0}")]
    Forbidden(#[from] Forbidden),

    #[error("Password hashing failed: {0}")]
    Hashing(String),

    #[error("Storage failure: {0}")]
    StorageFailure(#[from] DatabaseError),
}

impl AuthError {
    /// Stable machine-readable name of the error
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::DuplicateUser => "duplicate_user",
            AuthError::InvalidUsername => "invalid_username",
            AuthError::InvalidPassword => "invalid_password",
            AuthError::UnknownUser => "unknown_user",
            AuthError::BadPassword => "bad_password",
            AuthError::PasswordMismatch => "password_mismatch",
            AuthError::SameAsOldPassword => "same_as_old_password",
            AuthError::InvalidRole(_) => "invalid_role",
            AuthError::Unauthorized => "unauthorized",
            AuthError::Forbidden(_) => "forbidden",
            AuthError::Hashing(_) => "hashing_failure",
            AuthError::StorageFailure(_) => "storage_failure",
        }
    }

    /// Whether the failure came from the caller's input rather than the system
    pub fn is_input_error(&self) -> bool {
        !matches!(self, AuthError::Hashing(_) | AuthError::StorageFailure(_))
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = match &self {
            AuthError::DuplicateUser => StatusCode::CONFLICT,
            AuthError::InvalidUsername
            | AuthError::InvalidPassword
            | AuthError::PasswordMismatch
            | AuthError::SameAsOldPassword
            | AuthError::InvalidRole(_) => StatusCode::BAD_REQUEST,
            AuthError::UnknownUser | AuthError::BadPassword | AuthError::Unauthorized => {
                StatusCode::UNAUTHORIZED
            }
            AuthError::Forbidden(_) => StatusCode::FORBIDDEN,
            AuthError::StorageFailure(e) if e.is_transient() => StatusCode::SERVICE_UNAVAILABLE,
            AuthError::Hashing(_) | AuthError::StorageFailure(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let message = if self.is_input_error() {
            self.to_string()
        } else {
            error!("{}", self);
            "Something went wrong on our side, please try again.".to_string()
        };

        let body = Json(json!({
            "error": message,
            "code": self.code(),
        }));

        (status, body).into_response()
    }
}

/// Type alias for authentication results
pub type AuthResult<T> = Result<T, AuthError>;

#[cfg(test)]
mod tests {
    use super::*;
    use common::authz::{Action, Role};

    #[test]
    fn test_status_codes() {
        assert_eq!(
            AuthError::DuplicateUser.into_response().status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AuthError::BadPassword.into_response().status(),
            StatusCode::UNAUTHORIZED
        );
        let forbidden = AuthError::from(Forbidden {
            role: Role::User,
            action: Action::ViewAllUsers,
        });
        assert_eq!(forbidden.into_response().status(), StatusCode::FORBIDDEN);
        assert_eq!(
            AuthError::StorageFailure(DatabaseError::Migration("boom".to_string()))
                .into_response()
                .status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_storage_failure_is_not_an_input_error() {
        assert!(AuthError::InvalidPassword.is_input_error());
        let storage = AuthError::StorageFailure(DatabaseError::Configuration("x".into()));
        assert!(!storage.is_input_error());
    }
}
