//! Community Error Types
//!
//! Community-specific error variants that integrate with the unified
//! `kernel::error::AppError` system. Each variant carries a stable `code` so
//! clients can tell *why* a request was refused.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use derive_more::Display;
use kernel::error::{app_error::AppError, kind::ErrorKind};
use thiserror::Error;

use crate::domain::policy::Denial;
use crate::domain::value_object::{EmailError, UserNameError};

pub type CommunityResult<T> = Result<T, CommunityError>;

/// Resource that was looked up and not found
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Resource {
    #[display("User")]
    User,
    #[display("Post")]
    Post,
    #[display("Category")]
    Category,
}

/// Why a write conflicts with current state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum ConflictReason {
    #[display("Username already taken")]
    UserNameTaken,
    #[display("Email already taken")]
    EmailTaken,
    #[display("User is not banned")]
    NotBanned,
}

impl ConflictReason {
    pub const fn code(&self) -> &'static str {
        match self {
            ConflictReason::UserNameTaken => "user_name_taken",
            ConflictReason::EmailTaken => "email_taken",
            ConflictReason::NotBanned => "not_banned",
        }
    }
}

#[derive(Debug, Error)]
pub enum CommunityError {
    /// No valid session
    #[error("Please sign in")]
    Unauthenticated,

    /// Token failed verification
    #[error("Invalid session token")]
    InvalidToken,

    /// Unknown identity or wrong password
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Authenticated but refused by policy
    #[error("{0}")]
    Forbidden(Denial),

    #[error("{0} not found")]
    NotFound(Resource),

    #[error("{0}")]
    Conflict(ConflictReason),

    /// Missing or malformed input
    #[error("{0}")]
    Validation(String),

    /// Well-formed request the domain does not allow (e.g. self-follow)
    #[error("{0}")]
    InvalidOperation(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CommunityError {
    pub fn validation(message: impl Into<String>) -> Self {
        CommunityError::Validation(message.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            CommunityError::Unauthenticated
            | CommunityError::InvalidToken
            | CommunityError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            CommunityError::Forbidden(_) => StatusCode::FORBIDDEN,
            CommunityError::NotFound(_) => StatusCode::NOT_FOUND,
            CommunityError::Conflict(_) => StatusCode::CONFLICT,
            CommunityError::Validation(_) | CommunityError::InvalidOperation(_) => {
                StatusCode::BAD_REQUEST
            }
            CommunityError::Database(_) | CommunityError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            CommunityError::Unauthenticated
            | CommunityError::InvalidToken
            | CommunityError::InvalidCredentials => ErrorKind::Unauthorized,
            CommunityError::Forbidden(_) => ErrorKind::Forbidden,
            CommunityError::NotFound(_) => ErrorKind::NotFound,
            CommunityError::Conflict(_) => ErrorKind::Conflict,
            CommunityError::Validation(_) | CommunityError::InvalidOperation(_) => {
                ErrorKind::BadRequest
            }
            CommunityError::Database(_) | CommunityError::Internal(_) => {
                ErrorKind::InternalServerError
            }
        }
    }

    /// Stable machine-readable cause
    pub fn code(&self) -> &'static str {
        match self {
            CommunityError::Unauthenticated => "unauthenticated",
            CommunityError::InvalidToken => "invalid_token",
            CommunityError::InvalidCredentials => "invalid_credentials",
            CommunityError::Forbidden(denial) => denial.code(),
            CommunityError::NotFound(Resource::User) => "user_not_found",
            CommunityError::NotFound(Resource::Post) => "post_not_found",
            CommunityError::NotFound(Resource::Category) => "category_not_found",
            CommunityError::Conflict(reason) => reason.code(),
            CommunityError::Validation(_) => "validation",
            CommunityError::InvalidOperation(_) => "invalid_operation",
            CommunityError::Database(_) | CommunityError::Internal(_) => "internal",
        }
    }

    pub fn to_app_error(&self) -> AppError {
        // Server-side details stay in the logs.
        let message = match self {
            CommunityError::Database(_) | CommunityError::Internal(_) => {
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };
        AppError::new(self.kind(), message).with_code(self.code())
    }

    fn log(&self) {
        match self {
            CommunityError::Database(e) => {
                tracing::error!(error = %e, "Community database error");
            }
            CommunityError::Internal(msg) => {
                tracing::error!(message = %msg, "Community internal error");
            }
            CommunityError::InvalidCredentials => {
                tracing::warn!("Invalid login attempt");
            }
            CommunityError::Forbidden(denial) => {
                tracing::warn!(denial = %denial, "Request refused by policy");
            }
            _ => {
                tracing::debug!(error = %self, "Community error");
            }
        }
    }
}

impl IntoResponse for CommunityError {
    fn into_response(self) -> Response {
        self.log();
        self.to_app_error().into_response()
    }
}

impl From<AppError> for CommunityError {
    fn from(err: AppError) -> Self {
        CommunityError::Internal(err.to_string())
    }
}

impl From<Denial> for CommunityError {
    fn from(denial: Denial) -> Self {
        match denial {
            Denial::NotBanned => CommunityError::Conflict(ConflictReason::NotBanned),
            other => CommunityError::Forbidden(other),
        }
    }
}

impl From<UserNameError> for CommunityError {
    fn from(err: UserNameError) -> Self {
        CommunityError::Validation(err.to_string())
    }
}

impl From<EmailError> for CommunityError {
    fn from(err: EmailError) -> Self {
        CommunityError::Validation(err.to_string())
    }
}

impl From<platform::password::PasswordPolicyError> for CommunityError {
    fn from(err: platform::password::PasswordPolicyError) -> Self {
        CommunityError::Validation(err.to_string())
    }
}

impl From<platform::password::PasswordHashError> for CommunityError {
    fn from(err: platform::password::PasswordHashError) -> Self {
        CommunityError::Internal(err.to_string())
    }
}

impl From<kernel::id::ParseIdError> for CommunityError {
    fn from(err: kernel::id::ParseIdError) -> Self {
        CommunityError::Validation(err.to_string())
    }
}
