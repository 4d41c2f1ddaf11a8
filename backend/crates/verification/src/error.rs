//! Verification Error Types
//!
//! Verification-specific error variants that integrate with the unified
//! `kernel::error::AppError` system.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use kernel::error::{app_error::AppError, kind::ErrorKind};
use thiserror::Error;

/// Verification-specific result type alias
pub type VerificationResult<T> = Result<T, VerificationError>;

/// The one message token holders ever see for a dead link.
pub const INVALID_LINK_MESSAGE: &str = "Verification link is invalid or has expired";

/// Verification-specific error variants
#[derive(Debug, Error)]
pub enum VerificationError {
    /// Item does not exist or is not owned by the caller
    #[error("Item not found")]
    ItemNotFound,

    #[error("Item is already verified")]
    AlreadyVerified,

    /// No user is registered under the verifier email
    #[error("Verifier not found")]
    VerifierNotFound,

    /// The resolved user exists but does not hold the VERIFIER role
    #[error("User is not a verifier")]
    NotAVerifier,

    /// Requester or verifier has no institute on record
    #[error("Institute affiliation is required for verification")]
    InstituteMissing,

    #[error("Verifier must belong to the same institute")]
    InstituteMismatch,

    #[error("A verification request is already pending for this item")]
    PendingRequestExists,

    /// Unknown token or verification id
    #[error("Verification request not found")]
    RequestNotFound,

    /// Request exists but `expires_at` has passed
    #[error("Verification request expired")]
    RequestExpired,

    /// Request has already reached APPROVED or REJECTED
    #[error("Verification request already decided")]
    AlreadyDecided,

    /// Request is live but its item has been deleted
    #[error("Verification request points at a missing item")]
    OrphanedRequest,

    #[error("You cannot verify your own item")]
    SelfVerification,

    #[error("{0}")]
    InvalidArgument(String),

    /// No usable identity on an authenticated route
    #[error("Authentication required")]
    Unauthenticated,

    /// Caller is not the owner of the verification request
    #[error("Not the owner of this verification request")]
    NotOwner,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl VerificationError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.kind().status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Get the ErrorKind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            VerificationError::ItemNotFound
            | VerificationError::RequestNotFound
            | VerificationError::RequestExpired
            | VerificationError::AlreadyDecided
            | VerificationError::OrphanedRequest => ErrorKind::NotFound,
            VerificationError::AlreadyVerified | VerificationError::PendingRequestExists => {
                ErrorKind::Conflict
            }
            VerificationError::InstituteMissing
            | VerificationError::InstituteMismatch
            | VerificationError::NotOwner => ErrorKind::Forbidden,
            VerificationError::VerifierNotFound
            | VerificationError::NotAVerifier
            | VerificationError::SelfVerification
            | VerificationError::InvalidArgument(_) => ErrorKind::BadRequest,
            VerificationError::Unauthenticated => ErrorKind::Unauthorized,
            VerificationError::Database(_) | VerificationError::Internal(_) => {
                ErrorKind::InternalServerError
            }
        }
    }

    /// Whether the error is about a token link (rendered opaquely)
    pub fn is_token_failure(&self) -> bool {
        matches!(
            self,
            VerificationError::RequestNotFound
                | VerificationError::RequestExpired
                | VerificationError::AlreadyDecided
                | VerificationError::OrphanedRequest
        )
    }

    /// Message safe to show to the caller
    pub fn public_message(&self) -> String {
        match self {
            e if e.is_token_failure() => INVALID_LINK_MESSAGE.to_string(),
            VerificationError::Database(_) | VerificationError::Internal(_) => {
                "Internal server error".to_string()
            }
            e => e.to_string(),
        }
    }

    /// Log the error with appropriate level
    fn log(&self) {
        match self {
            VerificationError::Database(e) => {
                tracing::error!(error = %e, "Verification database error");
            }
            VerificationError::Internal(msg) => {
                tracing::error!(message = %msg, "Verification internal error");
            }
            VerificationError::InstituteMismatch
            | VerificationError::InstituteMissing
            | VerificationError::NotOwner => {
                tracing::warn!(error = %self, "Verification access denied");
            }
            VerificationError::OrphanedRequest => {
                tracing::warn!(cause = %self, "Rejected verification link");
            }
            VerificationError::RequestNotFound
            | VerificationError::RequestExpired
            | VerificationError::AlreadyDecided => {
                tracing::info!(cause = %self, "Rejected verification link");
            }
            _ => {
                tracing::debug!(error = %self, "Verification error");
            }
        }
    }
}

impl From<VerificationError> for AppError {
    fn from(err: VerificationError) -> Self {
        let app_err = AppError::new(err.kind(), err.public_message());
        match err {
            VerificationError::PendingRequestExists => {
                app_err.with_action("Wait for the verifier to respond or withdraw the request")
            }
            VerificationError::VerifierNotFound | VerificationError::NotAVerifier => {
                app_err.with_action("Check the verifier email address")
            }
            e @ VerificationError::Database(_) => app_err.with_source(e),
            _ => app_err,
        }
    }
}

impl IntoResponse for VerificationError {
    fn into_response(self) -> Response {
        self.log();
        AppError::from(self).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_taxonomy_status_codes() {
        let cases = [
            (VerificationError::ItemNotFound, StatusCode::NOT_FOUND),
            (VerificationError::RequestExpired, StatusCode::NOT_FOUND),
            (VerificationError::AlreadyDecided, StatusCode::NOT_FOUND),
            (VerificationError::OrphanedRequest, StatusCode::NOT_FOUND),
            (VerificationError::AlreadyVerified, StatusCode::CONFLICT),
            (VerificationError::PendingRequestExists, StatusCode::CONFLICT),
            (VerificationError::InstituteMismatch, StatusCode::FORBIDDEN),
            (VerificationError::InstituteMissing, StatusCode::FORBIDDEN),
            (VerificationError::NotOwner, StatusCode::FORBIDDEN),
            (VerificationError::NotAVerifier, StatusCode::BAD_REQUEST),
            (VerificationError::VerifierNotFound, StatusCode::BAD_REQUEST),
            (VerificationError::SelfVerification, StatusCode::BAD_REQUEST),
            (VerificationError::Unauthenticated, StatusCode::UNAUTHORIZED),
            (
                VerificationError::Internal("boom".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(err.status_code(), status, "{err:?}");
        }
    }

    #[test]
    fn test_token_failures_share_one_message() {
        let messages: Vec<String> = [
            VerificationError::RequestNotFound,
            VerificationError::RequestExpired,
            VerificationError::AlreadyDecided,
            VerificationError::OrphanedRequest,
        ]
        .iter()
        .map(|e| e.public_message())
        .collect();
        assert!(messages.iter().all(|m| m == INVALID_LINK_MESSAGE));
        assert!(!VerificationError::ItemNotFound.is_token_failure());
    }

    #[test]
    fn test_internal_message_not_leaked() {
        let err = VerificationError::Internal("connection string xyz".into());
        assert_eq!(err.public_message(), "Internal server error");
        let app: AppError = err.into();
        assert_eq!(app.message(), "Internal server error");
    }

    #[test]
    fn test_conflict_carries_action() {
        let app: AppError = VerificationError::PendingRequestExists.into();
        assert_eq!(app.kind(), ErrorKind::Conflict);
        assert!(app.action().is_some());
    }
}
