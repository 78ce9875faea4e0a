use axum::{
    Json,
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

use review_types::api::{ErrorBody, ErrorResponse};

/// Coarse classification of a [`ReviewError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Conflict,
    Internal,
}

/// Every way a team, user or pull request operation can fail.
#[derive(Debug, Error)]
pub enum ReviewError {
    #[error("invalid request: {0}")]
    Validation(String),

    #[error("team not found: {0}")]
    TeamNotFound(String),

    #[error("user not found: {0}")]
    UserNotFound(String),

    #[error("author not found: {0}")]
    AuthorNotFound(String),

    #[error("pull request not found: {0}")]
    PrNotFound(String),

    #[error("team already exists: {0}")]
    TeamExists(String),

    #[error("pull request already exists: {0}")]
    PrExists(String),

    #[error("pull request {0} is merged")]
    PrMerged(String),

    #[error("reviewer {reviewer} is not assigned to pull request {pr_id}")]
    NotAssigned { pr_id: String, reviewer: String },

    #[error("no active replacement candidate in team {0}")]
    NoCandidate(String),

    #[error("pull request {0} changed during reassignment, retry")]
    ReassignConflict(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ReviewError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ReviewError::Validation(_) => ErrorKind::Validation,
            ReviewError::TeamNotFound(_)
            | ReviewError::UserNotFound(_)
            | ReviewError::AuthorNotFound(_)
            | ReviewError::PrNotFound(_) => ErrorKind::NotFound,
            ReviewError::TeamExists(_)
            | ReviewError::PrExists(_)
            | ReviewError::PrMerged(_)
            | ReviewError::NotAssigned { .. }
            | ReviewError::NoCandidate(_)
            | ReviewError::ReassignConflict(_) => ErrorKind::Conflict,
            ReviewError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Stable machine-readable code sent to clients.
    pub fn code(&self) -> &'static str {
        match self {
            ReviewError::Validation(_) => "INVALID_REQUEST",
            ReviewError::TeamNotFound(_)
            | ReviewError::UserNotFound(_)
            | ReviewError::AuthorNotFound(_)
            | ReviewError::PrNotFound(_) => "NOT_FOUND",
            ReviewError::TeamExists(_) => "TEAM_EXISTS",
            ReviewError::PrExists(_) => "PR_EXISTS",
            ReviewError::PrMerged(_) => "PR_MERGED",
            ReviewError::NotAssigned { .. } => "NOT_ASSIGNED",
            ReviewError::NoCandidate(_) => "NO_CANDIDATE",
            ReviewError::ReassignConflict(_) => "REASSIGN_CONFLICT",
            ReviewError::Internal(_) => "INTERNAL",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            // Duplicate team names are reported as a bad request, not a conflict
            ReviewError::Validation(_) | ReviewError::TeamExists(_) => StatusCode::BAD_REQUEST,
            ReviewError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => match self.kind() {
                ErrorKind::NotFound => StatusCode::NOT_FOUND,
                _ => StatusCode::CONFLICT,
            },
        }
    }
}

impl From<JsonRejection> for ReviewError {
    fn from(rejection: JsonRejection) -> Self {
        ReviewError::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for ReviewError {
    fn from(rejection: QueryRejection) -> Self {
        ReviewError::Validation(rejection.body_text())
    }
}

impl IntoResponse for ReviewError {
    fn into_response(self) -> Response {
        let message = match &self {
            ReviewError::Internal(e) => {
                error!("Internal error: {:#}", e);
                "internal error".to_string()
            }
            other => other.to_string(),
        };

        let body = ErrorResponse {
            error: ErrorBody {
                code: self.code().to_string(),
                message,
            },
        };
        (self.status(), Json(body)).into_response()
    }
}
