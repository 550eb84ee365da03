//! API error type, spec.md §7. Wraps [`RepositoryError`] plus the error
//! kinds the HTTP layer adds on top: a priority change rejected by
//! [`crate::engine::priority::check_changeable`] (`FrozenByState`), a
//! downstream dependency failure (`External`), and the scheduler exceeding
//! its time budget (`BudgetExceeded`).

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use crate::repository::RepositoryError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    InvariantViolation(String),
    #[error("{0}")]
    FrozenByState(String),
    #[error("{0}")]
    External(String),
    #[error("{0}")]
    BudgetExceeded(String),
    #[error("{0}")]
    Internal(String),
}

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
}

impl ApiError {
    fn kind(&self) -> &'static str {
        match self {
            ApiError::NotFound(_) => "not_found",
            ApiError::Conflict(_) => "conflict",
            ApiError::InvariantViolation(_) => "invariant_violation",
            ApiError::FrozenByState(_) => "frozen_by_state",
            ApiError::External(_) => "external",
            ApiError::BudgetExceeded(_) => "budget_exceeded",
            ApiError::Internal(_) => "internal",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::InvariantViolation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::FrozenByState(_) => StatusCode::CONFLICT,
            ApiError::External(_) => StatusCode::BAD_GATEWAY,
            ApiError::BudgetExceeded(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if matches!(self, ApiError::Internal(_)) {
            tracing::error!(error = %self, "internal api error");
        }
        let body = ErrorBody { error: self.kind(), message: self.to_string() };
        (self.status(), Json(body)).into_response()
    }
}

impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { entity, id } => ApiError::NotFound(format!("{entity} not found (id={id})")),
            RepositoryError::Conflict(msg) => ApiError::Conflict(msg),
            RepositoryError::InvariantViolation(msg) => ApiError::InvariantViolation(msg),
            RepositoryError::DatabaseError(msg) => ApiError::Internal(msg),
            RepositoryError::LockError(msg) => ApiError::Internal(msg),
            RepositoryError::Other(err) => ApiError::Internal(err.to_string()),
        }
    }
}

impl From<crate::engine::priority::PriorityEngineError> for ApiError {
    fn from(err: crate::engine::priority::PriorityEngineError) -> Self {
        match err {
            crate::engine::priority::PriorityEngineError::NotChangeable(msg) => ApiError::FrozenByState(msg),
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
