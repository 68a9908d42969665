use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::services::claim_validator::ValidationError;
use crate::services::draft::DraftError;
use crate::services::trade_engine::TradeError;
use crate::services::waiver_engine::ResolveError;

/// Everything a handler can fail with, mapped onto a status code.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Draft(#[from] DraftError),

    #[error(transparent)]
    Trade(#[from] TradeError),

    #[error("waiver run aborted: {0}")]
    Resolve(#[from] ResolveError),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Validation(ValidationError::NotTeamOwner) => StatusCode::FORBIDDEN,
            ApiError::Validation(ValidationError::DropNotOnTeam(_)) => StatusCode::NOT_FOUND,
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Draft(DraftError::NotYourTurn) => StatusCode::FORBIDDEN,
            ApiError::Draft(DraftError::PlayerTaken(_)) => StatusCode::CONFLICT,
            ApiError::Draft(_) | ApiError::Trade(_) => StatusCode::BAD_REQUEST,
            ApiError::Resolve(_)
            | ApiError::Database(_)
            | ApiError::Migration(_)
            | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!("Request failed: {}", self);
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
