use crate::core::MatchError;
use crate::models::ErrorResponse;
use crate::services::{DirectoryError, LedgerError};
use actix_web::{error, http::StatusCode, HttpRequest, HttpResponse, ResponseError};
use thiserror::Error;

/// Error surfaced by the HTTP layer
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Interaction already recorded")]
    DuplicateInteraction,

    #[error("Cannot interact with yourself")]
    SelfInteraction,

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Unknown party: {0}")]
    UnknownParty(String),

    #[error("Persistence failure: {0}")]
    Persistence(String),

    #[error("Directory unavailable: {0}")]
    Directory(String),
}

impl ApiError {
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Validation(_) => "ValidationFailed",
            ApiError::DuplicateInteraction => "DuplicateInteraction",
            ApiError::SelfInteraction => "SelfInteraction",
            ApiError::Unauthorized(_) => "Unauthorized",
            ApiError::UnknownParty(_) => "UnknownParty",
            ApiError::Persistence(_) => "PersistenceFailure",
            ApiError::Directory(_) => "DirectoryUnavailable",
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::DuplicateInteraction | ApiError::SelfInteraction => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::UnknownParty(_) => StatusCode::NOT_FOUND,
            ApiError::Persistence(_) | ApiError::Directory(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("{}", self);
        }

        HttpResponse::build(status).json(ErrorResponse {
            error: self.code().to_string(),
            message: self.to_string(),
            status_code: status.as_u16(),
        })
    }
}

impl From<MatchError> for ApiError {
    fn from(err: MatchError) -> Self {
        match err {
            MatchError::DuplicateInteraction { .. } => ApiError::DuplicateInteraction,
            MatchError::SelfInteraction => ApiError::SelfInteraction,
            MatchError::UnknownParty(id) => ApiError::UnknownParty(id),
            MatchError::Persistence(e) => ApiError::Persistence(e.to_string()),
            MatchError::Directory(e) => ApiError::Directory(e.to_string()),
        }
    }
}

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        ApiError::from(MatchError::from(err))
    }
}

impl From<DirectoryError> for ApiError {
    fn from(err: DirectoryError) -> Self {
        match err {
            DirectoryError::NotFound(what) => ApiError::UnknownParty(what),
            other => ApiError::Directory(other.to_string()),
        }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        ApiError::Validation(errors.to_string())
    }
}

/// Handle JSON payload errors
pub fn handle_json_payload_error(err: error::JsonPayloadError, req: &HttpRequest) -> actix_web::Error {
    tracing::info!("JSON payload error on {}: {}", req.path(), err);
    ApiError::Validation(format!("Invalid JSON: {}", err)).into()
}

/// Handle query payload errors
pub fn handle_query_payload_error(err: error::QueryPayloadError, req: &HttpRequest) -> actix_web::Error {
    tracing::info!("Query payload error on {}: {}", req.path(), err);
    ApiError::Validation(format!("Invalid query: {}", err)).into()
}
