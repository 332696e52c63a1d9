use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use db::{
    DbErr,
    models::{job::JobError, member::MemberError, rank::RankError},
};
use deployment::DeploymentError;
use serde::Serialize;
use services::services::{job_payment::JobPaymentError, payout::PayoutError};
use thiserror::Error;
use utils::response::ApiResponse;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Rank(#[from] RankError),
    #[error(transparent)]
    Member(#[from] MemberError),
    #[error(transparent)]
    Job(#[from] JobError),
    #[error(transparent)]
    JobPayment(#[from] JobPaymentError),
    #[error(transparent)]
    Deployment(#[from] DeploymentError),
    #[error(transparent)]
    Database(#[from] DbErr),
    #[error("Invalid {0} id")]
    InvalidId(&'static str),
    #[error("{0}")]
    Validation(String),
    #[error("{field}: {message}")]
    InvalidField { field: String, message: String },
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl ApiError {
    fn status_and_type(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::Rank(err) => match err {
                RankError::RankNotFound | RankError::NoMatches { .. } => {
                    (StatusCode::NOT_FOUND, "RankError")
                }
                RankError::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "RankError"),
                RankError::DefaultRankProtected(_) => (StatusCode::BAD_REQUEST, "RankError"),
                RankError::Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, "RankError"),
            },
            ApiError::Member(err) => match err {
                MemberError::MemberNotFound => (StatusCode::NOT_FOUND, "MemberError"),
                MemberError::RankNotFound(_) | MemberError::Validation(_) => {
                    (StatusCode::UNPROCESSABLE_ENTITY, "MemberError")
                }
                MemberError::Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, "MemberError"),
            },
            ApiError::Job(err) => match err {
                JobError::JobNotFound | JobError::MemberNotFound(_) => {
                    (StatusCode::NOT_FOUND, "JobError")
                }
                JobError::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "JobError"),
                JobError::MemberHasDefaultRank { .. } => (StatusCode::BAD_REQUEST, "JobError"),
                JobError::Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, "JobError"),
            },
            ApiError::JobPayment(err) => match err {
                JobPaymentError::JobNotFound => (StatusCode::NOT_FOUND, "JobPaymentError"),
                JobPaymentError::NoMembersAssigned
                | JobPaymentError::MissingTotalPayment
                | JobPaymentError::Payout(PayoutError::NoMembersAssigned)
                | JobPaymentError::Payout(PayoutError::NegativeTotalPayment(_)) => {
                    (StatusCode::BAD_REQUEST, "JobPaymentError")
                }
                JobPaymentError::Database(_) => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "JobPaymentError")
                }
            },
            ApiError::Deployment(_) => (StatusCode::INTERNAL_SERVER_ERROR, "DeploymentError"),
            ApiError::Database(db_err) => match db_err {
                DbErr::RecordNotFound(_) => (StatusCode::NOT_FOUND, "DatabaseError"),
                _ => (StatusCode::INTERNAL_SERVER_ERROR, "DatabaseError"),
            },
            ApiError::InvalidId(_) => (StatusCode::BAD_REQUEST, "InvalidId"),
            ApiError::Validation(_) | ApiError::InvalidField { .. } => {
                (StatusCode::UNPROCESSABLE_ENTITY, "ValidationError")
            }
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NotFound"),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BadRequest"),
        }
    }
}

/// `error_data` of a request body rejected at a specific field.
#[derive(Debug, Serialize)]
struct FieldErrorData<'a> {
    field: &'a str,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status_code, error_type) = self.status_and_type();

        // Storage details stay in the logs.
        let error_message = if status_code.is_server_error() {
            tracing::error!(
                status = %status_code,
                error_type,
                error = %self,
                "API request failed"
            );
            "An error occurred while accessing the database".to_string()
        } else {
            match &self {
                ApiError::NotFound(msg) | ApiError::BadRequest(msg) => msg.clone(),
                _ => self.to_string(),
            }
        };

        match &self {
            ApiError::InvalidField { field, .. } => {
                let response = ApiResponse::<(), _>::error_with_data(
                    &error_message,
                    FieldErrorData {
                        field: field.as_str(),
                    },
                );
                (status_code, Json(response)).into_response()
            }
            _ => (status_code, Json(ApiResponse::<()>::error(&error_message))).into_response(),
        }
    }
}
