//! Error responses of the chair API
//!
//! Every failure is answered with a JSON body `{"error": "..."}`; validation
//! failures also list the offending fields.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use dccn_common::Error as CommonError;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing or malformed request data (400)
    #[error("{0}")]
    BadRequest(String),

    /// Acting user is not allowed here (403)
    #[error("{0}")]
    Forbidden(String),

    /// dccn-common error, classified on the way out
    #[error(transparent)]
    Common(#[from] CommonError),
}

impl From<sqlx::Error> for ApiError {
    fn from(e: sqlx::Error) -> Self {
        ApiError::Common(CommonError::Database(e))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, json!({ "error": msg })),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, json!({ "error": msg })),
            ApiError::Common(err) => {
                let status = match &err {
                    CommonError::NotFound(_) => StatusCode::NOT_FOUND,
                    CommonError::InvalidInput(_) => StatusCode::BAD_REQUEST,
                    CommonError::InvalidTransition { .. } => StatusCode::CONFLICT,
                    CommonError::PermissionDenied(_) => StatusCode::FORBIDDEN,
                    CommonError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
                    CommonError::Database(_)
                    | CommonError::Io(_)
                    | CommonError::Csv(_)
                    | CommonError::Config(_)
                    | CommonError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
                };
                if status == StatusCode::INTERNAL_SERVER_ERROR {
                    error!("Request failed: {}", err);
                }
                let body = match &err {
                    CommonError::Validation(fields) => json!({
                        "error": err.to_string(),
                        "fields": fields
                            .iter()
                            .map(|f| json!({ "field": f.field, "message": f.message }))
                            .collect::<Vec<_>>(),
                    }),
                    _ => json!({ "error": err.to_string() }),
                };
                (status, body)
            }
        };

        (status, Json(body)).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use dccn_common::error::FieldError;
    use dccn_common::model::SubmissionStatus;

    #[test]
    fn test_common_errors_map_to_statuses() {
        let cases = [
            (CommonError::not_found("submission", 3), StatusCode::NOT_FOUND),
            (CommonError::InvalidInput("bad".into()), StatusCode::BAD_REQUEST),
            (
                CommonError::InvalidTransition {
                    from: SubmissionStatus::Submitted,
                    to: SubmissionStatus::Published,
                },
                StatusCode::CONFLICT,
            ),
            (CommonError::PermissionDenied("no".into()), StatusCode::FORBIDDEN),
            (
                CommonError::Validation(vec![FieldError::new("details", "too short")]),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (CommonError::Internal("boom".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).into_response().status(), status);
        }
    }

    #[test]
    fn test_plain_variants() {
        assert_eq!(
            ApiError::BadRequest("x".into()).into_response().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::Forbidden("x".into()).into_response().status(),
            StatusCode::FORBIDDEN
        );
    }
}
