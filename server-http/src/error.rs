use crate::validation::{ValidationError, ValidationErrors};
use axum::{
    Json,
    extract::rejection::QueryRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use shared_http::api::ErrorResponse;
use tracing::error;

/// Error returned by every handler
#[derive(Debug)]
pub enum ApiError {
    Validation(ValidationErrors),
    Service(shared::Error),
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        ApiError::Validation(errors)
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::Validation(ValidationErrors::from(ValidationError::Malformed {
            reason: rejection.body_text(),
        }))
    }
}

impl From<shared::Error> for ApiError {
    fn from(err: shared::Error) -> Self {
        ApiError::Service(err)
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Service(err) => match err {
                shared::Error::InvalidRequest(_) => StatusCode::BAD_REQUEST,
                // Replay the upstream status when it is a real error status.
                shared::Error::UpstreamStatus { status, .. } => StatusCode::from_u16(*status)
                    .ok()
                    .filter(|s| s.is_client_error() || s.is_server_error())
                    .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        let body = match self {
            ApiError::Validation(errors) => {
                ErrorResponse::with_details("Invalid request", errors.details())
            }
            ApiError::Service(shared::Error::InvalidRequest(detail)) => {
                ErrorResponse::with_details("Invalid request", vec![detail])
            }
            ApiError::Service(shared::Error::UpstreamStatus { message, .. }) => {
                ErrorResponse::new(message)
            }
            ApiError::Service(err) => {
                if status.is_server_error() {
                    error!("Request failed: {}", err);
                }
                ErrorResponse::new(err.to_string())
            }
        };

        (status, Json(body)).into_response()
    }
}
