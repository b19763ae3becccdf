//! Mapping of application errors onto HTTP responses.

use crate::error::{AppError, ErrorClass};
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

/// Body of every error response: `{"error": {"code", "message"}}`.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

/// Wrapper to make AppError usable as an axum error response.
#[derive(Debug)]
pub struct ApiErr(pub AppError);

impl ApiErr {
    fn status(&self) -> StatusCode {
        match self.0.class() {
            ErrorClass::BadRequest => StatusCode::BAD_REQUEST,
            ErrorClass::Conflict => StatusCode::CONFLICT,
            ErrorClass::NotFound => StatusCode::NOT_FOUND,
            ErrorClass::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiErr {
    fn into_response(self) -> Response {
        let status = self.status();
        // Store details stay in the logs.
        let message = match self.0.class() {
            ErrorClass::Internal => "internal server error".to_string(),
            _ => self.0.to_string(),
        };

        (
            status,
            Json(ErrorBody {
                error: ErrorDetail {
                    code: self.0.code().to_string(),
                    message,
                },
            }),
        )
            .into_response()
    }
}

impl From<AppError> for ApiErr {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl From<JsonRejection> for ApiErr {
    fn from(rejection: JsonRejection) -> Self {
        Self(AppError::invalid_input(rejection.body_text()))
    }
}

impl From<QueryRejection> for ApiErr {
    fn from(rejection: QueryRejection) -> Self {
        Self(AppError::invalid_input(rejection.body_text()))
    }
}
