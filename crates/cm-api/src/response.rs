//! JSON envelope and the mapping from domain errors to HTTP responses.
//!
//! Every reply, success or failure, has the shape
//! `{"status": <http code>, "message": ..., "data": {...}}`.

use std::fmt;

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use cm_core::error::AppError;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

#[derive(Debug, Serialize, Deserialize)]
pub struct Envelope {
    pub status: u16,
    pub message: String,
    pub data: Value,
}

/// Builds an enveloped JSON response. `data` should be a JSON object.
pub fn respond(status: StatusCode, message: &str, data: Value) -> HttpResponse {
    HttpResponse::build(status).json(Envelope {
        status: status.as_u16(),
        message: message.to_string(),
        data,
    })
}

/// HTTP-facing wrapper so `AppError` stays free of actix types.
#[derive(Debug)]
pub struct ApiError(pub AppError);

/// Convenient result alias for HTTP handlers.
pub type ApiResult<T> = Result<T, ApiError>;

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

fn status_for(err: &AppError) -> StatusCode {
    match err {
        AppError::Validation(_) => StatusCode::BAD_REQUEST,
        AppError::NotFound(..) => StatusCode::NOT_FOUND,
        AppError::AlreadyMember | AppError::Conflict(_) => StatusCode::CONFLICT,
        AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
        AppError::Forbidden(_) => StatusCode::FORBIDDEN,
        AppError::Storage(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        status_for(&self.0)
    }

    fn error_response(&self) -> HttpResponse {
        if self.0.is_internal() {
            log::error!("request failed: {:#}", self.0);
        } else {
            log::debug!("request rejected: {}", self.0);
        }
        let message = self.0.public_message();
        respond(self.status_code(), &message, json!({ "error": message }))
    }
}
