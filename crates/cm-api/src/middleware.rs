//! Middleware and request extractors for Community Hub.
//!
//! Covers access logging, CORS, bearer-token authentication and the
//! uniform rejection of malformed bodies, queries and paths.

use std::future::{ready, Ready};

use actix_cors::Cors;
use actix_web::dev::Payload;
use actix_web::http::header::{self, HeaderName};
use actix_web::{web, FromRequest, HttpRequest};
use cm_core::error::AppError;
use cm_core::traits::Claims;

use crate::handlers::AppState;
use crate::response::ApiError;

/// One access line per request:
/// remote-ip "request-line" status-code response-size "referrer" "user-agent"
pub fn standard_middleware() -> actix_web::middleware::Logger {
    actix_web::middleware::Logger::default()
}

/// CORS policy. An empty origin list allows any origin.
pub fn cors_policy(allowed_origins: &[String]) -> Cors {
    let cors = if allowed_origins.is_empty() {
        Cors::default().allow_any_origin()
    } else {
        allowed_origins
            .iter()
            .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
    };

    cors.allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
        .allowed_headers(vec![
            header::ACCEPT,
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            HeaderName::from_static("x-csrf-token"),
        ])
        .expose_headers(vec![header::LINK])
        .max_age(300)
}

pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        ApiError(AppError::Validation(format!("invalid request body: {err}"))).into()
    })
}

pub fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|err, _req| {
        ApiError(AppError::Validation(format!("invalid query string: {err}"))).into()
    })
}

pub fn path_config() -> web::PathConfig {
    web::PathConfig::default().error_handler(|err, _req| {
        ApiError(AppError::Validation(format!("invalid path: {err}"))).into()
    })
}

/// The verified identity behind an `Authorization: Bearer <jwt>` header.
///
/// Handlers that take an `AuthUser` never run for unauthenticated requests;
/// extraction fails with `401` first.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Claims);

impl AuthUser {
    fn authenticate(req: &HttpRequest) -> Result<Self, ApiError> {
        let state = req
            .app_data::<web::Data<AppState>>()
            .ok_or_else(|| AppError::Internal("application state is not registered".into()))?;

        let token = req
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or_else(|| AppError::Unauthorized("missing bearer token".into()))?;

        Ok(Self(state.credentials.verify_token(token)?))
    }
}

impl FromRequest for AuthUser {
    type Error = ApiError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(Self::authenticate(req))
    }
}
