use actix_web::http::StatusCode;
use actix_web::{web, HttpResponse};
use cm_core::services::Registration;
use serde::Deserialize;
use serde_json::json;

use super::AppState;
use crate::middleware::AuthUser;
use crate::response::{respond, ApiResult};

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// POST /user/create
pub async fn create(
    data: web::Data<AppState>,
    body: web::Json<CreateUserRequest>,
) -> ApiResult<HttpResponse> {
    let body = body.into_inner();
    let id = data
        .users
        .register(Registration {
            name: body.name,
            email: body.email,
            password: body.password,
        })
        .await?;

    Ok(respond(StatusCode::CREATED, "User created", json!({ "id": id })))
}

/// POST /user/login
pub async fn login(data: web::Data<AppState>, body: web::Json<LoginRequest>) -> ApiResult<HttpResponse> {
    let token = data.users.login(&body.email, &body.password).await?;
    Ok(respond(StatusCode::OK, "Login successful", json!({ "token": token })))
}

/// GET /user/
pub async fn me(data: web::Data<AppState>, AuthUser(claims): AuthUser) -> ApiResult<HttpResponse> {
    let user = data.users.profile(claims.user_id).await?;
    Ok(respond(StatusCode::OK, "User fetched successfully", json!({ "user": user })))
}
