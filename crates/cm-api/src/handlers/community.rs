//! Community, announcement and event endpoints.
//!
//! Request bodies use camelCase keys (`communityId`, `eventId`, ...).
//! Identifiers are decoded as UUIDs, so a malformed id is a `400` before any
//! handler runs.

use actix_web::http::StatusCode;
use actix_web::{web, HttpResponse};
use cm_core::services::{EventUpdate, NewAnnouncement, NewCommunity, NewEvent};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use super::AppState;
use crate::middleware::AuthUser;
use crate::response::{respond, ApiResult};

#[derive(Debug, Deserialize)]
pub struct CreateCommunityRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub query: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MembershipRequest {
    pub community_id: Uuid,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAnnouncementRequest {
    pub community_id: Uuid,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub date: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteAnnouncementRequest {
    pub community_id: Uuid,
    pub announcement_id: Uuid,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEventRequest {
    pub community_id: Uuid,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub time: String,
    #[serde(default)]
    pub address: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteEventRequest {
    pub community_id: Uuid,
    pub event_id: Uuid,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEventRequest {
    pub community_id: Uuid,
    pub event_id: Uuid,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub time: String,
}

/// GET /community/get-all
pub async fn list_mine(data: web::Data<AppState>, AuthUser(claims): AuthUser) -> ApiResult<HttpResponse> {
    let result = data.communities.list_for_member(claims.user_id).await?;
    Ok(respond(
        StatusCode::OK,
        "Communities fetched successfully",
        json!({ "result": result }),
    ))
}

/// POST /community/create
pub async fn create(
    data: web::Data<AppState>,
    AuthUser(claims): AuthUser,
    body: web::Json<CreateCommunityRequest>,
) -> ApiResult<HttpResponse> {
    let body = body.into_inner();
    let id = data
        .communities
        .create(
            claims.user_id,
            NewCommunity {
                name: body.name,
                description: body.description,
            },
        )
        .await?;
    Ok(respond(StatusCode::CREATED, "Community created", json!({ "id": id })))
}

/// GET /community/search?query=
pub async fn search(data: web::Data<AppState>, params: web::Query<SearchQuery>) -> ApiResult<HttpResponse> {
    let result = data.communities.search(&params.query).await?;
    Ok(respond(StatusCode::OK, "Communities found", json!({ "result": result })))
}

/// POST /community/join
pub async fn join(
    data: web::Data<AppState>,
    AuthUser(claims): AuthUser,
    body: web::Json<MembershipRequest>,
) -> ApiResult<HttpResponse> {
    data.communities.join(body.community_id, claims.user_id).await?;
    Ok(respond(StatusCode::OK, "Successfully joined community", json!({})))
}

/// POST /community/leave
pub async fn leave(
    data: web::Data<AppState>,
    AuthUser(claims): AuthUser,
    body: web::Json<MembershipRequest>,
) -> ApiResult<HttpResponse> {
    data.communities.leave(body.community_id, claims.user_id).await?;
    Ok(respond(StatusCode::OK, "Successfully left the community", json!({})))
}

/// POST /community/announcement/create
pub async fn create_announcement(
    data: web::Data<AppState>,
    AuthUser(claims): AuthUser,
    body: web::Json<CreateAnnouncementRequest>,
) -> ApiResult<HttpResponse> {
    let body = body.into_inner();
    let id = data
        .communities
        .create_announcement(
            claims.user_id,
            NewAnnouncement {
                community_id: body.community_id,
                name: body.name,
                message: body.message,
                date: body.date,
            },
        )
        .await?;
    Ok(respond(StatusCode::CREATED, "Announcement created", json!({ "id": id })))
}

/// POST /community/announcement/delete
pub async fn delete_announcement(
    data: web::Data<AppState>,
    AuthUser(claims): AuthUser,
    body: web::Json<DeleteAnnouncementRequest>,
) -> ApiResult<HttpResponse> {
    data.communities
        .delete_announcement(body.community_id, body.announcement_id, claims.user_id)
        .await?;
    Ok(respond(StatusCode::OK, "Announcement deleted", json!({})))
}

/// POST /community/event/create
pub async fn create_event(
    data: web::Data<AppState>,
    AuthUser(claims): AuthUser,
    body: web::Json<CreateEventRequest>,
) -> ApiResult<HttpResponse> {
    let body = body.into_inner();
    let id = data
        .communities
        .create_event(
            claims.user_id,
            NewEvent {
                community_id: body.community_id,
                name: body.name,
                description: body.description,
                date: body.date,
                time: body.time,
                address: body.address,
            },
        )
        .await?;
    Ok(respond(StatusCode::CREATED, "Event created", json!({ "id": id })))
}

/// POST /community/event/delete
pub async fn delete_event(
    data: web::Data<AppState>,
    AuthUser(claims): AuthUser,
    body: web::Json<DeleteEventRequest>,
) -> ApiResult<HttpResponse> {
    data.communities
        .delete_event(body.community_id, body.event_id, claims.user_id)
        .await?;
    Ok(respond(StatusCode::OK, "Event deleted", json!({})))
}

/// POST /community/event/update
pub async fn update_event(
    data: web::Data<AppState>,
    AuthUser(claims): AuthUser,
    body: web::Json<UpdateEventRequest>,
) -> ApiResult<HttpResponse> {
    let body = body.into_inner();
    data.communities
        .update_event(
            claims.user_id,
            EventUpdate {
                community_id: body.community_id,
                event_id: body.event_id,
                name: body.name,
                description: body.description,
                date: body.date,
                time: body.time,
            },
        )
        .await?;
    Ok(respond(StatusCode::CREATED, "Event updated", json!({})))
}
