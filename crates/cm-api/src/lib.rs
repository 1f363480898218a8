//! # cm-api
//!
//! The web routing and orchestration layer for Community Hub.

pub mod handlers;
pub mod middleware;
pub mod response;

use actix_web::web;

use handlers::{community, user};

/// Configures the routes and extractor settings for the service.
///
/// Body, query and path rejections are registered here so every mount point
/// answers them with the same envelope.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(middleware::json_config())
        .app_data(middleware::query_config())
        .app_data(middleware::path_config())
        .service(
            web::scope("/user")
                .route("/create", web::post().to(user::create))
                .route("/login", web::post().to(user::login))
                .route("/", web::get().to(user::me))
                .route("", web::get().to(user::me)),
        )
        .service(
            web::scope("/community")
                .route("/create", web::post().to(community::create))
                .route("/get-all", web::get().to(community::list_mine))
                .route("/search", web::get().to(community::search))
                .route("/join", web::post().to(community::join))
                .route("/leave", web::post().to(community::leave))
                .service(
                    web::scope("/announcement")
                        .route("/create", web::post().to(community::create_announcement))
                        .route("/delete", web::post().to(community::delete_announcement)),
                )
                .service(
                    web::scope("/event")
                        .route("/create", web::post().to(community::create_event))
                        .route("/delete", web::post().to(community::delete_event))
                        .route("/update", web::post().to(community::update_event)),
                ),
        );
}
