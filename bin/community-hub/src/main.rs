//! # Community Hub Binary
//!
//! The entry point that assembles the application based on compile-time features.

use std::io;
use std::sync::Arc;
use std::time::Duration;

use actix_web::{web, App, HttpServer};
use cm_api::handlers::AppState;
use cm_api::{configure_routes, middleware};
use cm_core::traits::CredentialProvider;
use configs::Settings;

#[cfg(feature = "db-sqlite")]
use cm_db_sqlite::{PoolSettings, SqliteRepo};

#[cfg(feature = "auth-jwt")]
use cm_auth_jwt::{HashingCost, JwtCredentialProvider};

#[cfg(not(all(feature = "db-sqlite", feature = "auth-jwt")))]
compile_error!("community-hub needs a storage plugin (db-sqlite) and a credential plugin (auth-jwt)");

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let settings = Settings::load().map_err(|e| {
        log::error!("{e}");
        io::Error::other(e)
    })?;

    // 1. Initialize Database Implementation
    let repo = SqliteRepo::connect(
        &settings.database.url,
        PoolSettings {
            max_connections: settings.database.max_connections,
            acquire_timeout: Duration::from_secs(settings.database.acquire_timeout_secs),
        },
    )
    .await
    .map_err(|e| {
        log::error!("failed to open database: {e:#}");
        io::Error::other(e)
    })?;
    let repo = Arc::new(repo);

    // 2. Initialize Credential Implementation
    let auth = &settings.auth;
    let credentials = JwtCredentialProvider::new(
        &auth.jwt_secret,
        chrono::Duration::days(auth.token_ttl_days),
        HashingCost {
            memory_kib: auth.argon2_memory_kib,
            iterations: auth.argon2_iterations,
            parallelism: auth.argon2_parallelism,
        },
    )
    .map_err(io::Error::other)?;
    let credentials: Arc<dyn CredentialProvider> = Arc::new(credentials);

    // 3. Wire services behind the ports
    let state = web::Data::new(AppState::new(repo.clone(), repo.clone(), credentials));

    let server_settings = settings.server.clone();
    let (host, port) = settings.bind_address();
    log::info!("Community Hub starting on http://{host}:{port}");

    let mut server = HttpServer::new(move || {
        App::new()
            .wrap(middleware::cors_policy(&server_settings.allowed_origins))
            .wrap(middleware::standard_middleware())
            .app_data(state.clone())
            .configure(configure_routes)
    })
    .client_request_timeout(Duration::from_secs(settings.server.client_request_timeout_secs));
    if let Some(workers) = settings.server.workers {
        server = server.workers(workers);
    }

    let outcome = server.bind((host, port))?.run().await;

    repo.close().await;
    log::info!("Community Hub stopped");
    outcome
}
