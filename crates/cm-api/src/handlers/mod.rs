//! # cm-api Handlers
//!
//! This module coordinates the flow between HTTP requests and the core
//! services. Handlers stay thin: decode, call one service method, envelope.

pub mod community;
pub mod user;

use std::sync::Arc;

use cm_core::services::{CommunityService, UserService};
use cm_core::traits::{CommunityRepo, CredentialProvider, UserRepo};

/// State shared across all Actix-web workers.
pub struct AppState {
    pub users: UserService,
    pub communities: CommunityService,
    /// Used by the `AuthUser` extractor to verify bearer tokens.
    pub credentials: Arc<dyn CredentialProvider>,
}

impl AppState {
    pub fn new(
        user_repo: Arc<dyn UserRepo>,
        community_repo: Arc<dyn CommunityRepo>,
        credentials: Arc<dyn CredentialProvider>,
    ) -> Self {
        Self {
            users: UserService::new(user_repo, credentials.clone()),
            communities: CommunityService::new(community_repo),
            credentials,
        }
    }
}
