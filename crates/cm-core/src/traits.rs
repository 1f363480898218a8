//! # Core Traits (Ports)
//!
//! Any plugin must implement these traits to be used by the binary.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;
use crate::models::{Community, User};
use crate::updates::CommunityUpdate;

/// Data persistence contract for user accounts.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait UserRepo: Send + Sync {
    /// Stores a new user. Returns `false`, storing nothing, when the email
    /// is already taken.
    async fn insert_user(&self, user: User) -> anyhow::Result<bool>;
    async fn find_user_by_email(&self, email: &str) -> anyhow::Result<Option<User>>;
    async fn find_user_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>>;
}

/// Data persistence contract for community aggregates.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait CommunityRepo: Send + Sync {
    async fn insert_community(&self, community: Community) -> anyhow::Result<()>;
    async fn get_community(&self, id: Uuid) -> anyhow::Result<Option<Community>>;

    /// All communities whose member list contains `user_id`, oldest first.
    async fn list_by_member(&self, user_id: Uuid) -> anyhow::Result<Vec<Community>>;

    /// Communities whose name contains `query`, ASCII case-insensitive,
    /// oldest first. An empty query matches every community.
    async fn search_by_name(&self, query: &str) -> anyhow::Result<Vec<Community>>;

    /// Applies one operator to one community atomically.
    /// Returns `true` when the document was modified; `false` when the
    /// community is absent or the operator's guard did not hold.
    async fn apply(&self, community_id: Uuid, update: CommunityUpdate) -> anyhow::Result<bool>;
}

/// Verified identity extracted from a bearer token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Claims {
    pub user_id: Uuid,
    pub email: String,
}

/// Password hashing and token issuance contract.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    /// Produces a salted, slow hash suitable for storage.
    async fn hash_password(&self, password: &str) -> anyhow::Result<String>;

    /// Checks a password against a stored hash. Malformed hashes never match.
    async fn verify_password(&self, password: &str, hash: &str) -> bool;

    /// Issues a signed, expiring token carrying the user's id and email.
    fn issue_token(&self, user: &User) -> anyhow::Result<String>;

    /// Verifies signature and expiry. Any failure is `Unauthorized`.
    fn verify_token(&self, token: &str) -> Result<Claims>;
}
