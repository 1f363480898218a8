use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use super::required;
use crate::error::{AppError, Result};
use crate::models::{User, UserProfile};
use crate::traits::{CredentialProvider, UserRepo};

/// Registration input as received from the edge.
#[derive(Debug, Clone)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Registration, login and "who am I" lookups.
pub struct UserService {
    repo: Arc<dyn UserRepo>,
    credentials: Arc<dyn CredentialProvider>,
}

impl UserService {
    pub fn new(repo: Arc<dyn UserRepo>, credentials: Arc<dyn CredentialProvider>) -> Self {
        Self { repo, credentials }
    }

    /// Validates, hashes and stores a new account. Returns its id.
    pub async fn register(&self, input: Registration) -> Result<Uuid> {
        let name = required("name", input.name)?;
        let email = normalize_email(&input.email)?;
        if input.password.is_empty() {
            return Err(AppError::Validation("password is required".into()));
        }

        if self.repo.find_user_by_email(&email).await?.is_some() {
            return Err(email_taken());
        }

        let password_hash = self
            .credentials
            .hash_password(&input.password)
            .await
            .map_err(|e| AppError::Internal(format!("password hashing failed: {e}")))?;
        let user = User {
            id: Uuid::now_v7(),
            name,
            email,
            password_hash,
            created_at: Utc::now(),
        };
        let id = user.id;
        // A concurrent registration may have claimed the email since the check above.
        if !self.repo.insert_user(user).await? {
            return Err(email_taken());
        }
        log::info!("registered user {id}");
        Ok(id)
    }

    /// Checks credentials and issues a token.
    ///
    /// Unknown emails and wrong passwords are indistinguishable to the caller.
    pub async fn login(&self, email: &str, password: &str) -> Result<String> {
        let email = email.trim().to_lowercase();
        let Some(user) = self.repo.find_user_by_email(&email).await? else {
            log::debug!("login rejected: unknown email");
            return Err(invalid_credentials());
        };
        if !self
            .credentials
            .verify_password(password, &user.password_hash)
            .await
        {
            log::debug!("login rejected: password mismatch for {}", user.id);
            return Err(invalid_credentials());
        }

        self.credentials
            .issue_token(&user)
            .map_err(|e| AppError::Internal(format!("token signing failed: {e}")))
    }

    /// Looks up the account behind a verified token claim.
    pub async fn profile(&self, user_id: Uuid) -> Result<UserProfile> {
        self.repo
            .find_user_by_id(user_id)
            .await?
            .map(UserProfile::from)
            .ok_or_else(|| AppError::NotFound("user", user_id.to_string()))
    }
}

fn email_taken() -> AppError {
    AppError::Conflict("email already registered".into())
}

fn invalid_credentials() -> AppError {
    AppError::Unauthorized("invalid credentials".into())
}

/// Trims and lowercases an email, rejecting anything not shaped like
/// `local@domain.tld`.
fn normalize_email(raw: &str) -> Result<String> {
    let email = raw.trim().to_lowercase();
    let invalid = || AppError::Validation("email is not a valid address".into());

    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
    let well_formed = !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !email.chars().any(char::is_whitespace);
    if !well_formed {
        return Err(invalid());
    }
    Ok(email)
}
