//! # cm-auth-jwt
//!
//! Argon2 + HS256 implementation of `CredentialProvider`.
//! Handles password hashing for stored accounts and the bearer tokens that
//! carry a user's identity between requests.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use cm_core::error::{AppError, Result};
use cm_core::models::User;
use cm_core::traits::{Claims, CredentialProvider};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Argon2id cost parameters.
#[derive(Debug, Clone, Copy)]
pub struct HashingCost {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for HashingCost {
    fn default() -> Self {
        Self {
            memory_kib: Params::DEFAULT_M_COST,
            iterations: Params::DEFAULT_T_COST,
            parallelism: Params::DEFAULT_P_COST,
        }
    }
}

/// Wire claims. `id` is the user's UUID in string form.
#[derive(Debug, Serialize, Deserialize)]
struct TokenClaims {
    id: String,
    email: String,
    iat: i64,
    exp: i64,
}

pub struct JwtCredentialProvider {
    encoding: EncodingKey,
    decoding: DecodingKey,
    token_ttl: Duration,
    params: Params,
}

impl JwtCredentialProvider {
    pub fn new(secret: &SecretString, token_ttl: Duration, cost: HashingCost) -> anyhow::Result<Self> {
        let key = secret.expose_secret().as_bytes();
        if key.is_empty() {
            anyhow::bail!("token signing secret must not be empty");
        }
        let params = Params::new(cost.memory_kib, cost.iterations, cost.parallelism, None)
            .map_err(|e| anyhow::anyhow!("invalid argon2 parameters: {e}"))?;

        Ok(Self {
            encoding: EncodingKey::from_secret(key),
            decoding: DecodingKey::from_secret(key),
            token_ttl,
            params,
        })
    }

    fn hasher(params: Params) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
    }
}

#[async_trait]
impl CredentialProvider for JwtCredentialProvider {
    /// Hashes on the blocking pool; argon2 is CPU-bound.
    async fn hash_password(&self, password: &str) -> anyhow::Result<String> {
        let params = self.params.clone();
        let password = password.to_owned();
        tokio::task::spawn_blocking(move || {
            let salt = SaltString::generate(&mut OsRng);
            Self::hasher(params)
                .hash_password(password.as_bytes(), &salt)
                .map(|hash| hash.to_string())
                .map_err(|e| anyhow::anyhow!("argon2 hashing failed: {e}"))
        })
        .await?
    }

    /// Verifies if a provided password matches a stored Argon2 hash.
    async fn verify_password(&self, password: &str, hash: &str) -> bool {
        let password = password.to_owned();
        let hash = hash.to_owned();
        let outcome = tokio::task::spawn_blocking(move || {
            let parsed_hash = match PasswordHash::new(&hash) {
                Ok(p) => p,
                Err(_) => return false,
            };
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed_hash)
                .is_ok()
        })
        .await;

        outcome.unwrap_or_else(|e| {
            log::error!("password verification task failed: {e}");
            false
        })
    }

    fn issue_token(&self, user: &User) -> anyhow::Result<String> {
        let now = Utc::now();
        let claims = TokenClaims {
            id: user.id.to_string(),
            email: user.email.clone(),
            iat: now.timestamp(),
            exp: (now + self.token_ttl).timestamp(),
        };
        Ok(encode(&Header::new(jsonwebtoken::Algorithm::HS256), &claims, &self.encoding)?)
    }

    fn verify_token(&self, token: &str) -> Result<Claims> {
        let validation = Validation::new(jsonwebtoken::Algorithm::HS256);
        let data = decode::<TokenClaims>(token, &self.decoding, &validation).map_err(|e| {
            log::debug!("token rejected: {e}");
            AppError::Unauthorized("invalid or expired token".into())
        })?;

        let user_id = Uuid::parse_str(&data.claims.id)
            .map_err(|_| AppError::Unauthorized("invalid or expired token".into()))?;
        Ok(Claims {
            user_id,
            email: data.claims.email,
        })
    }
}
