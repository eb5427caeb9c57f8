//! # JWT identity gate
//!
//! Bearer credentials are HS256 tokens whose `sub` is the user id.
//! The token only proves who the caller is: the role is re-read from the
//! user record on every request so that role changes apply immediately.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use domains::{DomainError, DomainResult, Identity, IdentityGate, User, UserRepository};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{debug, error};
use uuid::Uuid;

const MAX_TTL_SECS: u64 = 10 * 365 * 24 * 3600;

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    email: String,
    iat: i64,
    exp: i64,
}

pub struct JwtIdentityGate {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    users: Arc<dyn UserRepository>,
    ttl: Duration,
}

impl JwtIdentityGate {
    pub fn new(secret: &SecretString, users: Arc<dyn UserRepository>, ttl_secs: u64) -> Self {
        let bytes = secret.expose_secret().as_bytes();
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_required_spec_claims(&["exp", "sub"]);
        Self {
            encoding: EncodingKey::from_secret(bytes),
            decoding: DecodingKey::from_secret(bytes),
            validation,
            users,
            ttl: Duration::seconds(ttl_secs.min(MAX_TTL_SECS) as i64),
        }
    }

    /// Signs a bearer token for `user`, valid for the configured TTL.
    pub fn issue(&self, user: &User) -> DomainResult<String> {
        let now = Utc::now();
        self.sign(&Claims {
            sub: user.id.to_string(),
            email: user.email.clone(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        })
    }

    fn sign(&self, claims: &Claims) -> DomainResult<String> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding).map_err(|err| {
            error!(error = %err, "failed to sign token");
            DomainError::Internal("token signing failed".into())
        })
    }
}

#[async_trait]
impl IdentityGate for JwtIdentityGate {
    async fn resolve(&self, credential: &str) -> DomainResult<Identity> {
        let data = decode::<Claims>(credential, &self.decoding, &self.validation).map_err(|err| {
            debug!(error = %err, "rejected bearer token");
            DomainError::Unauthenticated
        })?;
        let user_id: Uuid = data
            .claims
            .sub
            .parse()
            .map_err(|_| DomainError::Unauthenticated)?;

        // A deleted user keeps a validly signed token until it expires.
        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or(DomainError::Unauthenticated)?;

        Ok(Identity {
            user_id: user.id,
            email: user.email,
            role: user.role,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domains::{MockUserRepository, Role};

    fn gate_with(user: Option<User>) -> JwtIdentityGate {
        let mut users = MockUserRepository::new();
        users
            .expect_find_by_id()
            .returning(move |_| Ok(user.clone()));
        JwtIdentityGate::new(&SecretString::from("test-secret".to_string()), Arc::new(users), 3600)
    }

    #[tokio::test]
    async fn issued_token_resolves_to_current_role() {
        let mut user = User::new("Mod", "mod@example.test", Role::Author);
        let token = gate_with(None).issue(&user).unwrap();

        // The stored role changed after the token was issued.
        user.role = Role::Moderator;
        let identity = gate_with(Some(user.clone())).resolve(&token).await.unwrap();
        assert_eq!(identity.user_id, user.id);
        assert_eq!(identity.role, Role::Moderator);
    }

    #[tokio::test]
    async fn deleted_user_is_unauthenticated() {
        let user = User::new("Gone", "gone@example.test", Role::Reader);
        let gate = gate_with(None);
        let token = gate.issue(&user).unwrap();
        assert_eq!(gate.resolve(&token).await.unwrap_err(), DomainError::Unauthenticated);
    }

    #[tokio::test]
    async fn expired_token_is_unauthenticated() {
        let user = User::new("Old", "old@example.test", Role::Reader);
        let gate = gate_with(Some(user.clone()));
        let past = Utc::now() - Duration::hours(2);
        let token = gate
            .sign(&Claims {
                sub: user.id.to_string(),
                email: user.email.clone(),
                iat: past.timestamp(),
                exp: (past + Duration::minutes(5)).timestamp(),
            })
            .unwrap();
        assert_eq!(gate.resolve(&token).await.unwrap_err(), DomainError::Unauthenticated);
    }

    #[tokio::test]
    async fn token_signed_with_another_secret_is_rejected() {
        let user = User::new("Eve", "eve@example.test", Role::Admin);
        let forged = JwtIdentityGate::new(
            &SecretString::from("other-secret".to_string()),
            Arc::new(MockUserRepository::new()),
            3600,
        )
        .issue(&user)
        .unwrap();
        let gate = gate_with(Some(user));
        assert_eq!(gate.resolve(&forged).await.unwrap_err(), DomainError::Unauthenticated);
        assert_eq!(gate.resolve("not-a-token").await.unwrap_err(), DomainError::Unauthenticated);
    }
}
