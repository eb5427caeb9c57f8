//! Public profiles and self-service profile edits.

use std::sync::Arc;

use domains::{
    DomainError, DomainResult, Identity, ProfileUpdate, User, UserRepository, UserWithCounts,
};
use tracing::{info, instrument};
use uuid::Uuid;

pub struct ProfileService {
    users: Arc<dyn UserRepository>,
}

impl ProfileService {
    pub fn new(users: Arc<dyn UserRepository>) -> Self {
        Self { users }
    }

    pub async fn get_profile(&self, user_id: Uuid) -> DomainResult<UserWithCounts> {
        self.users
            .get_with_counts(user_id)
            .await?
            .ok_or_else(|| DomainError::not_found("user", user_id))
    }

    #[instrument(skip(self, update), fields(user_id = %identity.user_id))]
    pub async fn update_profile(&self, identity: &Identity, update: ProfileUpdate) -> DomainResult<User> {
        let name = update.name.trim().to_string();
        let email = update.email.trim().to_string();
        if name.is_empty() {
            return Err(DomainError::validation("name", "name is required"));
        }
        if email.is_empty() || !email.contains('@') {
            return Err(DomainError::validation("email", "a valid email is required"));
        }
        if let Some(existing) = self.users.find_by_email(&email).await? {
            if existing.id != identity.user_id {
                return Err(email_taken());
            }
        }

        let update = ProfileUpdate {
            name,
            email,
            bio: non_blank(update.bio),
            avatar_url: non_blank(update.avatar_url),
        };
        let updated = match self.users.update_profile(identity.user_id, update).await {
            Ok(Some(user)) => user,
            Ok(None) => return Err(DomainError::not_found("user", identity.user_id)),
            // Another request claimed the email between the check and the write.
            Err(err) if err.is_conflict() => return Err(email_taken()),
            Err(err) => return Err(err),
        };
        info!("profile updated");
        Ok(updated)
    }
}

fn email_taken() -> DomainError {
    DomainError::validation("email", "email already in use")
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
