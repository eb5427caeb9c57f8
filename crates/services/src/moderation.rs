//! # Moderation Query Service
//!
//! Staff-only listings and user administration. Admin accounts can only be
//! changed or removed by another admin. The store re-checks that rule in
//! the write itself, so a promotion racing the read cannot bypass it.

use std::sync::Arc;

use domains::{
    ArticleDetails, ArticleFilter, ArticleRepository, DomainError, DomainResult, Identity,
    PageRequest, Paginated, Role, TargetScope, User, UserRepository, UserWithCounts,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

pub struct ModerationService {
    articles: Arc<dyn ArticleRepository>,
    users: Arc<dyn UserRepository>,
}

impl ModerationService {
    pub fn new(articles: Arc<dyn ArticleRepository>, users: Arc<dyn UserRepository>) -> Self {
        Self { articles, users }
    }

    /// No author restriction, unlike the author-facing listing.
    pub async fn list_articles_for_moderation(
        &self,
        identity: &Identity,
        filter: ArticleFilter,
        page: PageRequest,
    ) -> DomainResult<Paginated<ArticleDetails>> {
        identity.require_staff()?;
        self.articles.list(filter, page).await
    }

    pub async fn list_users_for_moderation(
        &self,
        identity: &Identity,
        role: Option<Role>,
        page: PageRequest,
    ) -> DomainResult<Paginated<UserWithCounts>> {
        identity.require_staff()?;
        self.users.list_with_counts(role, page).await
    }

    #[instrument(skip(self), fields(caller_id = %identity.user_id))]
    pub async fn update_user_role(
        &self,
        identity: &Identity,
        target_id: Uuid,
        new_role: Role,
    ) -> DomainResult<User> {
        identity.require_staff()?;
        let target = self.load_target(target_id).await?;

        if identity.role != Role::Admin {
            if target.role == Role::Admin {
                warn!(%target_id, "moderator attempted to modify an admin");
                return Err(DomainError::forbidden("cannot modify admin users"));
            }
            if new_role == Role::Admin {
                return Err(DomainError::forbidden("only admins can grant the admin role"));
            }
        }

        let scope = TargetScope::for_caller(identity.role);
        let Some(updated) = self.users.update_role(target_id, new_role, scope).await? else {
            return Err(self.refused_write(target_id, "cannot modify admin users").await);
        };
        info!(%target_id, from = %target.role, to = %new_role, "user role updated");
        Ok(updated)
    }

    #[instrument(skip(self), fields(caller_id = %identity.user_id))]
    pub async fn delete_user(&self, identity: &Identity, target_id: Uuid) -> DomainResult<()> {
        identity.require_staff()?;
        if target_id == identity.user_id {
            return Err(DomainError::validation("user_id", "cannot delete self"));
        }
        let target = self.load_target(target_id).await?;

        if target.role == Role::Admin && identity.role != Role::Admin {
            warn!(%target_id, "moderator attempted to delete an admin");
            return Err(DomainError::forbidden("cannot delete admin users"));
        }

        let scope = TargetScope::for_caller(identity.role);
        if !self.users.delete(target_id, scope).await? {
            return Err(self.refused_write(target_id, "cannot delete admin users").await);
        }
        info!(%target_id, role = %target.role, "user deleted");
        Ok(())
    }

    /// Explains a guarded write that touched no row: the target either
    /// vanished or became an admin after it was loaded.
    async fn refused_write(&self, target_id: Uuid, forbidden: &str) -> DomainError {
        match self.users.find_by_id(target_id).await {
            Ok(Some(user)) if user.role == Role::Admin => {
                warn!(%target_id, "target became an admin during the request");
                DomainError::forbidden(forbidden)
            }
            Ok(_) => DomainError::not_found("user", target_id),
            Err(err) => err,
        }
    }

    async fn load_target(&self, target_id: Uuid) -> DomainResult<User> {
        self.users
            .find_by_id(target_id)
            .await?
            .ok_or_else(|| DomainError::not_found("user", target_id))
    }
}
