//! # Notification Emitter
//!
//! Fire-and-forget creation of notifications. Failures are logged and never
//! reach the operation that triggered them.

use std::sync::Arc;

use async_trait::async_trait;
use domains::{
    DomainError, DomainResult, Identity, Notification, NotificationKind, NotificationRepository,
    UserRepository,
};
use tracing::{info, warn};
use uuid::Uuid;

use crate::toggle::EdgeHook;

#[derive(Clone)]
pub struct NotificationEmitter {
    notifications: Arc<dyn NotificationRepository>,
}

impl NotificationEmitter {
    pub fn new(notifications: Arc<dyn NotificationRepository>) -> Self {
        Self { notifications }
    }

    pub async fn emit(
        &self,
        recipient_id: Uuid,
        kind: NotificationKind,
        message: impl Into<String>,
        link: impl Into<String>,
    ) {
        let notification = Notification::new(recipient_id, kind, message, link);
        match self.notifications.create(notification).await {
            Ok(created) => {
                info!(notification_id = %created.id, %recipient_id, kind = kind.as_str(), "notification emitted")
            }
            Err(err) => {
                warn!(%recipient_id, kind = kind.as_str(), error = %err, "failed to emit notification")
            }
        }
    }

    pub async fn list_for(&self, identity: &Identity) -> DomainResult<Vec<Notification>> {
        self.notifications.list_for_user(identity.user_id).await
    }
}

/// Tells the followed user who started following them.
pub struct FollowNotifier {
    users: Arc<dyn UserRepository>,
    emitter: NotificationEmitter,
}

impl FollowNotifier {
    pub fn new(users: Arc<dyn UserRepository>, emitter: NotificationEmitter) -> Self {
        Self { users, emitter }
    }
}

#[async_trait]
impl EdgeHook for FollowNotifier {
    async fn on_created(&self, follower_id: Uuid, followed_id: Uuid) -> DomainResult<()> {
        let follower = self
            .users
            .find_by_id(follower_id)
            .await?
            .ok_or_else(|| DomainError::not_found("user", follower_id))?;

        self.emitter
            .emit(
                followed_id,
                NotificationKind::Followed,
                format!("{} começou a seguir você", follower.name),
                format!("/profile/{}", follower.id),
            )
            .await;
        Ok(())
    }
}
