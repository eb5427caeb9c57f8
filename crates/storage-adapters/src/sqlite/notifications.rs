use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domains::{
    DomainError, DomainResult, Notification, NotificationKind, NotificationRepository,
};
use sqlx::FromRow;
use uuid::Uuid;

use super::{corrupt, map_db_err, SqliteStore};

#[derive(FromRow)]
struct NotificationRow {
    id: Uuid,
    user_id: Uuid,
    kind: String,
    message: String,
    link: String,
    read: bool,
    created_at: DateTime<Utc>,
}

impl TryFrom<NotificationRow> for Notification {
    type Error = DomainError;

    fn try_from(row: NotificationRow) -> DomainResult<Self> {
        let kind = row
            .kind
            .parse::<NotificationKind>()
            .map_err(|_| corrupt("kind", &row.kind))?;
        Ok(Notification {
            id: row.id,
            user_id: row.user_id,
            kind,
            message: row.message,
            link: row.link,
            read: row.read,
            created_at: row.created_at,
        })
    }
}

#[async_trait]
impl NotificationRepository for SqliteStore {
    async fn create(&self, notification: Notification) -> DomainResult<Notification> {
        sqlx::query(
            "INSERT INTO notifications (id, user_id, kind, message, link, read, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(notification.id)
        .bind(notification.user_id)
        .bind(notification.kind.as_str())
        .bind(&notification.message)
        .bind(&notification.link)
        .bind(notification.read)
        .bind(notification.created_at)
        .execute(&self.pool)
        .await
        .map_err(|err| match map_db_err(err) {
            DomainError::NotFound { .. } => DomainError::not_found("user", notification.user_id),
            other => other,
        })?;
        Ok(notification)
    }

    async fn list_for_user(&self, user_id: Uuid) -> DomainResult<Vec<Notification>> {
        let rows: Vec<NotificationRow> = sqlx::query_as(
            "SELECT id, user_id, kind, message, link, read, created_at FROM notifications \
             WHERE user_id = ? ORDER BY created_at DESC, id DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_err)?;
        rows.into_iter().map(Notification::try_from).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domains::{Role, User, UserRepository};

    #[tokio::test]
    async fn test_notifications_list_newest_first() {
        let store = SqliteStore::in_memory().await.unwrap();
        let user = UserRepository::create(&store, User::new("A", "a@example.test", Role::Reader))
            .await
            .unwrap();

        let first = Notification::new(user.id, NotificationKind::Followed, "first", "/profile/1");
        let second = Notification::new(user.id, NotificationKind::Followed, "second", "/profile/2");
        NotificationRepository::create(&store, first).await.unwrap();
        NotificationRepository::create(&store, second).await.unwrap();

        let listed = store.list_for_user(user.id).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].message, "second");
        assert!(!listed[0].read);
    }
}
