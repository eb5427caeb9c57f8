use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domains::{
    Comment, CommentRepository, CommentWithAuthor, DomainError, DomainResult, UserSummary,
};
use sqlx::sqlite::SqlitePool;
use sqlx::FromRow;
use uuid::Uuid;

use super::{map_db_err, row_exists, SqliteStore};

const COMMENT_SELECT: &str = "SELECT c.id, c.article_id, c.user_id, c.content, c.created_at, \
     u.name AS author_name, u.email AS author_email, u.avatar_url AS author_avatar_url \
     FROM comments c JOIN users u ON u.id = c.user_id";

#[derive(FromRow)]
struct CommentRow {
    id: Uuid,
    article_id: Uuid,
    user_id: Uuid,
    content: String,
    created_at: DateTime<Utc>,
    author_name: String,
    author_email: String,
    author_avatar_url: Option<String>,
}

impl From<CommentRow> for CommentWithAuthor {
    fn from(row: CommentRow) -> Self {
        CommentWithAuthor {
            author: UserSummary {
                id: row.user_id,
                name: row.author_name,
                email: row.author_email,
                avatar_url: row.author_avatar_url,
            },
            comment: Comment {
                id: row.id,
                article_id: row.article_id,
                user_id: row.user_id,
                content: row.content,
                created_at: row.created_at,
            },
        }
    }
}

/// Names whichever side of a failed comment insert is gone.
async fn missing_parent(pool: &SqlitePool, article_id: Uuid, user_id: Uuid) -> DomainResult<DomainError> {
    if row_exists(pool, "articles", article_id).await? {
        Ok(DomainError::not_found("user", user_id))
    } else {
        Ok(DomainError::not_found("article", article_id))
    }
}

#[async_trait]
impl CommentRepository for SqliteStore {
    async fn create(&self, comment: Comment) -> DomainResult<CommentWithAuthor> {
        let inserted = sqlx::query(
            "INSERT INTO comments (id, article_id, user_id, content, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(comment.id)
        .bind(comment.article_id)
        .bind(comment.user_id)
        .bind(&comment.content)
        .bind(comment.created_at)
        .execute(&self.pool)
        .await;
        if let Err(err) = inserted {
            return Err(match map_db_err(err) {
                DomainError::NotFound { .. } => {
                    missing_parent(&self.pool, comment.article_id, comment.user_id).await?
                }
                other => other,
            });
        }

        let sql = format!("{COMMENT_SELECT} WHERE c.id = ?");
        let row: CommentRow = sqlx::query_as(&sql)
            .bind(comment.id)
            .fetch_one(&self.pool)
            .await
            .map_err(map_db_err)?;
        Ok(row.into())
    }

    async fn list_for_article(&self, article_id: Uuid) -> DomainResult<Vec<CommentWithAuthor>> {
        let sql = format!("{COMMENT_SELECT} WHERE c.article_id = ? ORDER BY c.created_at DESC, c.id DESC");
        let rows: Vec<CommentRow> = sqlx::query_as(&sql)
            .bind(article_id)
            .fetch_all(&self.pool)
            .await
            .map_err(map_db_err)?;
        Ok(rows.into_iter().map(CommentWithAuthor::from).collect())
    }
}
