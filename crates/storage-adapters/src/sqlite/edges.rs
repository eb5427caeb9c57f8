use async_trait::async_trait;
use chrono::Utc;
use domains::{DomainError, DomainResult, EdgeKind, EdgeRepository};
use uuid::Uuid;

use super::{map_db_err, SqliteStore};

/// Physical layout of one edge relation.
struct EdgeTable {
    table: &'static str,
    subject: &'static str,
    object: &'static str,
    object_entity: &'static str,
}

fn edge_table(kind: EdgeKind) -> EdgeTable {
    match kind {
        EdgeKind::Clap => EdgeTable {
            table: "claps",
            subject: "user_id",
            object: "article_id",
            object_entity: "article",
        },
        EdgeKind::Follow => EdgeTable {
            table: "followers",
            subject: "follower_id",
            object: "followed_id",
            object_entity: "user",
        },
    }
}

#[async_trait]
impl EdgeRepository for SqliteStore {
    /// Relies on the composite primary key: a concurrent duplicate fails with
    /// `Conflict` instead of creating a second row.
    async fn insert(&self, kind: EdgeKind, subject: Uuid, object: Uuid) -> DomainResult<()> {
        let t = edge_table(kind);
        let sql = format!(
            "INSERT INTO {} ({}, {}, created_at) VALUES (?, ?, ?)",
            t.table, t.subject, t.object
        );
        sqlx::query(&sql)
            .bind(subject)
            .bind(object)
            .bind(Utc::now())
            .execute(&self.pool)
            .await
            .map_err(|err| match map_db_err(err) {
                DomainError::NotFound { .. } => DomainError::not_found(t.object_entity, object),
                other => other,
            })?;
        Ok(())
    }

    async fn remove(&self, kind: EdgeKind, subject: Uuid, object: Uuid) -> DomainResult<bool> {
        let t = edge_table(kind);
        let sql = format!("DELETE FROM {} WHERE {} = ? AND {} = ?", t.table, t.subject, t.object);
        let result = sqlx::query(&sql)
            .bind(subject)
            .bind(object)
            .execute(&self.pool)
            .await
            .map_err(map_db_err)?;
        Ok(result.rows_affected() > 0)
    }

    async fn exists(&self, kind: EdgeKind, subject: Uuid, object: Uuid) -> DomainResult<bool> {
        let t = edge_table(kind);
        let sql = format!(
            "SELECT EXISTS (SELECT 1 FROM {} WHERE {} = ? AND {} = ?)",
            t.table, t.subject, t.object
        );
        let found: i64 = sqlx::query_scalar(&sql)
            .bind(subject)
            .bind(object)
            .fetch_one(&self.pool)
            .await
            .map_err(map_db_err)?;
        Ok(found != 0)
    }

    async fn count_by_object(&self, kind: EdgeKind, object: Uuid) -> DomainResult<i64> {
        let t = edge_table(kind);
        let sql = format!("SELECT COUNT(*) FROM {} WHERE {} = ?", t.table, t.object);
        sqlx::query_scalar(&sql)
            .bind(object)
            .fetch_one(&self.pool)
            .await
            .map_err(map_db_err)
    }

    async fn count_by_subject(&self, kind: EdgeKind, subject: Uuid) -> DomainResult<i64> {
        let t = edge_table(kind);
        let sql = format!("SELECT COUNT(*) FROM {} WHERE {} = ?", t.table, t.subject);
        sqlx::query_scalar(&sql)
            .bind(subject)
            .fetch_one(&self.pool)
            .await
            .map_err(map_db_err)
    }
}
