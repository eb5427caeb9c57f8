use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domains::{ArticleReview, DomainError, DomainResult, ReviewDecision, ReviewRepository};
use sqlx::{Executor, FromRow, Sqlite};
use uuid::Uuid;

use super::{corrupt, map_db_err, row_exists, SqliteStore};

#[derive(FromRow)]
struct ReviewRow {
    id: Uuid,
    article_id: Uuid,
    reviewer_id: Option<Uuid>,
    decision: String,
    comments: String,
    reviewed_at: DateTime<Utc>,
}

impl TryFrom<ReviewRow> for ArticleReview {
    type Error = DomainError;

    fn try_from(row: ReviewRow) -> DomainResult<Self> {
        let decision = row
            .decision
            .parse::<ReviewDecision>()
            .map_err(|_| corrupt("decision", &row.decision))?;
        Ok(ArticleReview {
            id: row.id,
            article_id: row.article_id,
            reviewer_id: row.reviewer_id,
            decision,
            comments: row.comments,
            reviewed_at: row.reviewed_at,
        })
    }
}

/// Shared by the standalone append and the status-change transaction.
pub(super) async fn insert_review<'e, E>(executor: E, review: &ArticleReview) -> Result<(), sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        "INSERT INTO article_reviews (id, article_id, reviewer_id, decision, comments, reviewed_at) \
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(review.id)
    .bind(review.article_id)
    .bind(review.reviewer_id)
    .bind(review.decision.as_str())
    .bind(&review.comments)
    .bind(review.reviewed_at)
    .execute(executor)
    .await?;
    Ok(())
}

#[async_trait]
impl ReviewRepository for SqliteStore {
    async fn append(&self, review: ArticleReview) -> DomainResult<ArticleReview> {
        if let Err(err) = insert_review(&self.pool, &review).await {
            let err = map_db_err(err);
            if !matches!(err, DomainError::NotFound { .. }) {
                return Err(err);
            }
            if !row_exists(&self.pool, "articles", review.article_id).await? {
                return Err(DomainError::not_found("article", review.article_id));
            }
            return Err(DomainError::not_found("user", review.reviewer_id.unwrap_or_default()));
        }
        Ok(review)
    }

    async fn list_for_article(&self, article_id: Uuid) -> DomainResult<Vec<ArticleReview>> {
        let rows: Vec<ReviewRow> = sqlx::query_as(
            "SELECT id, article_id, reviewer_id, decision, comments, reviewed_at FROM article_reviews \
             WHERE article_id = ? ORDER BY reviewed_at DESC, id DESC",
        )
        .bind(article_id)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_err)?;
        rows.into_iter().map(ArticleReview::try_from).collect()
    }
}
