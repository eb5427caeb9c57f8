//! # SQLite store
//!
//! This module implements the data mapping between the SQLite relational model
//! and the `domains` models. One `SqliteStore` implements every repository port;
//! it is cheap to clone (the pool is reference counted).
//!
//! Foreign keys are switched on for every connection so that the cascades
//! declared in `migrations/` actually run.

mod articles;
mod comments;
mod edges;
mod notifications;
mod reviews;
mod users;

use std::str::FromStr;
use std::time::Duration;

use domains::{DomainError, DomainResult, UserSummary};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use sqlx::FromRow;
use tracing::{error, info};
use uuid::Uuid;

#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Opens (creating if missing) the database at `url` and runs migrations.
    ///
    /// In-memory databases live only as long as their connection, so they get a
    /// single connection that is never recycled.
    pub async fn connect(url: &str, max_connections: u32) -> anyhow::Result<Self> {
        let in_memory = url.contains(":memory:") || url.contains("mode=memory");
        let mut options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true)
            .busy_timeout(Duration::from_secs(5));
        if !in_memory {
            options = options.journal_mode(SqliteJournalMode::Wal);
        }

        let pool_options = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(max_connections.max(1))
        };
        let pool = pool_options.connect_with(options).await?;

        sqlx::migrate!("./migrations").run(&pool).await?;
        info!(url, in_memory, "sqlite store ready");
        Ok(Self { pool })
    }

    pub async fn in_memory() -> anyhow::Result<Self> {
        Self::connect("sqlite::memory:", 1).await
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

/// Maps driver failures onto the domain taxonomy. Anything that is not a
/// constraint violation is logged here and surfaced as an opaque `Internal`.
pub(crate) fn map_db_err(err: sqlx::Error) -> DomainError {
    if let sqlx::Error::Database(db) = &err {
        if db.is_unique_violation() {
            return DomainError::Conflict(db.message().to_string());
        }
        if db.is_foreign_key_violation() {
            return DomainError::not_found("referenced entity", "unknown");
        }
        if db.is_check_violation() {
            return DomainError::validation("input", "constraint violated");
        }
    }
    error!(error = %err, "database failure");
    DomainError::Internal("database failure".into())
}

/// SQLite does not say which foreign key failed. Callers with several
/// parents use this to name the missing one. `table` is always a literal.
pub(crate) async fn row_exists(pool: &SqlitePool, table: &str, id: Uuid) -> DomainResult<bool> {
    let sql = format!("SELECT EXISTS (SELECT 1 FROM {table} WHERE id = ?)");
    let found: i64 = sqlx::query_scalar(&sql)
        .bind(id)
        .fetch_one(pool)
        .await
        .map_err(map_db_err)?;
    Ok(found != 0)
}

/// A stored enum value that no longer parses means the row is corrupt.
pub(crate) fn corrupt(column: &str, value: &str) -> DomainError {
    error!(column, value, "unreadable column value");
    DomainError::Internal(format!("unreadable {column}"))
}

#[derive(FromRow)]
pub(crate) struct SummaryRow {
    id: Uuid,
    name: String,
    email: String,
    avatar_url: Option<String>,
}

impl From<SummaryRow> for UserSummary {
    fn from(row: SummaryRow) -> Self {
        UserSummary {
            id: row.id,
            name: row.name,
            email: row.email,
            avatar_url: row.avatar_url,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use domains::{
        Article, ArticleFilter, ArticleRepository, ArticleReview, ArticleStatus, CommentRepository,
        Comment, EdgeKind, EdgeRepository, NewArticle, PageRequest, ReviewDecision,
        ReviewRepository, Role, StatusChange, TargetScope, User, UserRepository,
    };

    async fn store_with_author() -> (SqliteStore, User) {
        let store = SqliteStore::in_memory().await.unwrap();
        let author = UserRepository::create(&store, User::new("Ana Autora", "ana@example.test", Role::Author))
            .await
            .unwrap();
        (store, author)
    }

    fn new_article(author_id: Uuid, title: &str, status: ArticleStatus) -> NewArticle {
        let now = Utc::now();
        NewArticle {
            article: Article {
                id: Uuid::now_v7(),
                title: title.into(),
                subtitle: None,
                content: "Body".into(),
                cover_image_url: None,
                status,
                author_id,
                created_at: now,
                updated_at: now,
                published_at: status.published_at(now),
            },
            tags: vec!["rust".into(), "sqlite".into()],
        }
    }

    #[tokio::test]
    async fn test_create_and_find_article() {
        let (store, author) = store_with_author().await;

        let created = ArticleRepository::create(&store, new_article(author.id, "Hello", ArticleStatus::Draft))
            .await
            .expect("Failed to create article");
        assert_eq!(created.author.name, "Ana Autora");
        assert_eq!(created.tags.len(), 2);

        let found = store.find(created.article.id).await.unwrap().unwrap();
        assert_eq!(found.article.title, "Hello");
        assert_eq!(found.clap_count, 0);
    }

    #[tokio::test]
    async fn test_status_change_and_review_commit_together() {
        let (store, author) = store_with_author().await;
        let created = ArticleRepository::create(&store, new_article(author.id, "Hello", ArticleStatus::Pending))
            .await
            .unwrap();
        let id = created.article.id;
        let now = Utc::now();

        let updated = store
            .update_status(StatusChange {
                article_id: id,
                status: ArticleStatus::Published,
                published_at: Some(now),
                updated_at: now,
                review: Some(ArticleReview::record(id, author.id, ReviewDecision::Approved, "ok", now)),
            })
            .await
            .unwrap()
            .unwrap();
        assert!(updated.publication_invariant_holds());
        assert_eq!(ReviewRepository::list_for_article(&store, id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_review_rolls_back_status() {
        let (store, author) = store_with_author().await;
        let created = ArticleRepository::create(&store, new_article(author.id, "Hello", ArticleStatus::Pending))
            .await
            .unwrap();
        let id = created.article.id;
        let now = Utc::now();

        // The reviewer does not exist, so the review insert violates its foreign key.
        let result = store
            .update_status(StatusChange {
                article_id: id,
                status: ArticleStatus::Published,
                published_at: Some(now),
                updated_at: now,
                review: Some(ArticleReview::record(id, Uuid::now_v7(), ReviewDecision::Approved, "ok", now)),
            })
            .await;
        assert!(result.is_err());

        let found = store.find(id).await.unwrap().unwrap();
        assert_eq!(found.article.status, ArticleStatus::Pending);
        assert!(found.article.published_at.is_none());
        assert!(ReviewRepository::list_for_article(&store, id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_article_status_update_is_none() {
        let (store, _) = store_with_author().await;
        let now = Utc::now();
        let result = store
            .update_status(StatusChange {
                article_id: Uuid::now_v7(),
                status: ArticleStatus::Rejected,
                published_at: None,
                updated_at: now,
                review: None,
            })
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_duplicate_edge_is_a_conflict() {
        let (store, author) = store_with_author().await;
        let created = ArticleRepository::create(&store, new_article(author.id, "Hello", ArticleStatus::Published))
            .await
            .unwrap();
        let article_id = created.article.id;

        store.insert(EdgeKind::Clap, author.id, article_id).await.unwrap();
        let err = store.insert(EdgeKind::Clap, author.id, article_id).await.unwrap_err();
        assert!(err.is_conflict());
        assert_eq!(store.count_by_object(EdgeKind::Clap, article_id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_edge_to_missing_article_is_not_found() {
        let (store, author) = store_with_author().await;
        let err = store
            .insert(EdgeKind::Clap, author.id, Uuid::now_v7())
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound { ref entity, .. } if entity == "article"));
    }

    #[tokio::test]
    async fn test_text_search_is_case_insensitive_and_literal() {
        let (store, author) = store_with_author().await;
        ArticleRepository::create(&store, new_article(author.id, "Learning RUST", ArticleStatus::Draft))
            .await
            .unwrap();
        ArticleRepository::create(&store, new_article(author.id, "100% coverage", ArticleStatus::Draft))
            .await
            .unwrap();

        let by_title = store
            .list(
                ArticleFilter {
                    text_query: Some("rust".into()),
                    ..Default::default()
                },
                PageRequest::default(),
            )
            .await
            .unwrap();
        assert_eq!(by_title.total, 1);

        let by_author = store
            .list(
                ArticleFilter {
                    text_query: Some("autora".into()),
                    ..Default::default()
                },
                PageRequest::default(),
            )
            .await
            .unwrap();
        assert_eq!(by_author.total, 2);

        let literal_percent = store
            .list(
                ArticleFilter {
                    text_query: Some("0%".into()),
                    ..Default::default()
                },
                PageRequest::default(),
            )
            .await
            .unwrap();
        assert_eq!(literal_percent.total, 1);
    }

    #[tokio::test]
    async fn test_delete_article_cascades_children() {
        let (store, author) = store_with_author().await;
        let created = ArticleRepository::create(&store, new_article(author.id, "Hello", ArticleStatus::Published))
            .await
            .unwrap();
        let id = created.article.id;
        store.insert(EdgeKind::Clap, author.id, id).await.unwrap();
        CommentRepository::create(
            &store,
            Comment {
                id: Uuid::now_v7(),
                article_id: id,
                user_id: author.id,
                content: "first".into(),
                created_at: Utc::now(),
            },
        )
        .await
        .unwrap();

        assert!(ArticleRepository::delete(&store, id).await.unwrap());
        let tag_links: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM article_tags WHERE article_id = ?")
            .bind(id)
            .fetch_one(store.pool())
            .await
            .unwrap();
        assert_eq!(tag_links, 0);
        assert_eq!(store.count_by_object(EdgeKind::Clap, id).await.unwrap(), 0);
        assert!(CommentRepository::list_for_article(&store, id).await.unwrap().is_empty());
    }

    fn comment_on(article_id: Uuid, user_id: Uuid) -> Comment {
        Comment {
            id: Uuid::now_v7(),
            article_id,
            user_id,
            content: "hi".into(),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_comment_names_the_missing_parent() {
        let (store, author) = store_with_author().await;
        let created = ArticleRepository::create(&store, new_article(author.id, "Hello", ArticleStatus::Draft))
            .await
            .unwrap();

        let ghost_article = Uuid::now_v7();
        let err = CommentRepository::create(&store, comment_on(ghost_article, author.id))
            .await
            .unwrap_err();
        assert_eq!(err, DomainError::not_found("article", ghost_article));

        let ghost_user = Uuid::now_v7();
        let err = CommentRepository::create(&store, comment_on(created.article.id, ghost_user))
            .await
            .unwrap_err();
        assert_eq!(err, DomainError::not_found("user", ghost_user));
    }

    #[tokio::test]
    async fn test_reviews_outlive_their_reviewer() {
        let (store, author) = store_with_author().await;
        let reviewer = UserRepository::create(&store, User::new("Mo", "mo@example.test", Role::Moderator))
            .await
            .unwrap();
        let created = ArticleRepository::create(&store, new_article(author.id, "Hello", ArticleStatus::Pending))
            .await
            .unwrap();
        let id = created.article.id;
        ReviewRepository::append(
            &store,
            ArticleReview::record(id, reviewer.id, ReviewDecision::Rejected, "needs work", Utc::now()),
        )
        .await
        .unwrap();

        assert!(UserRepository::delete(&store, reviewer.id, TargetScope::Any).await.unwrap());

        let history = ReviewRepository::list_for_article(&store, id).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].reviewer_id, None);
        assert_eq!(history[0].comments, "needs work");
    }

    #[tokio::test]
    async fn test_review_by_unknown_reviewer_names_the_user() {
        let (store, author) = store_with_author().await;
        let created = ArticleRepository::create(&store, new_article(author.id, "Hello", ArticleStatus::Pending))
            .await
            .unwrap();
        let ghost = Uuid::now_v7();
        let err = ReviewRepository::append(
            &store,
            ArticleReview::record(created.article.id, ghost, ReviewDecision::Approved, "ok", Utc::now()),
        )
        .await
        .unwrap_err();
        assert_eq!(err, DomainError::not_found("user", ghost));
    }
}
