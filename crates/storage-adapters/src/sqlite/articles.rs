use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domains::{
    Article, ArticleDetails, ArticleFilter, ArticleRepository, ArticleStatus, DomainError,
    DomainResult, NewArticle, PageRequest, Paginated, StatusChange, Tag, UserSummary,
};
use sqlx::{FromRow, QueryBuilder, Sqlite};
use tracing::debug;
use uuid::Uuid;

use super::reviews::insert_review;
use super::{corrupt, map_db_err, SqliteStore};

const ARTICLE_COLUMNS: &str =
    "id, title, subtitle, content, cover_image_url, status, author_id, created_at, updated_at, published_at";

const ARTICLE_SELECT: &str = "SELECT a.id, a.title, a.subtitle, a.content, a.cover_image_url, a.status, \
     a.author_id, a.created_at, a.updated_at, a.published_at, \
     u.name AS author_name, u.email AS author_email, u.avatar_url AS author_avatar_url, \
     (SELECT COUNT(*) FROM claps c WHERE c.article_id = a.id) AS clap_count, \
     (SELECT COUNT(*) FROM comments m WHERE m.article_id = a.id) AS comment_count \
     FROM articles a JOIN users u ON u.id = a.author_id";

#[derive(FromRow)]
struct ArticleRecord {
    id: Uuid,
    title: String,
    subtitle: Option<String>,
    content: String,
    cover_image_url: Option<String>,
    status: String,
    author_id: Uuid,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    published_at: Option<DateTime<Utc>>,
}

impl TryFrom<ArticleRecord> for Article {
    type Error = DomainError;

    fn try_from(row: ArticleRecord) -> DomainResult<Self> {
        let status = row
            .status
            .parse::<ArticleStatus>()
            .map_err(|_| corrupt("status", &row.status))?;
        Ok(Article {
            id: row.id,
            title: row.title,
            subtitle: row.subtitle,
            content: row.content,
            cover_image_url: row.cover_image_url,
            status,
            author_id: row.author_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
            published_at: row.published_at,
        })
    }
}

#[derive(FromRow)]
struct ArticleRow {
    #[sqlx(flatten)]
    article: ArticleRecord,
    author_name: String,
    author_email: String,
    author_avatar_url: Option<String>,
    clap_count: i64,
    comment_count: i64,
}

#[derive(FromRow)]
struct TagLinkRow {
    article_id: Uuid,
    id: Uuid,
    name: String,
}

impl ArticleRow {
    fn into_details(self, tags: Vec<Tag>) -> DomainResult<ArticleDetails> {
        let article = Article::try_from(self.article)?;
        let author = UserSummary {
            id: article.author_id,
            name: self.author_name,
            email: self.author_email,
            avatar_url: self.author_avatar_url,
        };
        Ok(ArticleDetails {
            article,
            author,
            tags,
            clap_count: self.clap_count,
            comment_count: self.comment_count,
        })
    }
}

/// Escapes `%`, `_` and the escape character itself so user text matches literally.
fn like_pattern(query: &str) -> String {
    let mut escaped = String::with_capacity(query.len() + 2);
    escaped.push('%');
    for ch in query.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped.push('%');
    escaped
}

fn push_filters(builder: &mut QueryBuilder<'_, Sqlite>, filter: &ArticleFilter) {
    builder.push(" WHERE 1 = 1");
    if let Some(author_id) = filter.author_id {
        builder.push(" AND a.author_id = ").push_bind(author_id);
    }
    if let Some(status) = filter.status {
        builder.push(" AND a.status = ").push_bind(status.as_str());
    }
    // SQLite LIKE folds ASCII case only.
    if let Some(query) = filter.text_query() {
        let pattern = like_pattern(query);
        builder
            .push(" AND (a.title LIKE ")
            .push_bind(pattern.clone())
            .push(" ESCAPE '\\' OR a.subtitle LIKE ")
            .push_bind(pattern.clone())
            .push(" ESCAPE '\\' OR a.content LIKE ")
            .push_bind(pattern.clone())
            .push(" ESCAPE '\\' OR u.name LIKE ")
            .push_bind(pattern)
            .push(" ESCAPE '\\')");
    }
}

impl SqliteStore {
    async fn tags_for(&self, article_ids: &[Uuid]) -> DomainResult<HashMap<Uuid, Vec<Tag>>> {
        let mut tags: HashMap<Uuid, Vec<Tag>> = HashMap::new();
        if article_ids.is_empty() {
            return Ok(tags);
        }

        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(
            "SELECT at.article_id, t.id, t.name FROM article_tags at \
             JOIN tags t ON t.id = at.tag_id WHERE at.article_id IN (",
        );
        let mut ids = builder.separated(", ");
        for id in article_ids {
            ids.push_bind(*id);
        }
        builder.push(") ORDER BY t.name");

        let rows: Vec<TagLinkRow> = builder
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(map_db_err)?;
        for row in rows {
            tags.entry(row.article_id).or_default().push(Tag {
                id: row.id,
                name: row.name,
            });
        }
        Ok(tags)
    }

    async fn hydrate(&self, rows: Vec<ArticleRow>) -> DomainResult<Vec<ArticleDetails>> {
        let ids: Vec<Uuid> = rows.iter().map(|row| row.article.id).collect();
        let mut tags = self.tags_for(&ids).await?;
        rows.into_iter()
            .map(|row| {
                let article_tags = tags.remove(&row.article.id).unwrap_or_default();
                row.into_details(article_tags)
            })
            .collect()
    }
}

#[async_trait]
impl ArticleRepository for SqliteStore {
    /// Inserts the article and links its tags in one transaction.
    /// Tags are shared by name and created on first use.
    async fn create(&self, new: NewArticle) -> DomainResult<ArticleDetails> {
        let article = new.article;
        let mut tx = self.pool.begin().await.map_err(map_db_err)?;

        sqlx::query(
            "INSERT INTO articles (id, title, subtitle, content, cover_image_url, status, author_id, created_at, updated_at, published_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(article.id)
        .bind(&article.title)
        .bind(&article.subtitle)
        .bind(&article.content)
        .bind(&article.cover_image_url)
        .bind(article.status.as_str())
        .bind(article.author_id)
        .bind(article.created_at)
        .bind(article.updated_at)
        .bind(article.published_at)
        .execute(&mut *tx)
        .await
        .map_err(|err| match map_db_err(err) {
            DomainError::NotFound { .. } => DomainError::not_found("user", article.author_id),
            other => other,
        })?;

        for name in &new.tags {
            sqlx::query("INSERT INTO tags (id, name) VALUES (?, ?) ON CONFLICT (name) DO NOTHING")
                .bind(Uuid::now_v7())
                .bind(name)
                .execute(&mut *tx)
                .await
                .map_err(map_db_err)?;
            let tag_id: Uuid = sqlx::query_scalar("SELECT id FROM tags WHERE name = ?")
                .bind(name)
                .fetch_one(&mut *tx)
                .await
                .map_err(map_db_err)?;
            sqlx::query("INSERT OR IGNORE INTO article_tags (article_id, tag_id) VALUES (?, ?)")
                .bind(article.id)
                .bind(tag_id)
                .execute(&mut *tx)
                .await
                .map_err(map_db_err)?;
        }

        tx.commit().await.map_err(map_db_err)?;
        debug!(article_id = %article.id, tags = new.tags.len(), "article stored");

        self.find(article.id)
            .await?
            .ok_or_else(|| DomainError::Internal("article vanished after insert".into()))
    }

    async fn find(&self, id: Uuid) -> DomainResult<Option<ArticleDetails>> {
        let sql = format!("{ARTICLE_SELECT} WHERE a.id = ?");
        let row: Option<ArticleRow> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_db_err)?;
        match row {
            Some(row) => Ok(self.hydrate(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn list(
        &self,
        filter: ArticleFilter,
        page: PageRequest,
    ) -> DomainResult<Paginated<ArticleDetails>> {
        let mut count: QueryBuilder<Sqlite> =
            QueryBuilder::new("SELECT COUNT(*) FROM articles a JOIN users u ON u.id = a.author_id");
        push_filters(&mut count, &filter);
        let total: i64 = count
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(map_db_err)?;

        let mut select: QueryBuilder<Sqlite> = QueryBuilder::new(ARTICLE_SELECT);
        push_filters(&mut select, &filter);
        select
            .push(" ORDER BY a.created_at DESC, a.id DESC LIMIT ")
            .push_bind(i64::from(page.limit))
            .push(" OFFSET ")
            .push_bind(page.offset());
        let rows: Vec<ArticleRow> = select
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(map_db_err)?;

        Ok(Paginated::new(self.hydrate(rows).await?, page, total))
    }

    async fn list_published(&self, limit: u32) -> DomainResult<Vec<ArticleDetails>> {
        let sql = format!(
            "{ARTICLE_SELECT} WHERE a.status = ? ORDER BY a.published_at DESC, a.id DESC LIMIT ?"
        );
        let rows: Vec<ArticleRow> = sqlx::query_as(&sql)
            .bind(ArticleStatus::Published.as_str())
            .bind(i64::from(limit))
            .fetch_all(&self.pool)
            .await
            .map_err(map_db_err)?;
        self.hydrate(rows).await
    }

    /// The status write and the review append share one transaction: a failed
    /// review insert leaves the article untouched.
    async fn update_status(&self, change: StatusChange) -> DomainResult<Option<Article>> {
        let mut tx = self.pool.begin().await.map_err(map_db_err)?;

        let sql = format!(
            "UPDATE articles SET status = ?, published_at = ?, updated_at = ? WHERE id = ? RETURNING {ARTICLE_COLUMNS}"
        );
        let row: Option<ArticleRecord> = sqlx::query_as(&sql)
            .bind(change.status.as_str())
            .bind(change.published_at)
            .bind(change.updated_at)
            .bind(change.article_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(map_db_err)?;

        let Some(row) = row else {
            // Nothing was written; dropping the transaction rolls it back.
            return Ok(None);
        };

        if let Some(review) = &change.review {
            insert_review(&mut *tx, review).await.map_err(map_db_err)?;
        }

        tx.commit().await.map_err(map_db_err)?;
        Article::try_from(row).map(Some)
    }

    async fn delete(&self, id: Uuid) -> DomainResult<bool> {
        let result = sqlx::query("DELETE FROM articles WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_db_err)?;
        Ok(result.rows_affected() > 0)
    }
}
