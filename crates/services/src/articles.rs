//! # Article Store
//!
//! Owns article creation, listings and the status state machine:
//! `rascunho`/`pendente` → (staff) → `publicado` | `rejeitado`, re-openable by staff.

use std::sync::Arc;

use chrono::Utc;
use domains::{
    Article, ArticleDetails, ArticleFilter, ArticleRepository, ArticleReview, ArticleStatus,
    DomainError, DomainResult, Identity, NewArticle, PageRequest, Paginated, StatusChange,
    MAX_PAGE_LIMIT,
};
use serde::Deserialize;
use tracing::{info, instrument};
use uuid::Uuid;

/// The home page shows this many published articles by default.
pub const DEFAULT_FEED_LIMIT: u32 = 20;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewArticleInput {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub subtitle: Option<String>,
    #[serde(default)]
    pub cover_image_url: Option<String>,
    #[serde(default)]
    pub status: ArticleStatus,
    #[serde(default)]
    pub tags: Vec<String>,
}

pub struct ArticleService {
    articles: Arc<dyn ArticleRepository>,
}

impl ArticleService {
    pub fn new(articles: Arc<dyn ArticleRepository>) -> Self {
        Self { articles }
    }

    #[instrument(skip(self, input), fields(author_id = %identity.user_id, status = %input.status))]
    pub async fn create_article(
        &self,
        identity: &Identity,
        input: NewArticleInput,
    ) -> DomainResult<ArticleDetails> {
        let title = required("title", &input.title)?;
        let content = required("content", &input.content)?;

        if !input.status.is_author_selectable() && !identity.is_staff() {
            return Err(DomainError::forbidden(format!(
                "only moderators can create articles as '{}'",
                input.status
            )));
        }

        let now = Utc::now();
        let article = Article {
            id: Uuid::now_v7(),
            title,
            subtitle: trimmed(input.subtitle),
            content,
            cover_image_url: trimmed(input.cover_image_url),
            status: input.status,
            author_id: identity.user_id,
            created_at: now,
            updated_at: now,
            published_at: input.status.published_at(now),
        };

        let details = self
            .articles
            .create(NewArticle {
                article,
                tags: normalize_tags(input.tags),
            })
            .await?;

        info!(article_id = %details.article.id, "article created");
        Ok(details)
    }

    pub async fn get_article(&self, article_id: Uuid) -> DomainResult<ArticleDetails> {
        self.articles
            .find(article_id)
            .await?
            .ok_or_else(|| DomainError::not_found("article", article_id))
    }

    pub async fn list_articles(
        &self,
        filter: ArticleFilter,
        page: PageRequest,
    ) -> DomainResult<Paginated<ArticleDetails>> {
        self.articles.list(filter, page).await
    }

    /// The author-facing listing, always scoped to the caller.
    pub async fn list_own_articles(
        &self,
        identity: &Identity,
        status: Option<ArticleStatus>,
        page: PageRequest,
    ) -> DomainResult<Paginated<ArticleDetails>> {
        let filter = ArticleFilter {
            author_id: Some(identity.user_id),
            status,
            text_query: None,
        };
        self.articles.list(filter, page).await
    }

    pub async fn published_feed(&self, limit: Option<u32>) -> DomainResult<Vec<ArticleDetails>> {
        let limit = limit.unwrap_or(DEFAULT_FEED_LIMIT).clamp(1, MAX_PAGE_LIMIT);
        self.articles.list_published(limit).await
    }

    /// Staff-only transition. A non-blank `comments` appends a review in the
    /// same transaction as the status change.
    #[instrument(skip(self, comments), fields(reviewer_id = %identity.user_id))]
    pub async fn update_status(
        &self,
        identity: &Identity,
        article_id: Uuid,
        new_status: ArticleStatus,
        comments: Option<String>,
    ) -> DomainResult<Article> {
        identity.require_staff()?;

        let now = Utc::now();
        let review = comments
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(|c| ArticleReview::record(article_id, identity.user_id, new_status.into(), c, now));
        let reviewed = review.is_some();

        let updated = self
            .articles
            .update_status(StatusChange {
                article_id,
                status: new_status,
                published_at: new_status.published_at(now),
                updated_at: now,
                review,
            })
            .await?
            .ok_or_else(|| DomainError::not_found("article", article_id))?;

        info!(%article_id, status = %updated.status, reviewed, "article status updated");
        Ok(updated)
    }

    /// Staff may delete anything; authors only their own drafts.
    #[instrument(skip(self), fields(caller_id = %identity.user_id))]
    pub async fn delete_article(&self, identity: &Identity, article_id: Uuid) -> DomainResult<()> {
        let details = self.get_article(article_id).await?;
        let article = &details.article;

        let own_draft =
            article.author_id == identity.user_id && article.status == ArticleStatus::Draft;
        if !identity.is_staff() && !own_draft {
            return Err(DomainError::forbidden("cannot delete this article"));
        }

        if !self.articles.delete(article_id).await? {
            return Err(DomainError::not_found("article", article_id));
        }
        info!(%article_id, "article deleted");
        Ok(())
    }
}

fn required(field: &str, value: &str) -> DomainResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(DomainError::validation(field, format!("{field} is required")));
    }
    Ok(value.to_string())
}

fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Trimmed, lowercased, de-duplicated, in first-seen order.
fn normalize_tags(tags: Vec<String>) -> Vec<String> {
    let mut seen = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim().to_lowercase();
        if !tag.is_empty() && !seen.contains(&tag) {
            seen.push(tag);
        }
    }
    seen
}
