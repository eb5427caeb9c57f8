//! # Review Ledger
//!
//! Append-only history of moderation decisions. Reviews are never updated or
//! deleted here and are independent of the article's current status.

use std::sync::Arc;

use chrono::Utc;
use domains::{
    ArticleRepository, ArticleReview, DomainError, DomainResult, Identity, ReviewDecision,
    ReviewRepository,
};
use tracing::{info, instrument};
use uuid::Uuid;

pub struct ReviewLedger {
    reviews: Arc<dyn ReviewRepository>,
    articles: Arc<dyn ArticleRepository>,
}

impl ReviewLedger {
    pub fn new(reviews: Arc<dyn ReviewRepository>, articles: Arc<dyn ArticleRepository>) -> Self {
        Self { reviews, articles }
    }

    #[instrument(skip(self, comments), fields(reviewer_id = %identity.user_id))]
    pub async fn append_review(
        &self,
        identity: &Identity,
        article_id: Uuid,
        decision: ReviewDecision,
        comments: &str,
    ) -> DomainResult<ArticleReview> {
        identity.require_staff()?;
        let comments = comments.trim();
        if comments.is_empty() {
            return Err(DomainError::validation("comments", "comments are required"));
        }
        if self.articles.find(article_id).await?.is_none() {
            return Err(DomainError::not_found("article", article_id));
        }

        let review = self
            .reviews
            .append(ArticleReview::record(
                article_id,
                identity.user_id,
                decision,
                comments,
                Utc::now(),
            ))
            .await?;
        info!(review_id = %review.id, %article_id, decision = decision.as_str(), "review appended");
        Ok(review)
    }

    /// Newest first. Visible to staff and to the article's author.
    pub async fn list_reviews(
        &self,
        identity: &Identity,
        article_id: Uuid,
    ) -> DomainResult<Vec<ArticleReview>> {
        let details = self
            .articles
            .find(article_id)
            .await?
            .ok_or_else(|| DomainError::not_found("article", article_id))?;

        if !identity.is_staff() && details.article.author_id != identity.user_id {
            return Err(DomainError::forbidden("reviews are visible to staff and the author"));
        }
        self.reviews.list_for_article(article_id).await
    }
}
