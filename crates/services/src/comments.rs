//! Append-only comments on articles.

use std::sync::Arc;

use chrono::Utc;
use domains::{
    ArticleRepository, Comment, CommentRepository, CommentWithAuthor, DomainError, DomainResult,
    Identity,
};
use tracing::{info, instrument};
use uuid::Uuid;

pub struct CommentService {
    comments: Arc<dyn CommentRepository>,
    articles: Arc<dyn ArticleRepository>,
}

impl CommentService {
    pub fn new(comments: Arc<dyn CommentRepository>, articles: Arc<dyn ArticleRepository>) -> Self {
        Self { comments, articles }
    }

    #[instrument(skip(self, content), fields(user_id = %identity.user_id))]
    pub async fn add_comment(
        &self,
        identity: &Identity,
        article_id: Uuid,
        content: &str,
    ) -> DomainResult<CommentWithAuthor> {
        let content = content.trim();
        if content.is_empty() {
            return Err(DomainError::validation("content", "comment content is required"));
        }
        self.ensure_article(article_id).await?;

        let created = self
            .comments
            .create(Comment {
                id: Uuid::now_v7(),
                article_id,
                user_id: identity.user_id,
                content: content.to_string(),
                created_at: Utc::now(),
            })
            .await?;
        info!(comment_id = %created.comment.id, %article_id, "comment added");
        Ok(created)
    }

    pub async fn list_comments(&self, article_id: Uuid) -> DomainResult<Vec<CommentWithAuthor>> {
        self.ensure_article(article_id).await?;
        self.comments.list_for_article(article_id).await
    }

    async fn ensure_article(&self, article_id: Uuid) -> DomainResult<()> {
        match self.articles.find(article_id).await? {
            Some(_) => Ok(()),
            None => Err(DomainError::not_found("article", article_id)),
        }
    }
}
