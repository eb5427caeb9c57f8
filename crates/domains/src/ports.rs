//! # Core Traits (Ports)
//!
//! Any adapter must implement these traits to be used by the services.
//! Every method is potentially blocking I/O against the shared store; callers
//! never hold an in-process lock across them.

use async_trait::async_trait;
use uuid::Uuid;

use crate::errors::DomainResult;
use crate::models::{
    Article, ArticleDetails, ArticleFilter, ArticleReview, CommentWithAuthor, Comment, EdgeKind,
    Identity, NewArticle, Notification, PageRequest, Paginated, ProfileUpdate, Role, StatusChange,
    TargetScope, User, UserSummary, UserWithCounts,
};

/// Persistence contract for user records and the counts derived from them.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Fails with `Conflict` when the email is taken.
    async fn create(&self, user: User) -> DomainResult<User>;
    async fn find_by_id(&self, id: Uuid) -> DomainResult<Option<User>>;
    async fn find_by_email(&self, email: &str) -> DomainResult<Option<User>>;
    async fn get_with_counts(&self, id: Uuid) -> DomainResult<Option<UserWithCounts>>;
    async fn list_with_counts(
        &self,
        role: Option<Role>,
        page: PageRequest,
    ) -> DomainResult<Paginated<UserWithCounts>>;
    async fn update_profile(&self, id: Uuid, update: ProfileUpdate) -> DomainResult<Option<User>>;
    /// Returns `None` (and writes nothing) when the user is absent or outside `scope`.
    async fn update_role(&self, id: Uuid, role: Role, scope: TargetScope) -> DomainResult<Option<User>>;
    /// Cascades to the user's articles, comments, claps, follow edges and
    /// notifications. Returns whether a user inside `scope` was removed.
    async fn delete(&self, id: Uuid, scope: TargetScope) -> DomainResult<bool>;
    async fn followers(&self, user_id: Uuid) -> DomainResult<Vec<UserSummary>>;
    async fn following(&self, user_id: Uuid) -> DomainResult<Vec<UserSummary>>;
}

/// Persistence contract for articles and their status transitions.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait ArticleRepository: Send + Sync {
    async fn create(&self, new: NewArticle) -> DomainResult<ArticleDetails>;
    async fn find(&self, id: Uuid) -> DomainResult<Option<ArticleDetails>>;
    /// Newest first by creation time.
    async fn list(
        &self,
        filter: ArticleFilter,
        page: PageRequest,
    ) -> DomainResult<Paginated<ArticleDetails>>;
    /// Published articles, newest publication first.
    async fn list_published(&self, limit: u32) -> DomainResult<Vec<ArticleDetails>>;
    /// Applies the status and the optional review as one transaction.
    /// Returns `None` (and writes nothing) when the article is absent.
    async fn update_status(&self, change: StatusChange) -> DomainResult<Option<Article>>;
    /// Cascades to comments, claps, reviews and tag links.
    async fn delete(&self, id: Uuid) -> DomainResult<bool>;
}

/// Append-only moderation history.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait ReviewRepository: Send + Sync {
    async fn append(&self, review: ArticleReview) -> DomainResult<ArticleReview>;
    /// Newest review first.
    async fn list_for_article(&self, article_id: Uuid) -> DomainResult<Vec<ArticleReview>>;
}

/// Unique (subject, object) edges backing claps and follows.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait EdgeRepository: Send + Sync {
    /// Fails with `Conflict` if the edge already exists and `NotFound`
    /// if either endpoint is missing.
    async fn insert(&self, kind: EdgeKind, subject: Uuid, object: Uuid) -> DomainResult<()>;
    /// Returns whether a row was removed.
    async fn remove(&self, kind: EdgeKind, subject: Uuid, object: Uuid) -> DomainResult<bool>;
    async fn exists(&self, kind: EdgeKind, subject: Uuid, object: Uuid) -> DomainResult<bool>;
    async fn count_by_object(&self, kind: EdgeKind, object: Uuid) -> DomainResult<i64>;
    async fn count_by_subject(&self, kind: EdgeKind, subject: Uuid) -> DomainResult<i64>;
}

#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait CommentRepository: Send + Sync {
    async fn create(&self, comment: Comment) -> DomainResult<CommentWithAuthor>;
    /// Newest first.
    async fn list_for_article(&self, article_id: Uuid) -> DomainResult<Vec<CommentWithAuthor>>;
}

#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait NotificationRepository: Send + Sync {
    async fn create(&self, notification: Notification) -> DomainResult<Notification>;
    /// Newest first.
    async fn list_for_user(&self, user_id: Uuid) -> DomainResult<Vec<Notification>>;
}

/// Identity and session contract.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait IdentityGate: Send + Sync {
    /// Resolves an opaque credential to the caller, or fails with `Unauthenticated`.
    async fn resolve(&self, credential: &str) -> DomainResult<Identity>;
}
