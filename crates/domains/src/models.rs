//! # Domain Models
//!
//! These structs represent the core entities of Pressroom.
//! We use UUID v7 for time-ordered, globally unique identification.
//! Enumerations serialize to the platform's wire values (`rascunho`, `moderador`, ...).

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{DomainError, DomainResult};

// ── Users & identity ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "leitor")]
    Reader,
    #[serde(rename = "autor")]
    Author,
    #[serde(rename = "moderador")]
    Moderator,
    #[serde(rename = "admin")]
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Reader => "leitor",
            Role::Author => "autor",
            Role::Moderator => "moderador",
            Role::Admin => "admin",
        }
    }

    /// Moderators and admins pass the moderation gate.
    pub fn is_staff(&self) -> bool {
        matches!(self, Role::Moderator | Role::Admin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = DomainError;

    fn from_str(s: &str) -> DomainResult<Self> {
        match s {
            "leitor" => Ok(Role::Reader),
            "autor" => Ok(Role::Author),
            "moderador" => Ok(Role::Moderator),
            "admin" => Ok(Role::Admin),
            other => Err(DomainError::validation("role", format!("unknown role '{other}'"))),
        }
    }
}

/// Which accounts a moderation write may touch. The store applies it in the
/// same statement as the write, so a concurrent promotion cannot slip past it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetScope {
    Any,
    NonAdmin,
}

impl TargetScope {
    /// Admins reach every account; moderators only non-admins.
    pub fn for_caller(role: Role) -> Self {
        if role == Role::Admin {
            TargetScope::Any
        } else {
            TargetScope::NonAdmin
        }
    }
}

/// The caller, as already established by the identity gate.
/// Passed explicitly into every core operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub user_id: Uuid,
    pub email: String,
    pub role: Role,
}

impl Identity {
    pub fn is_staff(&self) -> bool {
        self.role.is_staff()
    }

    /// Fails with `Forbidden` unless the caller is a moderator or admin.
    pub fn require_staff(&self) -> DomainResult<()> {
        if self.is_staff() {
            Ok(())
        } else {
            Err(DomainError::forbidden("moderator or admin role required"))
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(name: impl Into<String>, email: impl Into<String>, role: Role) -> Self {
        Self {
            id: Uuid::now_v7(),
            name: name.into(),
            email: email.into(),
            role,
            bio: None,
            avatar_url: None,
            created_at: Utc::now(),
        }
    }

    pub fn summary(&self) -> UserSummary {
        UserSummary {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
            avatar_url: self.avatar_url.clone(),
        }
    }
}

/// Author/commenter card embedded in other read models.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub avatar_url: Option<String>,
}

/// A user with counts derived from related rows, never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserWithCounts {
    #[serde(flatten)]
    pub user: User,
    pub article_count: i64,
    pub follower_count: i64,
    pub following_count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileUpdate {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

// ── Articles ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArticleStatus {
    #[default]
    #[serde(rename = "rascunho")]
    Draft,
    #[serde(rename = "pendente")]
    Pending,
    #[serde(rename = "publicado")]
    Published,
    #[serde(rename = "rejeitado")]
    Rejected,
}

impl ArticleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArticleStatus::Draft => "rascunho",
            ArticleStatus::Pending => "pendente",
            ArticleStatus::Published => "publicado",
            ArticleStatus::Rejected => "rejeitado",
        }
    }

    /// `published_at` is set iff the status is published.
    pub fn published_at(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            ArticleStatus::Published => Some(now),
            _ => None,
        }
    }

    /// Statuses an author may pick without moderation.
    pub fn is_author_selectable(&self) -> bool {
        matches!(self, ArticleStatus::Draft | ArticleStatus::Pending)
    }
}

impl fmt::Display for ArticleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ArticleStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> DomainResult<Self> {
        match s {
            "rascunho" => Ok(ArticleStatus::Draft),
            "pendente" => Ok(ArticleStatus::Pending),
            "publicado" => Ok(ArticleStatus::Published),
            "rejeitado" => Ok(ArticleStatus::Rejected),
            other => Err(DomainError::validation("status", format!("unknown status '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub id: Uuid,
    pub title: String,
    pub subtitle: Option<String>,
    pub content: String,
    pub cover_image_url: Option<String>,
    pub status: ArticleStatus,
    /// Immutable after creation
    pub author_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub published_at: Option<DateTime<Utc>>,
}

impl Article {
    pub fn publication_invariant_holds(&self) -> bool {
        self.published_at.is_some() == (self.status == ArticleStatus::Published)
    }
}

/// Fully prepared insert: validated and trimmed by the service layer.
#[derive(Debug, Clone, PartialEq)]
pub struct NewArticle {
    pub article: Article,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    pub id: Uuid,
    pub name: String,
}

/// Read model: the article with its author card, tags and derived counts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleDetails {
    #[serde(flatten)]
    pub article: Article,
    pub author: UserSummary,
    pub tags: Vec<Tag>,
    pub clap_count: i64,
    pub comment_count: i64,
}

/// A status transition applied atomically with its optional review.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusChange {
    pub article_id: Uuid,
    pub status: ArticleStatus,
    pub published_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
    pub review: Option<ArticleReview>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArticleFilter {
    pub author_id: Option<Uuid>,
    pub status: Option<ArticleStatus>,
    pub text_query: Option<String>,
}

impl ArticleFilter {
    /// The trimmed text query, or `None` when it is blank.
    pub fn text_query(&self) -> Option<&str> {
        self.text_query
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
    }
}

// ── Pagination ──────────────────────────────────────────────────────────────

pub const DEFAULT_PAGE_LIMIT: u32 = 10;
pub const MAX_PAGE_LIMIT: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub page: u32,
    pub limit: u32,
}

impl PageRequest {
    /// Page is clamped to >= 1, limit into `1..=MAX_PAGE_LIMIT`.
    pub fn new(page: Option<u32>, limit: Option<u32>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            limit: limit.unwrap_or(DEFAULT_PAGE_LIMIT).clamp(1, MAX_PAGE_LIMIT),
        }
    }

    pub fn offset(&self) -> i64 {
        (i64::from(self.page) - 1) * i64::from(self.limit)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(None, None)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub limit: u32,
    pub total: i64,
    pub pages: i64,
}

impl<T> Paginated<T> {
    pub fn new(items: Vec<T>, request: PageRequest, total: i64) -> Self {
        let limit = i64::from(request.limit);
        Self {
            items,
            page: request.page,
            limit: request.limit,
            total,
            pages: (total + limit - 1) / limit,
        }
    }
}

// ── Reviews ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReviewDecision {
    #[serde(rename = "aprovado")]
    Approved,
    #[serde(rename = "rejeitado")]
    Rejected,
}

impl ReviewDecision {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewDecision::Approved => "aprovado",
            ReviewDecision::Rejected => "rejeitado",
        }
    }
}

impl From<ArticleStatus> for ReviewDecision {
    /// Published maps to approved; every other status collapses to rejected.
    fn from(status: ArticleStatus) -> Self {
        match status {
            ArticleStatus::Published => ReviewDecision::Approved,
            _ => ReviewDecision::Rejected,
        }
    }
}

impl FromStr for ReviewDecision {
    type Err = DomainError;

    fn from_str(s: &str) -> DomainResult<Self> {
        match s {
            "aprovado" => Ok(ReviewDecision::Approved),
            "rejeitado" => Ok(ReviewDecision::Rejected),
            other => Err(DomainError::validation("decision", format!("unknown decision '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleReview {
    pub id: Uuid,
    pub article_id: Uuid,
    /// `None` once the reviewer's account is deleted; the review itself stays.
    pub reviewer_id: Option<Uuid>,
    pub decision: ReviewDecision,
    pub comments: String,
    pub reviewed_at: DateTime<Utc>,
}

impl ArticleReview {
    pub fn record(
        article_id: Uuid,
        reviewer_id: Uuid,
        decision: ReviewDecision,
        comments: impl Into<String>,
        reviewed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            article_id,
            reviewer_id: Some(reviewer_id),
            decision,
            comments: comments.into(),
            reviewed_at,
        }
    }
}

// ── Comments ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: Uuid,
    pub article_id: Uuid,
    pub user_id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentWithAuthor {
    #[serde(flatten)]
    pub comment: Comment,
    pub author: UserSummary,
}

// ── Edges ───────────────────────────────────────────────────────────────────

/// The unique-edge relations handled by the toggle engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeKind {
    /// subject = user, object = article
    Clap,
    /// subject = follower, object = followed user
    Follow,
}

impl EdgeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EdgeKind::Clap => "clap",
            EdgeKind::Follow => "follow",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToggleOutcome {
    Added,
    Removed,
}

impl ToggleOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            ToggleOutcome::Added => "added",
            ToggleOutcome::Removed => "removed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClapStatus {
    pub has_clapped: bool,
    pub disabled: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FollowGraph {
    pub followers: Vec<UserSummary>,
    pub following: Vec<UserSummary>,
    pub follower_count: i64,
    pub following_count: i64,
}

// ── Notifications ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NotificationKind {
    #[serde(rename = "seguido")]
    Followed,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::Followed => "seguido",
        }
    }
}

impl FromStr for NotificationKind {
    type Err = DomainError;

    fn from_str(s: &str) -> DomainResult<Self> {
        match s {
            "seguido" => Ok(NotificationKind::Followed),
            other => Err(DomainError::validation("kind", format!("unknown notification kind '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    /// Recipient
    pub user_id: Uuid,
    pub kind: NotificationKind,
    pub message: String,
    pub link: String,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn new(
        user_id: Uuid,
        kind: NotificationKind,
        message: impl Into<String>,
        link: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            user_id,
            kind,
            message: message.into(),
            link: link.into(),
            read: false,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_round_trip_through_wire_values() {
        for status in [
            ArticleStatus::Draft,
            ArticleStatus::Pending,
            ArticleStatus::Published,
            ArticleStatus::Rejected,
        ] {
            assert_eq!(status.as_str().parse::<ArticleStatus>().unwrap(), status);
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{}\"", status.as_str()));
        }
    }

    #[test]
    fn unknown_role_is_a_validation_error() {
        let err = "superuser".parse::<Role>().unwrap_err();
        assert!(matches!(err, DomainError::Validation { ref field, .. } if field == "role"));
    }

    #[test]
    fn only_published_carries_a_timestamp() {
        let now = Utc::now();
        assert_eq!(ArticleStatus::Published.published_at(now), Some(now));
        assert_eq!(ArticleStatus::Draft.published_at(now), None);
        assert_eq!(ArticleStatus::Pending.published_at(now), None);
        assert_eq!(ArticleStatus::Rejected.published_at(now), None);
    }

    #[test]
    fn review_decision_collapses_non_published_to_rejected() {
        assert_eq!(ReviewDecision::from(ArticleStatus::Published), ReviewDecision::Approved);
        assert_eq!(ReviewDecision::from(ArticleStatus::Rejected), ReviewDecision::Rejected);
        assert_eq!(ReviewDecision::from(ArticleStatus::Draft), ReviewDecision::Rejected);
        assert_eq!(ReviewDecision::from(ArticleStatus::Pending), ReviewDecision::Rejected);
    }

    #[test]
    fn page_request_clamps_inputs() {
        let req = PageRequest::new(Some(0), Some(1_000));
        assert_eq!(req.page, 1);
        assert_eq!(req.limit, MAX_PAGE_LIMIT);
        assert_eq!(PageRequest::new(Some(3), Some(10)).offset(), 20);
        assert_eq!(PageRequest::default().limit, DEFAULT_PAGE_LIMIT);
    }

    #[test]
    fn paginated_rounds_pages_up() {
        let page = Paginated::new(vec![1, 2, 3], PageRequest::new(Some(1), Some(3)), 7);
        assert_eq!(page.pages, 3);
        let empty: Paginated<i32> = Paginated::new(vec![], PageRequest::default(), 0);
        assert_eq!(empty.pages, 0);
    }

    #[test]
    fn blank_text_query_is_ignored() {
        let filter = ArticleFilter {
            text_query: Some("   ".into()),
            ..Default::default()
        };
        assert_eq!(filter.text_query(), None);
        let filter = ArticleFilter {
            text_query: Some("  rust ".into()),
            ..Default::default()
        };
        assert_eq!(filter.text_query(), Some("rust"));
    }

    #[test]
    fn staff_gate() {
        let mut identity = Identity {
            user_id: Uuid::now_v7(),
            email: "a@b.c".into(),
            role: Role::Author,
        };
        assert!(identity.require_staff().is_err());
        identity.role = Role::Moderator;
        assert!(identity.require_staff().is_ok());
    }
}
