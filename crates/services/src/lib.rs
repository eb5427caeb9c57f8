//! # services
//!
//! Business rules of Pressroom, written against the `domains` ports only.
//! Every operation receives the caller's `Identity` explicitly.

pub mod articles;
pub mod comments;
pub mod interactions;
pub mod moderation;
pub mod notifications;
pub mod profiles;
pub mod reviews;
pub mod toggle;

use std::sync::Arc;

use domains::{
    ArticleRepository, CommentRepository, EdgeRepository, NotificationRepository,
    ReviewRepository, UserRepository,
};

pub use articles::{ArticleService, NewArticleInput};
pub use comments::CommentService;
pub use interactions::{ClapService, ClapToggle, FollowService, FollowToggle};
pub use moderation::ModerationService;
pub use notifications::{FollowNotifier, NotificationEmitter};
pub use profiles::ProfileService;
pub use reviews::ReviewLedger;
pub use toggle::{EdgeHook, EdgePolicy, ToggleEngine};

/// The set of ports the services are built from.
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub articles: Arc<dyn ArticleRepository>,
    pub reviews: Arc<dyn ReviewRepository>,
    pub edges: Arc<dyn EdgeRepository>,
    pub comments: Arc<dyn CommentRepository>,
    pub notifications: Arc<dyn NotificationRepository>,
}

impl Repositories {
    /// Uses one store that implements every port (e.g. the SQLite adapter).
    pub fn from_store<S>(store: S) -> Self
    where
        S: UserRepository
            + ArticleRepository
            + ReviewRepository
            + EdgeRepository
            + CommentRepository
            + NotificationRepository
            + 'static,
    {
        let store = Arc::new(store);
        Self {
            users: store.clone(),
            articles: store.clone(),
            reviews: store.clone(),
            edges: store.clone(),
            comments: store.clone(),
            notifications: store,
        }
    }
}

/// Runtime switches for individual operations.
#[derive(Debug, Clone, Copy)]
pub struct ServiceOptions {
    pub claps_enabled: bool,
}

impl Default for ServiceOptions {
    fn default() -> Self {
        Self { claps_enabled: true }
    }
}

/// Every service, wired against one set of repositories.
#[derive(Clone)]
pub struct Services {
    pub articles: Arc<ArticleService>,
    pub claps: Arc<ClapService>,
    pub follows: Arc<FollowService>,
    pub reviews: Arc<ReviewLedger>,
    pub moderation: Arc<ModerationService>,
    pub notifications: NotificationEmitter,
    pub comments: Arc<CommentService>,
    pub profiles: Arc<ProfileService>,
}

impl Services {
    pub fn new(repos: Repositories, options: ServiceOptions) -> Self {
        let notifications = NotificationEmitter::new(repos.notifications.clone());
        let notifier = Arc::new(FollowNotifier::new(repos.users.clone(), notifications.clone()));

        Self {
            articles: Arc::new(ArticleService::new(repos.articles.clone())),
            claps: Arc::new(ClapService::new(
                repos.edges.clone(),
                repos.articles.clone(),
                options.claps_enabled,
            )),
            follows: Arc::new(FollowService::new(repos.edges.clone(), repos.users.clone(), notifier)),
            reviews: Arc::new(ReviewLedger::new(repos.reviews.clone(), repos.articles.clone())),
            moderation: Arc::new(ModerationService::new(repos.articles.clone(), repos.users.clone())),
            notifications,
            comments: Arc::new(CommentService::new(repos.comments.clone(), repos.articles.clone())),
            profiles: Arc::new(ProfileService::new(repos.users)),
        }
    }
}
