//! Claps (user → article) and follows (user → user) on top of the toggle engine.

use std::sync::Arc;

use domains::{
    ArticleRepository, ClapStatus, DomainError, DomainResult, EdgeRepository, FollowGraph,
    Identity, ToggleOutcome, UserRepository,
};
use serde::Serialize;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::toggle::{EdgeHook, EdgePolicy, ToggleEngine};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ClapToggle {
    pub action: ToggleOutcome,
    pub clap_count: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FollowToggle {
    pub action: ToggleOutcome,
    pub follower_count: i64,
}

pub struct ClapService {
    engine: ToggleEngine,
    articles: Arc<dyn ArticleRepository>,
    enabled: bool,
}

impl ClapService {
    pub fn new(
        edges: Arc<dyn EdgeRepository>,
        articles: Arc<dyn ArticleRepository>,
        enabled: bool,
    ) -> Self {
        Self {
            engine: ToggleEngine::new(edges, EdgePolicy::clap()),
            articles,
            enabled,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    #[instrument(skip(self), fields(user_id = %identity.user_id))]
    pub async fn toggle_clap(&self, identity: &Identity, article_id: Uuid) -> DomainResult<ClapToggle> {
        if !self.enabled {
            return Err(DomainError::FeatureDisabled("claps".into()));
        }
        self.ensure_article(article_id).await?;

        let action = self.engine.toggle(identity.user_id, article_id).await?;
        let clap_count = self.engine.count_for_object(article_id).await?;
        info!(%article_id, action = action.as_str(), clap_count, "clap toggled");
        Ok(ClapToggle { action, clap_count })
    }

    pub async fn clap_status(&self, identity: &Identity, article_id: Uuid) -> DomainResult<ClapStatus> {
        if !self.enabled {
            return Ok(ClapStatus {
                has_clapped: false,
                disabled: true,
            });
        }
        self.ensure_article(article_id).await?;
        let has_clapped = self.engine.is_linked(identity.user_id, article_id).await?;
        Ok(ClapStatus {
            has_clapped,
            disabled: false,
        })
    }

    pub async fn clap_count(&self, article_id: Uuid) -> DomainResult<i64> {
        self.engine.count_for_object(article_id).await
    }

    async fn ensure_article(&self, article_id: Uuid) -> DomainResult<()> {
        match self.articles.find(article_id).await? {
            Some(_) => Ok(()),
            None => Err(DomainError::not_found("article", article_id)),
        }
    }
}

pub struct FollowService {
    engine: ToggleEngine,
    users: Arc<dyn UserRepository>,
}

impl FollowService {
    pub fn new(
        edges: Arc<dyn EdgeRepository>,
        users: Arc<dyn UserRepository>,
        on_follow: Arc<dyn EdgeHook>,
    ) -> Self {
        Self {
            engine: ToggleEngine::new(edges, EdgePolicy::follow().with_hook(on_follow)),
            users,
        }
    }

    #[instrument(skip(self), fields(follower_id = %identity.user_id))]
    pub async fn toggle_follow(&self, identity: &Identity, target_id: Uuid) -> DomainResult<FollowToggle> {
        self.engine.policy().check(identity.user_id, target_id)?;
        self.ensure_user(target_id).await?;

        let action = self.engine.toggle(identity.user_id, target_id).await?;
        let follower_count = self.engine.count_for_object(target_id).await?;
        info!(%target_id, action = action.as_str(), follower_count, "follow toggled");
        Ok(FollowToggle {
            action,
            follower_count,
        })
    }

    pub async fn follow_graph(&self, user_id: Uuid) -> DomainResult<FollowGraph> {
        self.ensure_user(user_id).await?;
        let followers = self.users.followers(user_id).await?;
        let following = self.users.following(user_id).await?;
        Ok(FollowGraph {
            follower_count: self.engine.count_for_object(user_id).await?,
            following_count: self.engine.count_for_subject(user_id).await?,
            followers,
            following,
        })
    }

    pub async fn follower_count(&self, user_id: Uuid) -> DomainResult<i64> {
        self.engine.count_for_object(user_id).await
    }

    pub async fn following_count(&self, user_id: Uuid) -> DomainResult<i64> {
        self.engine.count_for_subject(user_id).await
    }

    pub async fn is_following(&self, identity: &Identity, target_id: Uuid) -> DomainResult<bool> {
        self.engine.is_linked(identity.user_id, target_id).await
    }

    async fn ensure_user(&self, user_id: Uuid) -> DomainResult<()> {
        match self.users.find_by_id(user_id).await? {
            Some(_) => Ok(()),
            None => Err(DomainError::not_found("user", user_id)),
        }
    }
}
