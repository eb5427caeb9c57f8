//! # Interaction Toggle Engine
//!
//! One "toggle a unique edge" implementation shared by claps and follows.
//! Each call flips the existence of the (subject, object) edge. The store's
//! primary key on the pair is the only concurrency control: a single-statement
//! delete decides `Removed`, and an insert that loses a race to a concurrent
//! toggle surfaces as `Conflict`, which is reported as `Added`.

use std::sync::Arc;

use async_trait::async_trait;
use domains::{DomainError, DomainResult, EdgeKind, EdgeRepository, ToggleOutcome};
use tracing::{debug, warn};
use uuid::Uuid;

/// Side effect run after a fresh edge is created.
#[async_trait]
pub trait EdgeHook: Send + Sync {
    async fn on_created(&self, subject: Uuid, object: Uuid) -> DomainResult<()>;
}

/// Per-edge-type rules.
#[derive(Clone)]
pub struct EdgePolicy {
    pub kind: EdgeKind,
    pub allow_self: bool,
    pub self_reference_message: &'static str,
    pub on_created: Option<Arc<dyn EdgeHook>>,
}

impl EdgePolicy {
    /// user → article; subject and object are different entity kinds.
    pub fn clap() -> Self {
        Self {
            kind: EdgeKind::Clap,
            allow_self: true,
            self_reference_message: "",
            on_created: None,
        }
    }

    /// follower → followed user.
    pub fn follow() -> Self {
        Self {
            kind: EdgeKind::Follow,
            allow_self: false,
            self_reference_message: "cannot follow self",
            on_created: None,
        }
    }

    pub fn with_hook(mut self, hook: Arc<dyn EdgeHook>) -> Self {
        self.on_created = Some(hook);
        self
    }

    pub fn check(&self, subject: Uuid, object: Uuid) -> DomainResult<()> {
        if !self.allow_self && subject == object {
            return Err(DomainError::validation("target", self.self_reference_message));
        }
        Ok(())
    }
}

pub struct ToggleEngine {
    edges: Arc<dyn EdgeRepository>,
    policy: EdgePolicy,
}

impl ToggleEngine {
    pub fn new(edges: Arc<dyn EdgeRepository>, policy: EdgePolicy) -> Self {
        Self { edges, policy }
    }

    pub fn policy(&self) -> &EdgePolicy {
        &self.policy
    }

    pub async fn toggle(&self, subject: Uuid, object: Uuid) -> DomainResult<ToggleOutcome> {
        self.policy.check(subject, object)?;
        let kind = self.policy.kind;

        if self.edges.remove(kind, subject, object).await? {
            debug!(edge = kind.as_str(), %subject, %object, "edge removed");
            return Ok(ToggleOutcome::Removed);
        }

        match self.edges.insert(kind, subject, object).await {
            Ok(()) => {}
            Err(err) if err.is_conflict() => {
                debug!(edge = kind.as_str(), %subject, %object, "edge created concurrently");
                return Ok(ToggleOutcome::Added);
            }
            Err(err) => return Err(err),
        }
        debug!(edge = kind.as_str(), %subject, %object, "edge created");

        if let Some(hook) = &self.policy.on_created {
            if let Err(err) = hook.on_created(subject, object).await {
                warn!(edge = kind.as_str(), %subject, %object, error = %err, "edge hook failed");
            }
        }
        Ok(ToggleOutcome::Added)
    }

    pub async fn is_linked(&self, subject: Uuid, object: Uuid) -> DomainResult<bool> {
        self.edges.exists(self.policy.kind, subject, object).await
    }

    /// Live edges pointing at `object` (claps on an article, followers of a user).
    pub async fn count_for_object(&self, object: Uuid) -> DomainResult<i64> {
        self.edges.count_by_object(self.policy.kind, object).await
    }

    /// Live edges leaving `subject` (users followed by a user).
    pub async fn count_for_subject(&self, subject: Uuid) -> DomainResult<i64> {
        self.edges.count_by_subject(self.policy.kind, subject).await
    }
}
