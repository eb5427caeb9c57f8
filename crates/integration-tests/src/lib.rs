//! Shared fixtures: the full Pressroom stack on SQLite, in memory or in a temp file.

use std::path::PathBuf;
use std::sync::Arc;

use api_adapters::{router, AppState};
use auth_adapters::JwtIdentityGate;
use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use domains::{ArticleDetails, ArticleStatus, Identity, Role, User, UserRepository};
use fake::faker::name::en::Name;
use fake::Fake;
use secrecy::SecretString;
use serde_json::Value;
use services::{NewArticleInput, Repositories, ServiceOptions, Services};
use storage_adapters::SqliteStore;
use tower::ServiceExt;
use uuid::Uuid;

pub const TEST_SECRET: &str = "integration-test-secret";

pub struct TestApp {
    pub store: SqliteStore,
    pub services: Services,
    pub gate: Arc<JwtIdentityGate>,
    pub router: Router,
    _db_file: Option<TempDb>,
}

/// A database file under the system temp dir, removed with its journals on drop.
struct TempDb(PathBuf);

impl Drop for TempDb {
    fn drop(&mut self) {
        for suffix in ["", "-journal", "-wal", "-shm"] {
            let mut path = self.0.clone().into_os_string();
            path.push(suffix);
            let _ = std::fs::remove_file(path);
        }
    }
}

impl TestApp {
    pub async fn spawn() -> Self {
        Self::with_options(ServiceOptions::default()).await
    }

    pub async fn with_options(options: ServiceOptions) -> Self {
        let store = SqliteStore::in_memory()
            .await
            .expect("in-memory store should open");
        Self::assemble(store, options, None)
    }

    /// A file-backed store with a real connection pool, so that concurrent
    /// requests actually interleave at the database.
    pub async fn on_disk(max_connections: u32) -> Self {
        let path = std::env::temp_dir().join(format!("pressroom-{}.db", Uuid::now_v7().simple()));
        let db = TempDb(path);
        let url = format!("sqlite://{}", db.0.display());
        let store = SqliteStore::connect(&url, max_connections)
            .await
            .expect("file store should open");
        Self::assemble(store, ServiceOptions::default(), Some(db))
    }

    fn assemble(store: SqliteStore, options: ServiceOptions, db_file: Option<TempDb>) -> Self {
        let repos = Repositories::from_store(store.clone());
        let gate = Arc::new(JwtIdentityGate::new(
            &SecretString::from(TEST_SECRET.to_string()),
            repos.users.clone(),
            3600,
        ));
        let services = Services::new(repos, options);
        let router = router(AppState::new(services.clone(), gate.clone()));
        Self {
            store,
            services,
            gate,
            router,
            _db_file: db_file,
        }
    }

    /// Stores a user with a generated name and a unique email.
    pub async fn user(&self, role: Role) -> (User, Identity) {
        let name: String = Name().fake();
        let email = format!("{}@example.test", Uuid::now_v7().simple());
        let user = self
            .store
            .create(User::new(name, email, role))
            .await
            .expect("user should be created");
        let identity = Identity {
            user_id: user.id,
            email: user.email.clone(),
            role,
        };
        (user, identity)
    }

    pub fn token(&self, user: &User) -> String {
        self.gate.issue(user).expect("token should be signed")
    }

    /// Creates an article through the service; staff identities may pick any status.
    pub async fn article(&self, author: &Identity, status: ArticleStatus) -> ArticleDetails {
        self.services
            .articles
            .create_article(
                author,
                NewArticleInput {
                    title: "Hello".into(),
                    content: "World".into(),
                    status,
                    tags: vec!["Rust".into(), "rust".into(), "news".into()],
                    ..Default::default()
                },
            )
            .await
            .expect("article should be created")
    }

    /// Sends one request through the router and decodes the JSON body
    /// (`Value::Null` when the body is empty).
    pub async fn request(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("request should build");

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body should be readable");
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, json)
    }
}
