//! Seeds one demo user per role and prints a bearer token for each.
//! Safe to run repeatedly: existing users are reused.

use std::sync::Arc;

use anyhow::Context;
use auth_adapters::JwtIdentityGate;
use configs::Settings;
use domains::{Role, User, UserRepository};
use storage_adapters::SqliteStore;
use tracing::info;

const DEMO_USERS: [(&str, &str, Role); 4] = [
    ("Leitora Demo", "leitor@pressroom.local", Role::Reader),
    ("Autora Demo", "autor@pressroom.local", Role::Author),
    ("Moderador Demo", "moderador@pressroom.local", Role::Moderator),
    ("Admin Demo", "admin@pressroom.local", Role::Admin),
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();
    let settings = Settings::load().context("loading configuration")?;

    let store = Arc::new(
        SqliteStore::connect(&settings.database.url, settings.database.max_connections)
            .await
            .with_context(|| format!("opening database {}", settings.database.url))?,
    );
    let gate = JwtIdentityGate::new(
        &settings.auth.jwt_secret,
        store.clone(),
        settings.auth.token_ttl_secs,
    );

    for (name, email, role) in DEMO_USERS {
        let user = match store.find_by_email(email).await? {
            Some(existing) => existing,
            None => {
                let created = store.create(User::new(name, email, role)).await?;
                info!(user_id = %created.id, %role, "seeded user");
                created
            }
        };
        let token = gate.issue(&user)?;
        println!("{:<10} {:<28} {}", user.role.as_str(), user.email, token);
    }
    Ok(())
}
