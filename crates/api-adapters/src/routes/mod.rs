//! Route table. Every path lives under `/api` except `/health` and `/metrics`.

mod admin;
mod articles;
mod system;
mod users;

use axum::routing::{delete, get, post};
use axum::{middleware, Router};
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route("/articles", post(articles::create).get(articles::list_own))
        .route("/articles/feed", get(articles::feed))
        .route("/articles/{id}", get(articles::get_one).delete(articles::delete))
        .route("/articles/{id}/clap", post(articles::toggle_clap))
        .route("/articles/{id}/clap-status", get(articles::clap_status))
        .route(
            "/articles/{id}/comments",
            get(articles::list_comments).post(articles::add_comment),
        )
        .route(
            "/articles/{id}/reviews",
            get(articles::list_reviews).post(articles::append_review),
        )
        .route("/users/{id}", get(users::profile))
        .route("/users/{id}/follow", post(users::toggle_follow).get(users::follow_graph))
        .route("/profile", post(users::update_profile))
        .route("/notifications", get(users::notifications))
        .route(
            "/admin/articles",
            get(admin::list_articles).patch(admin::update_status),
        )
        .route("/admin/articles/{id}", delete(admin::delete_article))
        .route("/admin/users", get(admin::list_users).patch(admin::update_role))
        .route("/admin/users/{id}", delete(admin::delete_user));

    Router::new()
        .nest("/api", api)
        .route("/health", get(system::health))
        .route("/metrics", get(system::metrics))
        .layer(middleware::from_fn_with_state(
            state.metrics.clone(),
            system::track_errors,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
