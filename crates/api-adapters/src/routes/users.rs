use axum::extract::State;
use axum::Json;
use uuid::Uuid;

use domains::{EdgeKind, FollowGraph, Notification, ProfileUpdate, User, UserWithCounts};
use services::FollowToggle;

use crate::error::ApiResult;
use crate::extract::{CurrentIdentity, JsonBody, PathParam};
use crate::state::AppState;

pub async fn profile(
    State(state): State<AppState>,
    PathParam(id): PathParam<Uuid>,
) -> ApiResult<Json<UserWithCounts>> {
    Ok(Json(state.services.profiles.get_profile(id).await?))
}

pub async fn toggle_follow(
    State(state): State<AppState>,
    CurrentIdentity(identity): CurrentIdentity,
    PathParam(id): PathParam<Uuid>,
) -> ApiResult<Json<FollowToggle>> {
    let toggled = state.services.follows.toggle_follow(&identity, id).await?;
    state.metrics.record_toggle(EdgeKind::Follow, toggled.action);
    Ok(Json(toggled))
}

pub async fn follow_graph(
    State(state): State<AppState>,
    PathParam(id): PathParam<Uuid>,
) -> ApiResult<Json<FollowGraph>> {
    Ok(Json(state.services.follows.follow_graph(id).await?))
}

pub async fn update_profile(
    State(state): State<AppState>,
    CurrentIdentity(identity): CurrentIdentity,
    JsonBody(update): JsonBody<ProfileUpdate>,
) -> ApiResult<Json<User>> {
    Ok(Json(state.services.profiles.update_profile(&identity, update).await?))
}

pub async fn notifications(
    State(state): State<AppState>,
    CurrentIdentity(identity): CurrentIdentity,
) -> ApiResult<Json<Vec<Notification>>> {
    Ok(Json(state.services.notifications.list_for(&identity).await?))
}
