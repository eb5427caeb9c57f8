//! Staff endpoints. The role gate itself lives in the services.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use domains::{
    Article, ArticleDetails, ArticleFilter, ArticleStatus, PageRequest, Paginated, Role, User,
    UserWithCounts,
};

use crate::error::ApiResult;
use crate::extract::{CurrentIdentity, JsonBody, PathParam, QueryParams};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ArticlesQuery {
    pub status: Option<ArticleStatus>,
    pub author_id: Option<Uuid>,
    pub q: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct UsersQuery {
    pub role: Option<Role>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct StatusBody {
    pub article_id: Uuid,
    pub status: ArticleStatus,
    #[serde(default)]
    pub comments: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RoleBody {
    pub user_id: Uuid,
    pub role: Role,
}

pub async fn list_articles(
    State(state): State<AppState>,
    CurrentIdentity(identity): CurrentIdentity,
    QueryParams(query): QueryParams<ArticlesQuery>,
) -> ApiResult<Json<Paginated<ArticleDetails>>> {
    let filter = ArticleFilter {
        author_id: query.author_id,
        status: query.status,
        text_query: query.q,
    };
    let page = PageRequest::new(query.page, query.limit);
    let listing = state
        .services
        .moderation
        .list_articles_for_moderation(&identity, filter, page)
        .await?;
    Ok(Json(listing))
}

pub async fn update_status(
    State(state): State<AppState>,
    CurrentIdentity(identity): CurrentIdentity,
    JsonBody(body): JsonBody<StatusBody>,
) -> ApiResult<Json<Article>> {
    let updated = state
        .services
        .articles
        .update_status(&identity, body.article_id, body.status, body.comments)
        .await?;
    state.metrics.record_decision(updated.status);
    Ok(Json(updated))
}

pub async fn delete_article(
    State(state): State<AppState>,
    CurrentIdentity(identity): CurrentIdentity,
    PathParam(id): PathParam<Uuid>,
) -> ApiResult<StatusCode> {
    identity.require_staff()?;
    state.services.articles.delete_article(&identity, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_users(
    State(state): State<AppState>,
    CurrentIdentity(identity): CurrentIdentity,
    QueryParams(query): QueryParams<UsersQuery>,
) -> ApiResult<Json<Paginated<UserWithCounts>>> {
    let page = PageRequest::new(query.page, query.limit);
    let listing = state
        .services
        .moderation
        .list_users_for_moderation(&identity, query.role, page)
        .await?;
    Ok(Json(listing))
}

pub async fn update_role(
    State(state): State<AppState>,
    CurrentIdentity(identity): CurrentIdentity,
    JsonBody(body): JsonBody<RoleBody>,
) -> ApiResult<Json<User>> {
    let updated = state
        .services
        .moderation
        .update_user_role(&identity, body.user_id, body.role)
        .await?;
    Ok(Json(updated))
}

pub async fn delete_user(
    State(state): State<AppState>,
    CurrentIdentity(identity): CurrentIdentity,
    PathParam(id): PathParam<Uuid>,
) -> ApiResult<StatusCode> {
    state.services.moderation.delete_user(&identity, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
