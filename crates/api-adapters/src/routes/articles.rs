use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use domains::{
    ArticleDetails, ArticleReview, ArticleStatus, ClapStatus, CommentWithAuthor, EdgeKind,
    PageRequest, Paginated, ReviewDecision,
};
use services::{ClapToggle, NewArticleInput};

use crate::error::ApiResult;
use crate::extract::{CurrentIdentity, JsonBody, PathParam, QueryParams};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct OwnArticlesQuery {
    pub status: Option<ArticleStatus>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct FeedQuery {
    pub limit: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct CommentBody {
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct ReviewBody {
    pub decision: ReviewDecision,
    pub comments: String,
}

pub async fn create(
    State(state): State<AppState>,
    CurrentIdentity(identity): CurrentIdentity,
    JsonBody(input): JsonBody<NewArticleInput>,
) -> ApiResult<(StatusCode, Json<ArticleDetails>)> {
    let details = state.services.articles.create_article(&identity, input).await?;
    Ok((StatusCode::CREATED, Json(details)))
}

pub async fn list_own(
    State(state): State<AppState>,
    CurrentIdentity(identity): CurrentIdentity,
    QueryParams(query): QueryParams<OwnArticlesQuery>,
) -> ApiResult<Json<Paginated<ArticleDetails>>> {
    let page = PageRequest::new(query.page, query.limit);
    let listing = state
        .services
        .articles
        .list_own_articles(&identity, query.status, page)
        .await?;
    Ok(Json(listing))
}

pub async fn feed(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<FeedQuery>,
) -> ApiResult<Json<Vec<ArticleDetails>>> {
    Ok(Json(state.services.articles.published_feed(query.limit).await?))
}

pub async fn get_one(
    State(state): State<AppState>,
    PathParam(id): PathParam<Uuid>,
) -> ApiResult<Json<ArticleDetails>> {
    Ok(Json(state.services.articles.get_article(id).await?))
}

pub async fn delete(
    State(state): State<AppState>,
    CurrentIdentity(identity): CurrentIdentity,
    PathParam(id): PathParam<Uuid>,
) -> ApiResult<StatusCode> {
    state.services.articles.delete_article(&identity, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn toggle_clap(
    State(state): State<AppState>,
    CurrentIdentity(identity): CurrentIdentity,
    PathParam(id): PathParam<Uuid>,
) -> ApiResult<Json<ClapToggle>> {
    let toggled = state.services.claps.toggle_clap(&identity, id).await?;
    state.metrics.record_toggle(EdgeKind::Clap, toggled.action);
    Ok(Json(toggled))
}

pub async fn clap_status(
    State(state): State<AppState>,
    CurrentIdentity(identity): CurrentIdentity,
    PathParam(id): PathParam<Uuid>,
) -> ApiResult<Json<ClapStatus>> {
    Ok(Json(state.services.claps.clap_status(&identity, id).await?))
}

pub async fn list_comments(
    State(state): State<AppState>,
    PathParam(id): PathParam<Uuid>,
) -> ApiResult<Json<Vec<CommentWithAuthor>>> {
    Ok(Json(state.services.comments.list_comments(id).await?))
}

pub async fn add_comment(
    State(state): State<AppState>,
    CurrentIdentity(identity): CurrentIdentity,
    PathParam(id): PathParam<Uuid>,
    JsonBody(body): JsonBody<CommentBody>,
) -> ApiResult<(StatusCode, Json<CommentWithAuthor>)> {
    let comment = state
        .services
        .comments
        .add_comment(&identity, id, &body.content)
        .await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

pub async fn list_reviews(
    State(state): State<AppState>,
    CurrentIdentity(identity): CurrentIdentity,
    PathParam(id): PathParam<Uuid>,
) -> ApiResult<Json<Vec<ArticleReview>>> {
    Ok(Json(state.services.reviews.list_reviews(&identity, id).await?))
}

pub async fn append_review(
    State(state): State<AppState>,
    CurrentIdentity(identity): CurrentIdentity,
    PathParam(id): PathParam<Uuid>,
    JsonBody(body): JsonBody<ReviewBody>,
) -> ApiResult<(StatusCode, Json<ArticleReview>)> {
    let review = state
        .services
        .reviews
        .append_review(&identity, id, body.decision, &body.comments)
        .await?;
    Ok((StatusCode::CREATED, Json(review)))
}
