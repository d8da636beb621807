//! Posts endpoints.

use axum::{Json, Router, extract::State, routing::post};
use folio_common::{AppResult, PaginatedResult};
use folio_core::{CreatePostInput, UpdatePostInput};
use folio_db::entities::post::{self, Category, Status};
use serde::{Deserialize, Serialize};

use crate::{
    extractors::{AuthUser, MaybeAuthUser},
    middleware::AppState,
    response::ApiResponse,
};

/// Post response.
#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct PostResponse {
    pub id: String,
    pub author_id: String,
    pub title: String,
    pub content: String,
    pub category: Category,
    pub status: Status,
    pub created_at: String,
    pub updated_at: String,
}

impl From<post::Model> for PostResponse {
    fn from(post: post::Model) -> Self {
        Self {
            id: post.id,
            author_id: post.author_id,
            title: post.title,
            content: post.content,
            category: post.category,
            status: post.status,
            created_at: post.created_at.to_rfc3339(),
            updated_at: post.updated_at.to_rfc3339(),
        }
    }
}

/// Single post request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostIdRequest {
    pub post_id: String,
}

/// Public feed request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedRequest {
    pub cursor: Option<String>,
    pub limit: Option<u64>,
    pub category: Option<Category>,
}

/// Own posts request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MyPostsRequest {
    pub cursor: Option<String>,
    pub limit: Option<u64>,
}

/// Create a new post.
async fn create(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreatePostInput>,
) -> AppResult<ApiResponse<PostResponse>> {
    let post = state.post_service.create(&user.id, input).await?;
    Ok(ApiResponse::ok(post.into()))
}

/// Update a post's title, content, category or status.
async fn update(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(input): Json<UpdatePostInput>,
) -> AppResult<ApiResponse<PostResponse>> {
    let post = state.post_service.update(&user.id, input).await?;
    Ok(ApiResponse::ok(post.into()))
}

/// Delete a post.
async fn delete(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<PostIdRequest>,
) -> AppResult<ApiResponse<()>> {
    state.post_service.delete(&req.post_id, &user.id).await?;
    Ok(ApiResponse::ok(()))
}

/// Show one post.
async fn show(
    viewer: MaybeAuthUser,
    State(state): State<AppState>,
    Json(req): Json<PostIdRequest>,
) -> AppResult<ApiResponse<PostResponse>> {
    let post = state.post_service.get(&req.post_id, viewer.id()).await?;
    Ok(ApiResponse::ok(post.into()))
}

/// Published posts, newest first.
async fn feed(
    State(state): State<AppState>,
    Json(req): Json<FeedRequest>,
) -> ApiResponse<PaginatedResult<PostResponse>> {
    let page = state
        .post_service
        .feed(req.cursor.as_deref(), req.limit, req.category)
        .await;
    ApiResponse::ok(page.map(PostResponse::from))
}

/// The caller's own posts, drafts included, most recently edited first.
async fn mine(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<MyPostsRequest>,
) -> ApiResponse<PaginatedResult<PostResponse>> {
    let page = state
        .post_service
        .my_posts(&user.id, req.cursor.as_deref(), req.limit)
        .await;
    ApiResponse::ok(page.map(PostResponse::from))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/create", post(create))
        .route("/update", post(update))
        .route("/delete", post(delete))
        .route("/show", post(show))
        .route("/feed", post(feed))
        .route("/mine", post(mine))
}
