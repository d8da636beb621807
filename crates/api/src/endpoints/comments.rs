//! Comments endpoints.

use axum::{Json, Router, extract::State, routing::post};
use folio_common::AppResult;
use folio_core::{
    CommentThread, CommentWithAuthor, CreateCommentInput, UpdateCommentInput, forest_size,
};
use folio_db::entities::comment;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    extractors::{AuthUser, MaybeAuthUser},
    middleware::AppState,
    response::ApiResponse,
};

/// Comment response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentResponse {
    pub id: String,
    pub post_id: String,
    pub author_id: String,
    pub parent_comment_id: Option<String>,
    pub content: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<comment::Model> for CommentResponse {
    fn from(comment: comment::Model) -> Self {
        Self {
            id: comment.id,
            post_id: comment.post_id,
            author_id: comment.author_id,
            parent_comment_id: comment.parent_comment_id,
            content: comment.content,
            created_at: comment.created_at.to_rfc3339(),
            updated_at: comment.updated_at.to_rfc3339(),
        }
    }
}

/// Delete comment request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteCommentRequest {
    pub comment_id: String,
}

/// Thread request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreadRequest {
    pub post_id: String,
}

/// Comment on a post or reply to a comment.
async fn create(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateCommentInput>,
) -> AppResult<ApiResponse<CommentResponse>> {
    let comment = state.comment_service.create(&user.id, input).await?;
    Ok(ApiResponse::ok(comment.into()))
}

/// Edit a comment.
async fn update(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(input): Json<UpdateCommentInput>,
) -> AppResult<ApiResponse<CommentResponse>> {
    let comment = state.comment_service.update(&user.id, input).await?;
    Ok(ApiResponse::ok(comment.into()))
}

/// Delete a comment and its replies.
async fn delete(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<DeleteCommentRequest>,
) -> AppResult<ApiResponse<()>> {
    state
        .comment_service
        .delete(&req.comment_id, &user.id)
        .await?;
    Ok(ApiResponse::ok(()))
}

/// All comments on a post as a reply forest.
async fn thread(
    viewer: MaybeAuthUser,
    State(state): State<AppState>,
    Json(req): Json<ThreadRequest>,
) -> ApiResponse<Vec<CommentThread<CommentWithAuthor>>> {
    let forest = state
        .comment_service
        .threaded_comments(&req.post_id, viewer.id())
        .await;
    debug!(
        post_id = %req.post_id,
        roots = forest.len(),
        comments = forest_size(&forest),
        "Built comment thread"
    );
    ApiResponse::ok(forest)
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/create", post(create))
        .route("/update", post(update))
        .route("/delete", post(delete))
        .route("/thread", post(thread))
}
