//! Reactions endpoints.

use axum::{Json, Router, extract::State, routing::post};
use folio_common::AppResult;
use folio_core::{ReactionSummary, ToggleReactionInput};
use serde::{Deserialize, Serialize};

use crate::{
    extractors::{AuthUser, MaybeAuthUser},
    middleware::AppState,
    response::ApiResponse,
};

/// Toggle reaction response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleReactionResponse {
    /// Whether the caller's reaction is present after the toggle.
    pub reacted: bool,
}

/// List reactions request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListReactionsRequest {
    pub post_id: String,
}

/// Add a reaction, or remove it if already present.
async fn toggle(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(input): Json<ToggleReactionInput>,
) -> AppResult<ApiResponse<ToggleReactionResponse>> {
    let reacted = state.reaction_service.toggle(&user.id, input).await?;
    Ok(ApiResponse::ok(ToggleReactionResponse { reacted }))
}

/// Reaction counts on a post.
async fn list(
    viewer: MaybeAuthUser,
    State(state): State<AppState>,
    Json(req): Json<ListReactionsRequest>,
) -> AppResult<ApiResponse<ReactionSummary>> {
    let summary = state
        .reaction_service
        .summary(&req.post_id, viewer.id())
        .await?;
    Ok(ApiResponse::ok(summary))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/toggle", post(toggle))
        .route("/list", post(list))
}
