//! API middleware.

#![allow(missing_docs)]

use std::sync::Arc;

use axum::{body::Body, extract::State, http::Request, middleware::Next, response::Response};
use folio_common::config::PaginationConfig;
use folio_core::{CommentService, PostService, ProfileService, ReactionService};
use folio_db::repositories::{
    CommentRepository, PostRepository, ProfileRepository, ReactionRepository,
};
use sea_orm::DatabaseConnection;

/// Application state.
#[derive(Clone)]
pub struct AppState {
    pub profile_service: ProfileService,
    pub post_service: PostService,
    pub comment_service: CommentService,
    pub reaction_service: ReactionService,
}

impl AppState {
    /// Wire repositories and services over one connection pool.
    #[must_use]
    pub fn new(db: Arc<DatabaseConnection>, pagination: &PaginationConfig) -> Self {
        let profile_repo = ProfileRepository::new(Arc::clone(&db));
        let post_repo = PostRepository::new(Arc::clone(&db));
        let comment_repo = CommentRepository::new(Arc::clone(&db));
        let reaction_repo = ReactionRepository::new(db);

        let mut post_service = PostService::new(post_repo.clone());
        post_service.set_page_limits(pagination.default_limit, pagination.max_limit);

        Self {
            profile_service: ProfileService::new(profile_repo.clone()),
            post_service,
            comment_service: CommentService::new(comment_repo, post_repo.clone(), profile_repo),
            reaction_service: ReactionService::new(reaction_repo, post_repo),
        }
    }
}

/// Authentication middleware.
///
/// Resolves `Authorization: Bearer <token>` to a profile and stores it in the
/// request extensions. Unknown tokens leave the request anonymous; handlers
/// that need a profile reject it through [`crate::extractors::AuthUser`].
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    if let Some(auth_header) = req.headers().get("Authorization")
        && let Ok(auth_str) = auth_header.to_str()
        && let Some(token) = auth_str.strip_prefix("Bearer ")
    {
        match state.profile_service.authenticate_by_token(token.trim()).await {
            Ok(profile) => {
                req.extensions_mut().insert(profile);
            }
            Err(e) => {
                tracing::debug!(error = %e, "Bearer token not accepted");
            }
        }
    }

    next.run(req).await
}
