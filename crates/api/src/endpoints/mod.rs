//! API endpoints.

mod comments;
mod posts;
mod reactions;

use axum::Router;

use crate::middleware::AppState;

pub use comments::CommentResponse;
pub use posts::PostResponse;

/// Create the API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .nest("/posts", posts::router())
        .nest("/comments", comments::router())
        .nest("/reactions", reactions::router())
}
