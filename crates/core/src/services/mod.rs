//! Business logic services.

#![allow(missing_docs)]

pub mod comment;
pub mod post;
pub mod profile;
pub mod reaction;

pub use comment::{
    AuthorSummary, CommentService, CommentWithAuthor, CreateCommentInput, UpdateCommentInput,
};
pub use post::{CreatePostInput, PostService, UpdatePostInput};
pub use profile::ProfileService;
pub use reaction::{ReactionCount, ReactionService, ReactionSummary, ToggleReactionInput};
