//! Comment service.

use std::collections::HashMap;

use chrono::{DateTime, FixedOffset, Utc};
use folio_common::{AppError, AppResult, IdGenerator};
use folio_db::{
    entities::{
        comment,
        post::{self, Status},
        profile,
    },
    repositories::{CommentRepository, PostRepository, ProfileRepository},
};
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::thread::{CommentThread, ThreadItem, build_threads};

/// Comment service for business logic.
#[derive(Clone)]
pub struct CommentService {
    comment_repo: CommentRepository,
    post_repo: PostRepository,
    profile_repo: ProfileRepository,
    id_gen: IdGenerator,
}

/// Input for creating a comment or a reply.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateCommentInput {
    pub post_id: String,

    #[validate(length(min = 1, max = 10_000))]
    pub content: String,

    /// Comment being replied to, on the same post.
    pub parent_comment_id: Option<String>,
}

/// Input for editing a comment.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCommentInput {
    pub comment_id: String,

    #[validate(length(min = 1, max = 10_000))]
    pub content: String,
}

/// Public part of a comment author's profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorSummary {
    pub id: String,
    pub username: String,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
}

impl From<profile::Model> for AuthorSummary {
    fn from(profile: profile::Model) -> Self {
        Self {
            id: profile.id,
            username: profile.username,
            display_name: profile.display_name,
            avatar_url: profile.avatar_url,
        }
    }
}

/// A comment annotated with its author, as placed in a thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentWithAuthor {
    pub id: String,
    pub post_id: String,
    pub author_id: String,
    pub parent_comment_id: Option<String>,
    pub content: String,
    pub created_at: DateTime<FixedOffset>,
    pub updated_at: DateTime<FixedOffset>,
    /// `None` when the author profile no longer exists.
    pub author: Option<AuthorSummary>,
}

impl CommentWithAuthor {
    fn new(comment: comment::Model, author: Option<AuthorSummary>) -> Self {
        Self {
            id: comment.id,
            post_id: comment.post_id,
            author_id: comment.author_id,
            parent_comment_id: comment.parent_comment_id,
            content: comment.content,
            created_at: comment.created_at,
            updated_at: comment.updated_at,
            author,
        }
    }
}

impl ThreadItem for CommentWithAuthor {
    fn thread_id(&self) -> &str {
        &self.id
    }

    fn parent_thread_id(&self) -> Option<&str> {
        self.parent_comment_id.as_deref()
    }
}

impl CommentService {
    /// Create a new comment service.
    #[must_use]
    pub fn new(
        comment_repo: CommentRepository,
        post_repo: PostRepository,
        profile_repo: ProfileRepository,
    ) -> Self {
        Self {
            comment_repo,
            post_repo,
            profile_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Load a post that `viewer_id` can see, hiding other people's drafts.
    async fn visible_post(&self, post_id: &str, viewer_id: &str) -> AppResult<post::Model> {
        let post = self.post_repo.get_by_id(post_id).await?;
        if !post.is_visible_to(Some(viewer_id)) {
            return Err(AppError::PostNotFound(post_id.to_string()));
        }
        Ok(post)
    }

    /// Comment on a published post, optionally replying to another comment on it.
    pub async fn create(
        &self,
        author_id: &str,
        input: CreateCommentInput,
    ) -> AppResult<comment::Model> {
        input.validate()?;

        let post = self.visible_post(&input.post_id, author_id).await?;
        if post.status != Status::Published {
            return Err(AppError::Forbidden(
                "Cannot comment on a draft post".to_string(),
            ));
        }

        if let Some(ref parent_id) = input.parent_comment_id {
            let parent = self
                .comment_repo
                .find_by_id(parent_id)
                .await?
                .ok_or_else(|| AppError::BadRequest("Parent comment not found".to_string()))?;

            if parent.post_id != post.id {
                return Err(AppError::BadRequest(
                    "Parent comment belongs to another post".to_string(),
                ));
            }
        }

        let now = Utc::now().fixed_offset();
        let model = comment::ActiveModel {
            id: Set(self.id_gen.generate()),
            post_id: Set(post.id),
            author_id: Set(author_id.to_string()),
            parent_comment_id: Set(input.parent_comment_id),
            content: Set(input.content),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let comment = self.comment_repo.create(model).await?;
        tracing::debug!(
            comment_id = %comment.id,
            post_id = %comment.post_id,
            parent = ?comment.parent_comment_id,
            "Created comment"
        );

        Ok(comment)
    }

    /// Edit a comment. Only its author may do this.
    pub async fn update(
        &self,
        user_id: &str,
        input: UpdateCommentInput,
    ) -> AppResult<comment::Model> {
        input.validate()?;

        let comment = self.comment_repo.get_by_id(&input.comment_id).await?;
        if comment.author_id != user_id {
            return Err(AppError::Forbidden(
                "Cannot update other user's comment".to_string(),
            ));
        }

        let mut active: comment::ActiveModel = comment.into();
        active.content = Set(input.content);
        active.updated_at = Set(Utc::now().fixed_offset());

        self.comment_repo.update(active).await
    }

    /// Delete a comment and, through the foreign key, all replies beneath it.
    pub async fn delete(&self, comment_id: &str, user_id: &str) -> AppResult<()> {
        let comment = self.comment_repo.get_by_id(comment_id).await?;
        if comment.author_id != user_id {
            return Err(AppError::Forbidden(
                "Cannot delete other user's comment".to_string(),
            ));
        }

        self.comment_repo.delete(comment_id).await?;
        tracing::debug!(comment_id = %comment_id, "Deleted comment");

        Ok(())
    }

    /// All comments of a post as a reply forest, oldest first at every level.
    ///
    /// Yields an empty forest when the post is missing or hidden from
    /// `viewer_id`, or when the store cannot be read.
    pub async fn threaded_comments(
        &self,
        post_id: &str,
        viewer_id: Option<&str>,
    ) -> Vec<CommentThread<CommentWithAuthor>> {
        match self.load_annotated(post_id, viewer_id).await {
            Ok(comments) => build_threads(comments),
            Err(e) if e.is_server_error() => {
                tracing::warn!(
                    error = %e,
                    post_id = %post_id,
                    "Failed to load comments, returning empty thread"
                );
                Vec::new()
            }
            Err(e) => {
                tracing::debug!(error = %e, post_id = %post_id, "Comments not available to viewer");
                Vec::new()
            }
        }
    }

    async fn load_annotated(
        &self,
        post_id: &str,
        viewer_id: Option<&str>,
    ) -> AppResult<Vec<CommentWithAuthor>> {
        let post = self.post_repo.get_by_id(post_id).await?;
        if !post.is_visible_to(viewer_id) {
            return Err(AppError::PostNotFound(post_id.to_string()));
        }

        let comments = self.comment_repo.find_by_post(post_id).await?;
        if comments.is_empty() {
            return Ok(Vec::new());
        }

        let mut author_ids: Vec<String> = comments.iter().map(|c| c.author_id.clone()).collect();
        author_ids.sort_unstable();
        author_ids.dedup();

        let authors: HashMap<String, AuthorSummary> = self
            .profile_repo
            .find_by_ids(&author_ids)
            .await?
            .into_iter()
            .map(|p| (p.id.clone(), AuthorSummary::from(p)))
            .collect();

        Ok(comments
            .into_iter()
            .map(|c| {
                let author = authors.get(&c.author_id).cloned();
                CommentWithAuthor::new(c, author)
            })
            .collect())
    }
}
