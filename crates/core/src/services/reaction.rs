//! Reaction service.

use chrono::Utc;
use folio_common::{AppError, AppResult, IdGenerator};
use folio_db::{
    entities::{
        post::{self, Status},
        reaction,
    },
    repositories::{PostRepository, ReactionRepository},
};
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Reaction service for business logic.
#[derive(Clone)]
pub struct ReactionService {
    reaction_repo: ReactionRepository,
    post_repo: PostRepository,
    id_gen: IdGenerator,
}

/// Input for adding or removing a reaction.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ToggleReactionInput {
    pub post_id: String,

    /// Reaction kind, e.g. `like`.
    #[validate(length(min = 1, max = 32))]
    pub reaction: String,
}

/// Count of one reaction kind on a post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReactionCount {
    pub reaction: String,
    pub count: i64,
}

/// Reactions on a post, plus the kinds the viewer has left.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReactionSummary {
    pub counts: Vec<ReactionCount>,
    pub mine: Vec<String>,
}

impl ReactionService {
    /// Create a new reaction service.
    #[must_use]
    pub fn new(reaction_repo: ReactionRepository, post_repo: PostRepository) -> Self {
        Self {
            reaction_repo,
            post_repo,
            id_gen: IdGenerator::new(),
        }
    }

    async fn visible_post(&self, post_id: &str, viewer_id: Option<&str>) -> AppResult<post::Model> {
        let post = self.post_repo.get_by_id(post_id).await?;
        if !post.is_visible_to(viewer_id) {
            return Err(AppError::PostNotFound(post_id.to_string()));
        }
        Ok(post)
    }

    /// Add the reaction if `user_id` has not left it yet, otherwise remove it.
    ///
    /// Returns `true` when the reaction is now present.
    pub async fn toggle(&self, user_id: &str, input: ToggleReactionInput) -> AppResult<bool> {
        input.validate()?;

        let kind = input.reaction.trim();
        if kind.is_empty() || kind.chars().any(char::is_whitespace) {
            return Err(AppError::BadRequest("Invalid reaction".to_string()));
        }

        let post = self.visible_post(&input.post_id, Some(user_id)).await?;
        if post.status != Status::Published {
            return Err(AppError::Forbidden(
                "Cannot react to a draft post".to_string(),
            ));
        }

        if let Some(existing) = self
            .reaction_repo
            .find_by_user_post_kind(user_id, &post.id, kind)
            .await?
        {
            self.reaction_repo.delete(&existing.id).await?;
            tracing::debug!(
                post_id = %post.id,
                user_id = %user_id,
                reaction = %kind,
                "Removed reaction"
            );
            return Ok(false);
        }

        let model = reaction::ActiveModel {
            id: Set(self.id_gen.generate()),
            user_id: Set(user_id.to_string()),
            post_id: Set(post.id.clone()),
            reaction: Set(kind.to_string()),
            created_at: Set(Utc::now().fixed_offset()),
        };
        let inserted = self.reaction_repo.create(model).await?;
        tracing::debug!(
            post_id = %post.id,
            user_id = %user_id,
            reaction = %kind,
            inserted,
            "Added reaction"
        );

        Ok(true)
    }

    /// Reaction counts on a post, most frequent first.
    pub async fn summary(
        &self,
        post_id: &str,
        viewer_id: Option<&str>,
    ) -> AppResult<ReactionSummary> {
        let post = self.visible_post(post_id, viewer_id).await?;

        let counts = self
            .reaction_repo
            .count_by_kind(&post.id)
            .await?
            .into_iter()
            .map(|(reaction, count)| ReactionCount { reaction, count })
            .collect();

        let mine = match viewer_id {
            Some(viewer) => self.reaction_repo.kinds_by_user(viewer, &post.id).await?,
            None => Vec::new(),
        };

        Ok(ReactionSummary { counts, mine })
    }
}
