//! Reaction repository.

use std::sync::Arc;

use crate::entities::{Reaction, reaction};
use folio_common::{AppError, AppResult};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, QuerySelect,
    TryInsertResult, sea_query::OnConflict,
};

/// Reaction repository for database operations.
#[derive(Clone)]
pub struct ReactionRepository {
    db: Arc<DatabaseConnection>,
}

impl ReactionRepository {
    /// Create a new reaction repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find one user's reaction of a given kind on a post.
    pub async fn find_by_user_post_kind(
        &self,
        user_id: &str,
        post_id: &str,
        kind: &str,
    ) -> AppResult<Option<reaction::Model>> {
        Reaction::find()
            .filter(reaction::Column::UserId.eq(user_id))
            .filter(reaction::Column::PostId.eq(post_id))
            .filter(reaction::Column::Reaction.eq(kind))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Insert a reaction unless the same user already left that kind on the post.
    ///
    /// Returns `false` when an existing row took precedence.
    pub async fn create(&self, model: reaction::ActiveModel) -> AppResult<bool> {
        let result = Reaction::insert(model)
            .on_conflict(
                OnConflict::columns([
                    reaction::Column::UserId,
                    reaction::Column::PostId,
                    reaction::Column::Reaction,
                ])
                .do_nothing()
                .to_owned(),
            )
            .do_nothing()
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(matches!(result, TryInsertResult::Inserted(_)))
    }

    /// Delete a reaction.
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        Reaction::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Reaction kinds on a post with their counts, most frequent first.
    pub async fn count_by_kind(&self, post_id: &str) -> AppResult<Vec<(String, i64)>> {
        Reaction::find()
            .select_only()
            .column(reaction::Column::Reaction)
            .column_as(reaction::Column::Id.count(), "count")
            .filter(reaction::Column::PostId.eq(post_id))
            .group_by(reaction::Column::Reaction)
            .order_by_desc(reaction::Column::Id.count())
            .order_by_asc(reaction::Column::Reaction)
            .into_tuple()
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Reaction kinds one user has left on a post.
    pub async fn kinds_by_user(&self, user_id: &str, post_id: &str) -> AppResult<Vec<String>> {
        Reaction::find()
            .select_only()
            .column(reaction::Column::Reaction)
            .filter(reaction::Column::UserId.eq(user_id))
            .filter(reaction::Column::PostId.eq(post_id))
            .order_by_asc(reaction::Column::Reaction)
            .into_tuple()
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult, Set};

    fn create_test_reaction() -> reaction::Model {
        reaction::Model {
            id: "r1".to_string(),
            user_id: "u1".to_string(),
            post_id: "p1".to_string(),
            reaction: "like".to_string(),
            created_at: Utc::now().into(),
        }
    }

    fn active(model: reaction::Model) -> reaction::ActiveModel {
        reaction::ActiveModel {
            id: Set(model.id),
            user_id: Set(model.user_id),
            post_id: Set(model.post_id),
            reaction: Set(model.reaction),
            created_at: Set(model.created_at),
        }
    }

    fn repo_with_rows_affected(rows_affected: u64) -> ReactionRepository {
        ReactionRepository::new(Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected,
                }])
                .into_connection(),
        ))
    }

    #[tokio::test]
    async fn test_create_inserts_new_reaction() {
        let repo = repo_with_rows_affected(1);

        assert!(repo.create(active(create_test_reaction())).await.unwrap());
    }

    #[tokio::test]
    async fn test_create_duplicate_is_not_an_error() {
        let repo = repo_with_rows_affected(0);

        assert!(!repo.create(active(create_test_reaction())).await.unwrap());
    }

    #[tokio::test]
    async fn test_find_by_user_post_kind() {
        let existing = create_test_reaction();
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[existing.clone()]])
                .into_connection(),
        );
        let repo = ReactionRepository::new(db);

        let found = repo.find_by_user_post_kind("u1", "p1", "like").await.unwrap();
        assert_eq!(found, Some(existing));
    }
}
