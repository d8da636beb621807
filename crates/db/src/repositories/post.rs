//! Post repository.

use std::sync::Arc;

use crate::entities::{Post, post};
use crate::repositories::keyset::keyset_before;
use folio_common::{AppError, AppResult, Cursor};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Select,
};

/// Timestamp column a post listing is ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostOrder {
    /// Public feed: newest posts first.
    CreatedAt,
    /// Author's own posts: most recently edited first.
    UpdatedAt,
}

impl PostOrder {
    /// The entity column backing this order.
    #[must_use]
    pub const fn column(self) -> post::Column {
        match self {
            Self::CreatedAt => post::Column::CreatedAt,
            Self::UpdatedAt => post::Column::UpdatedAt,
        }
    }

    /// Value of the order column on `model`, as a cursor position.
    #[must_use]
    pub fn cursor_for(self, model: &post::Model) -> Cursor {
        match self {
            Self::CreatedAt => Cursor::new(&model.created_at, model.id.as_str()),
            Self::UpdatedAt => Cursor::new(&model.updated_at, model.id.as_str()),
        }
    }
}

/// Which posts a listing covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostScope {
    /// Published posts from everyone, optionally one category only.
    Published {
        /// Category filter.
        category: Option<post::Category>,
    },
    /// Every post by one author, drafts included.
    Author(String),
}

impl PostScope {
    fn condition(&self) -> Condition {
        match self {
            Self::Published { category } => {
                let mut condition =
                    Condition::all().add(post::Column::Status.eq(post::Status::Published));
                if let Some(category) = category {
                    condition = condition.add(post::Column::Category.eq(*category));
                }
                condition
            }
            Self::Author(author_id) => {
                Condition::all().add(post::Column::AuthorId.eq(author_id.as_str()))
            }
        }
    }
}

/// Post repository for database operations.
#[derive(Clone)]
pub struct PostRepository {
    db: Arc<DatabaseConnection>,
}

impl PostRepository {
    /// Create a new post repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a post by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<post::Model>> {
        Post::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a post by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<post::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::PostNotFound(id.to_string()))
    }

    /// Create a new post.
    pub async fn create(&self, model: post::ActiveModel) -> AppResult<post::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update a post.
    pub async fn update(&self, model: post::ActiveModel) -> AppResult<post::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete a post. Comments and reactions go with it via foreign keys.
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        Post::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Fetch up to `limit` posts in `(order DESC, id DESC)` order.
    ///
    /// # Arguments
    /// * `scope` - Which posts to list
    /// * `order` - Timestamp column to order by
    /// * `after` - Only rows strictly after this position (for pagination)
    /// * `limit` - Maximum number of rows to return
    pub async fn find_page(
        &self,
        scope: &PostScope,
        order: PostOrder,
        after: Option<&Cursor>,
        limit: u64,
    ) -> AppResult<Vec<post::Model>> {
        page_query(scope, order, after, limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

fn page_query(
    scope: &PostScope,
    order: PostOrder,
    after: Option<&Cursor>,
    limit: u64,
) -> Select<Post> {
    let mut condition = scope.condition();

    if let Some(cursor) = after {
        condition = condition.add(keyset_before(order.column(), post::Column::Id, cursor));
    }

    Post::find()
        .filter(condition)
        .order_by_desc(order.column())
        .order_by_desc(post::Column::Id)
        .limit(limit)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::{DateTime, FixedOffset};
    use sea_orm::{DatabaseBackend, MockDatabase, QueryTrait};

    fn ts(s: &str) -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339(s).unwrap()
    }

    fn create_test_post(id: &str, author_id: &str) -> post::Model {
        post::Model {
            id: id.to_string(),
            author_id: author_id.to_string(),
            title: "Title".to_string(),
            content: "<p>Body</p>".to_string(),
            category: post::Category::Post,
            status: post::Status::Published,
            created_at: ts("2024-03-01T10:00:00Z"),
            updated_at: ts("2024-03-02T10:00:00Z"),
        }
    }

    #[test]
    fn test_cursor_for_uses_order_column() {
        let post = create_test_post("p1", "u1");
        assert_eq!(
            PostOrder::CreatedAt.cursor_for(&post).encode(),
            "2024-03-01T10:00:00Z_p1"
        );
        assert_eq!(
            PostOrder::UpdatedAt.cursor_for(&post).encode(),
            "2024-03-02T10:00:00Z_p1"
        );
    }

    #[test]
    fn test_first_page_query() {
        let sql = page_query(
            &PostScope::Published { category: None },
            PostOrder::CreatedAt,
            None,
            11,
        )
        .build(DatabaseBackend::Postgres)
        .to_string();

        assert!(sql.contains(r#""post"."status" = 'published'"#), "{sql}");
        assert!(
            sql.contains(r#"ORDER BY "post"."created_at" DESC, "post"."id" DESC"#),
            "{sql}"
        );
        assert!(sql.ends_with("LIMIT 11"), "{sql}");
        assert!(!sql.contains(" OR "), "{sql}");
    }

    #[test]
    fn test_category_filter() {
        let sql = page_query(
            &PostScope::Published {
                category: Some(post::Category::Blog),
            },
            PostOrder::CreatedAt,
            None,
            11,
        )
        .build(DatabaseBackend::Postgres)
        .to_string();

        assert!(sql.contains(r#""post"."category" = 'blog'"#), "{sql}");
    }

    #[test]
    fn test_author_scope_with_cursor() {
        let cursor: Cursor = "2024-03-02T10:00:00Z_p5".parse().unwrap();
        let sql = page_query(
            &PostScope::Author("u1".to_string()),
            PostOrder::UpdatedAt,
            Some(&cursor),
            6,
        )
        .build(DatabaseBackend::Postgres)
        .to_string();

        assert!(sql.contains(r#""post"."author_id" = 'u1'"#), "{sql}");
        assert!(!sql.contains(r#""post"."status""#), "{sql}");
        assert!(sql.contains(r#""post"."updated_at" < "#), "{sql}");
        assert!(sql.contains(r#""post"."id" < 'p5'"#), "{sql}");
        assert!(
            sql.contains(r#"ORDER BY "post"."updated_at" DESC, "post"."id" DESC"#),
            "{sql}"
        );
        assert!(sql.ends_with("LIMIT 6"), "{sql}");
    }

    #[tokio::test]
    async fn test_get_by_id_not_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<post::Model>::new()])
                .into_connection(),
        );
        let repo = PostRepository::new(db);

        match repo.get_by_id("missing").await {
            Err(AppError::PostNotFound(id)) => assert_eq!(id, "missing"),
            other => panic!("Expected PostNotFound, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_find_page_returns_rows() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[
                    create_test_post("p2", "u1"),
                    create_test_post("p1", "u1"),
                ]])
                .into_connection(),
        );
        let repo = PostRepository::new(db);

        let rows = repo
            .find_page(
                &PostScope::Published { category: None },
                PostOrder::CreatedAt,
                None,
                11,
            )
            .await
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].id, "p2");
    }

    #[tokio::test]
    async fn test_find_page_maps_db_error() {
        // No queued results: the mock connection fails the query.
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let repo = PostRepository::new(db);

        let result = repo
            .find_page(
                &PostScope::Published { category: None },
                PostOrder::CreatedAt,
                None,
                11,
            )
            .await;
        assert!(matches!(result, Err(AppError::Database(_))));
    }
}
