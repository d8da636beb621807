//! Post service.

use chrono::Utc;
use folio_common::{AppError, AppResult, IdGenerator, PaginatedResult};
use folio_db::{
    entities::post::{self, Category, Status},
    repositories::{PostOrder, PostRepository, PostScope},
};
use sea_orm::Set;
use serde::Deserialize;
use validator::Validate;

use crate::pagination::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE, Paginator};

/// Post service for business logic.
#[derive(Clone)]
pub struct PostService {
    post_repo: PostRepository,
    id_gen: IdGenerator,
    default_page_size: u64,
    max_page_size: u64,
}

/// Input for creating a new post.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreatePostInput {
    #[validate(length(min = 1, max = 200))]
    pub title: String,

    #[validate(length(max = 100_000))]
    #[serde(default)]
    pub content: String,

    #[serde(default = "default_category")]
    pub category: Category,

    #[serde(default = "default_status")]
    pub status: Status,
}

const fn default_category() -> Category {
    Category::Post
}

const fn default_status() -> Status {
    Status::Draft
}

/// Input for updating a post. Absent fields are left unchanged.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePostInput {
    pub post_id: String,

    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,

    #[validate(length(max = 100_000))]
    pub content: Option<String>,

    pub category: Option<Category>,

    pub status: Option<Status>,
}

impl UpdatePostInput {
    const fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.content.is_none()
            && self.category.is_none()
            && self.status.is_none()
    }
}

impl PostService {
    /// Create a new post service.
    #[must_use]
    pub fn new(post_repo: PostRepository) -> Self {
        Self {
            post_repo,
            id_gen: IdGenerator::new(),
            default_page_size: DEFAULT_PAGE_SIZE,
            max_page_size: MAX_PAGE_SIZE,
        }
    }

    /// Override the listing page-size bounds.
    pub fn set_page_limits(&mut self, default_limit: u64, max_limit: u64) {
        self.default_page_size = default_limit;
        self.max_page_size = max_limit;
    }

    fn paginator(&self, limit: Option<u64>) -> Paginator {
        Paginator::with_bounds(limit, self.default_page_size, self.max_page_size)
    }

    /// Create a new post authored by `author_id`.
    pub async fn create(&self, author_id: &str, input: CreatePostInput) -> AppResult<post::Model> {
        input.validate()?;

        if input.title.trim().is_empty() {
            return Err(AppError::BadRequest("Title must not be blank".to_string()));
        }

        let now = Utc::now().fixed_offset();
        let model = post::ActiveModel {
            id: Set(self.id_gen.generate()),
            author_id: Set(author_id.to_string()),
            title: Set(input.title),
            content: Set(input.content),
            category: Set(input.category),
            status: Set(input.status),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let post = self.post_repo.create(model).await?;
        tracing::debug!(
            post_id = %post.id,
            author_id = %author_id,
            status = ?post.status,
            "Created post"
        );

        Ok(post)
    }

    /// Update a post. Only its author may do this.
    pub async fn update(&self, user_id: &str, input: UpdatePostInput) -> AppResult<post::Model> {
        input.validate()?;

        if input.is_empty() {
            return Err(AppError::BadRequest("Nothing to update".to_string()));
        }

        let post = self.post_repo.get_by_id(&input.post_id).await?;

        if post.author_id != user_id {
            // Other people's drafts stay hidden even from update attempts.
            if post.status == Status::Draft {
                return Err(AppError::PostNotFound(input.post_id));
            }
            return Err(AppError::Forbidden(
                "Cannot update other user's post".to_string(),
            ));
        }

        let mut active: post::ActiveModel = post.into();

        if let Some(title) = input.title {
            if title.trim().is_empty() {
                return Err(AppError::BadRequest("Title must not be blank".to_string()));
            }
            active.title = Set(title);
        }
        if let Some(content) = input.content {
            active.content = Set(content);
        }
        if let Some(category) = input.category {
            active.category = Set(category);
        }
        if let Some(status) = input.status {
            active.status = Set(status);
        }
        active.updated_at = Set(Utc::now().fixed_offset());

        let updated = self.post_repo.update(active).await?;
        tracing::debug!(post_id = %updated.id, "Updated post");

        Ok(updated)
    }

    /// Delete a post with its comments and reactions. Only its author may do this.
    pub async fn delete(&self, post_id: &str, user_id: &str) -> AppResult<()> {
        let post = self.post_repo.get_by_id(post_id).await?;

        if post.author_id != user_id {
            if post.status == Status::Draft {
                return Err(AppError::PostNotFound(post_id.to_string()));
            }
            return Err(AppError::Forbidden(
                "Cannot delete other user's post".to_string(),
            ));
        }

        self.post_repo.delete(post_id).await?;
        tracing::debug!(post_id = %post_id, "Deleted post");

        Ok(())
    }

    /// Get a post as seen by `viewer_id`. Drafts are not found for anyone but their author.
    pub async fn get(&self, post_id: &str, viewer_id: Option<&str>) -> AppResult<post::Model> {
        let post = self.post_repo.get_by_id(post_id).await?;

        if !post.is_visible_to(viewer_id) {
            return Err(AppError::PostNotFound(post_id.to_string()));
        }

        Ok(post)
    }

    /// Public feed: published posts, newest first.
    pub async fn feed(
        &self,
        cursor: Option<&str>,
        limit: Option<u64>,
        category: Option<Category>,
    ) -> PaginatedResult<post::Model> {
        let scope = PostScope::Published { category };
        self.list(&scope, PostOrder::CreatedAt, cursor, limit).await
    }

    /// An author's own posts, drafts included, most recently edited first.
    pub async fn my_posts(
        &self,
        author_id: &str,
        cursor: Option<&str>,
        limit: Option<u64>,
    ) -> PaginatedResult<post::Model> {
        let scope = PostScope::Author(author_id.to_string());
        self.list(&scope, PostOrder::UpdatedAt, cursor, limit).await
    }

    async fn list(
        &self,
        scope: &PostScope,
        order: PostOrder,
        cursor: Option<&str>,
        limit: Option<u64>,
    ) -> PaginatedResult<post::Model> {
        let repo = &self.post_repo;
        self.paginator(limit)
            .fetch_page(
                cursor,
                |after, fetch| async move {
                    repo.find_page(scope, order, after.as_ref(), fetch).await
                },
                |post| order.cursor_for(post),
            )
            .await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, FixedOffset};
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;

    fn at(seconds: i64) -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339("2024-05-01T12:00:00Z").unwrap() + Duration::seconds(seconds)
    }

    fn create_test_post(id: &str, author_id: &str, status: Status, seconds: i64) -> post::Model {
        post::Model {
            id: id.to_string(),
            author_id: author_id.to_string(),
            title: format!("Post {id}"),
            content: "<p>Hello</p>".to_string(),
            category: Category::Post,
            status,
            created_at: at(seconds),
            updated_at: at(seconds),
        }
    }

    fn service(db: MockDatabase) -> PostService {
        PostService::new(PostRepository::new(Arc::new(db.into_connection())))
    }

    fn empty_update(post_id: &str) -> UpdatePostInput {
        UpdatePostInput {
            post_id: post_id.to_string(),
            title: None,
            content: None,
            category: None,
            status: None,
        }
    }

    #[tokio::test]
    async fn test_create_post() {
        let created = create_test_post("post1", "user1", Status::Draft, 0);
        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres).append_query_results([[created.clone()]]),
        );

        let input = CreatePostInput {
            title: "Post post1".to_string(),
            content: "<p>Hello</p>".to_string(),
            category: Category::Post,
            status: Status::Draft,
        };

        let result = service.create("user1", input).await.unwrap();
        assert_eq!(result, created);
    }

    #[tokio::test]
    async fn test_create_post_blank_title_returns_error() {
        let service = service(MockDatabase::new(DatabaseBackend::Postgres));

        let input = CreatePostInput {
            title: "   ".to_string(),
            content: String::new(),
            category: Category::Blog,
            status: Status::Published,
        };

        match service.create("user1", input).await {
            Err(AppError::BadRequest(msg)) => assert!(msg.contains("blank")),
            other => panic!("Expected BadRequest error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_create_post_empty_title_fails_validation() {
        let service = service(MockDatabase::new(DatabaseBackend::Postgres));

        let input = CreatePostInput {
            title: String::new(),
            content: String::new(),
            category: Category::Post,
            status: Status::Draft,
        };

        assert!(matches!(
            service.create("user1", input).await,
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_update_by_other_user_is_forbidden() {
        let post = create_test_post("post1", "user1", Status::Published, 0);
        let service =
            service(MockDatabase::new(DatabaseBackend::Postgres).append_query_results([[post]]));

        let mut input = empty_update("post1");
        input.title = Some("Hijacked".to_string());

        match service.update("user2", input).await {
            Err(AppError::Forbidden(msg)) => {
                assert!(msg.contains("Cannot update other user's post"));
            }
            other => panic!("Expected Forbidden error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_update_other_users_draft_is_not_found() {
        let post = create_test_post("post1", "user1", Status::Draft, 0);
        let service =
            service(MockDatabase::new(DatabaseBackend::Postgres).append_query_results([[post]]));

        let mut input = empty_update("post1");
        input.status = Some(Status::Published);

        assert!(matches!(
            service.update("user2", input).await,
            Err(AppError::PostNotFound(id)) if id == "post1"
        ));
    }

    #[tokio::test]
    async fn test_update_with_no_fields_returns_error() {
        let service = service(MockDatabase::new(DatabaseBackend::Postgres));

        match service.update("user1", empty_update("post1")).await {
            Err(AppError::BadRequest(msg)) => assert_eq!(msg, "Nothing to update"),
            other => panic!("Expected BadRequest error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_update_publishes_draft() {
        let post = create_test_post("post1", "user1", Status::Draft, 0);
        let mut published = post.clone();
        published.status = Status::Published;
        published.updated_at = at(60);

        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[post]])
                .append_query_results([[published.clone()]]),
        );

        let mut input = empty_update("post1");
        input.status = Some(Status::Published);

        let result = service.update("user1", input).await.unwrap();
        assert_eq!(result.status, Status::Published);
        assert!(result.updated_at > result.created_at);
    }

    #[tokio::test]
    async fn test_delete_by_other_user_is_forbidden() {
        let post = create_test_post("post1", "user1", Status::Published, 0);
        let service =
            service(MockDatabase::new(DatabaseBackend::Postgres).append_query_results([[post]]));

        match service.delete("post1", "user2").await {
            Err(AppError::Forbidden(msg)) => {
                assert!(msg.contains("Cannot delete other user's post"));
            }
            other => panic!("Expected Forbidden error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_get_draft_hidden_from_others() {
        let post = create_test_post("post1", "user1", Status::Draft, 0);
        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[post.clone()]])
                .append_query_results([[post.clone()]])
                .append_query_results([[post]]),
        );

        assert!(matches!(
            service.get("post1", None).await,
            Err(AppError::PostNotFound(_))
        ));
        assert!(matches!(
            service.get("post1", Some("user2")).await,
            Err(AppError::PostNotFound(_))
        ));
        assert!(service.get("post1", Some("user1")).await.is_ok());
    }

    #[tokio::test]
    async fn test_get_post_not_found() {
        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<post::Model>::new()]),
        );

        match service.get("nonexistent", None).await {
            Err(AppError::PostNotFound(id)) => assert_eq!(id, "nonexistent"),
            other => panic!("Expected PostNotFound error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_feed_with_more_rows_than_limit() {
        // Store returns limit + 1 rows, newest first.
        let rows: Vec<post::Model> = (0..3)
            .rev()
            .map(|i| create_test_post(&format!("post{i}"), "user1", Status::Published, i))
            .collect();

        let service =
            service(MockDatabase::new(DatabaseBackend::Postgres).append_query_results([rows]));

        let page = service.feed(None, Some(2), None).await;
        assert_eq!(page.data.len(), 2);
        assert!(page.has_more);
        let cursor = page.next_cursor.unwrap();
        assert_eq!(cursor.id, "post1");
        assert_eq!(cursor.timestamp, at(1));
    }

    #[tokio::test]
    async fn test_feed_store_failure_is_empty_page() {
        let service = service(MockDatabase::new(DatabaseBackend::Postgres));

        let page = service.feed(None, None, Some(Category::Blog)).await;
        assert_eq!(page, PaginatedResult::empty());
    }

    #[tokio::test]
    async fn test_my_posts_uses_updated_at_cursor() {
        let mut edited = create_test_post("post1", "user1", Status::Draft, 0);
        edited.updated_at = at(500);
        let older = create_test_post("post2", "user1", Status::Published, 100);

        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[edited, older.clone()]]),
        );

        let page = service.my_posts("user1", None, Some(1)).await;
        assert_eq!(page.data.len(), 1);
        assert_eq!(page.next_cursor.unwrap().timestamp, at(500));
    }

    #[tokio::test]
    async fn test_my_posts_malformed_cursor_is_empty_page() {
        let service = service(MockDatabase::new(DatabaseBackend::Postgres));

        let page = service.my_posts("user1", Some("nonsense"), None).await;
        assert!(page.data.is_empty());
        assert!(!page.has_more);
    }

    #[test]
    fn test_page_limits_are_configurable() {
        let mut service = service(MockDatabase::new(DatabaseBackend::Postgres));
        service.set_page_limits(20, 50);

        assert_eq!(service.paginator(None).limit(), 20);
        assert_eq!(service.paginator(Some(80)).limit(), 50);
    }
}
