//! Profile service.

use folio_common::{AppError, AppResult};
use folio_db::{entities::profile, repositories::ProfileRepository};

/// Resolves session tokens and looks up profiles.
#[derive(Clone)]
pub struct ProfileService {
    profile_repo: ProfileRepository,
}

impl ProfileService {
    /// Create a new profile service.
    #[must_use]
    pub const fn new(profile_repo: ProfileRepository) -> Self {
        Self { profile_repo }
    }

    /// Resolve a bearer token to the profile holding it.
    pub async fn authenticate_by_token(&self, token: &str) -> AppResult<profile::Model> {
        if token.is_empty() {
            return Err(AppError::Unauthorized);
        }

        self.profile_repo
            .find_by_token(token)
            .await?
            .ok_or(AppError::Unauthorized)
    }

    /// Get a profile by ID.
    pub async fn get(&self, id: &str) -> AppResult<profile::Model> {
        self.profile_repo.get_by_id(id).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;

    fn create_test_profile() -> profile::Model {
        profile::Model {
            id: "user1".to_string(),
            username: "alice".to_string(),
            display_name: None,
            avatar_url: None,
            token: Some("secret".to_string()),
            created_at: Utc::now().into(),
            updated_at: Utc::now().into(),
        }
    }

    fn service(db: MockDatabase) -> ProfileService {
        ProfileService::new(ProfileRepository::new(Arc::new(db.into_connection())))
    }

    #[tokio::test]
    async fn test_authenticate_by_token() {
        let profile = create_test_profile();
        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres).append_query_results([[profile.clone()]]),
        );

        assert_eq!(service.authenticate_by_token("secret").await.unwrap(), profile);
    }

    #[tokio::test]
    async fn test_unknown_token_is_unauthorized() {
        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<profile::Model>::new()]),
        );

        assert!(matches!(
            service.authenticate_by_token("nope").await,
            Err(AppError::Unauthorized)
        ));
    }

    #[tokio::test]
    async fn test_empty_token_skips_lookup() {
        let service = service(MockDatabase::new(DatabaseBackend::Postgres));

        assert!(matches!(
            service.authenticate_by_token("").await,
            Err(AppError::Unauthorized)
        ));
    }
}
