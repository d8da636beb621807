//! Test utilities for database operations.
//!
//! Provides helpers for setting up and tearing down test databases, plus
//! small fixture builders for the content tables.

use chrono::{DateTime, FixedOffset};
use sea_orm::{
    ActiveModelTrait, ConnectionTrait, Database, DatabaseBackend, DatabaseConnection, DbErr, Set,
    Statement,
};
use tracing::info;

use crate::entities::{comment, post, profile};

/// Test database configuration.
#[derive(Debug, Clone)]
pub struct TestDbConfig {
    /// Database host.
    pub host: String,
    /// Database port.
    pub port: u16,
    /// Database username.
    pub username: String,
    /// Database password.
    pub password: String,
    /// Database name.
    pub database: String,
}

impl Default for TestDbConfig {
    fn default() -> Self {
        Self {
            host: std::env::var("TEST_DB_HOST").unwrap_or_else(|_| "localhost".to_string()),
            port: std::env::var("TEST_DB_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(5433),
            username: std::env::var("TEST_DB_USER").unwrap_or_else(|_| "folio_test".to_string()),
            password: std::env::var("TEST_DB_PASSWORD")
                .unwrap_or_else(|_| "folio_test".to_string()),
            database: std::env::var("TEST_DB_NAME").unwrap_or_else(|_| "folio_test".to_string()),
        }
    }
}

impl TestDbConfig {
    /// Get the database URL.
    #[must_use]
    pub fn database_url(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.username, self.password, self.host, self.port, self.database
        )
    }

    /// Get URL for connecting to postgres database (for creating test DB).
    #[must_use]
    pub fn postgres_url(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/postgres",
            self.username, self.password, self.host, self.port
        )
    }
}

/// A test database context that manages the lifecycle of a test database.
pub struct TestDatabase {
    /// Database connection.
    pub conn: DatabaseConnection,
    /// Database configuration.
    pub config: TestDbConfig,
}

impl TestDatabase {
    /// Connect to the configured test database and run migrations.
    pub async fn new() -> Result<Self, DbErr> {
        Self::with_config(TestDbConfig::default()).await
    }

    /// Connect with a custom configuration and run migrations.
    pub async fn with_config(config: TestDbConfig) -> Result<Self, DbErr> {
        let conn = Database::connect(&config.database_url()).await?;

        info!(database = %config.database, "Connected to test database");

        let db = Self { conn, config };
        db.migrate().await?;
        Ok(db)
    }

    /// Create a unique test database (for parallel tests).
    pub async fn create_unique() -> Result<Self, DbErr> {
        let mut config = TestDbConfig::default();
        let unique_suffix = uuid::Uuid::new_v4().simple().to_string();
        config.database = format!("folio_test_{}", &unique_suffix[..8]);

        let postgres_conn = Database::connect(&config.postgres_url()).await?;
        let create_db = format!("CREATE DATABASE \"{}\"", config.database);
        postgres_conn
            .execute(Statement::from_string(DatabaseBackend::Postgres, create_db))
            .await?;
        postgres_conn.close().await?;

        info!(database = %config.database, "Created unique test database");

        Self::with_config(config).await
    }

    async fn migrate(&self) -> Result<(), DbErr> {
        use sea_orm_migration::MigratorTrait;
        crate::migrations::Migrator::up(&self.conn, None).await
    }

    /// Get the database connection.
    #[must_use]
    pub const fn connection(&self) -> &DatabaseConnection {
        &self.conn
    }

    /// Remove all content rows, keeping the schema.
    pub async fn cleanup(&self) -> Result<(), DbErr> {
        self.conn
            .execute(Statement::from_string(
                DatabaseBackend::Postgres,
                "TRUNCATE TABLE \"reaction\", \"comment\", \"post\", \"profile\" CASCADE"
                    .to_string(),
            ))
            .await?;

        info!("Cleaned up test database");
        Ok(())
    }

    /// Drop the test database (for unique databases).
    pub async fn drop_database(self) -> Result<(), DbErr> {
        self.conn.close().await?;

        let postgres_conn = Database::connect(&self.config.postgres_url()).await?;

        let terminate = format!(
            "SELECT pg_terminate_backend(pid) FROM pg_stat_activity WHERE datname = '{}'",
            self.config.database
        );
        postgres_conn
            .execute(Statement::from_string(DatabaseBackend::Postgres, terminate))
            .await
            .ok();

        let drop_db = format!("DROP DATABASE IF EXISTS \"{}\"", self.config.database);
        postgres_conn
            .execute(Statement::from_string(DatabaseBackend::Postgres, drop_db))
            .await?;

        postgres_conn.close().await?;

        info!(database = %self.config.database, "Dropped test database");
        Ok(())
    }

    /// Insert a profile with the given id, used as username and token too.
    pub async fn seed_profile(&self, id: &str) -> Result<profile::Model, DbErr> {
        let now = chrono::Utc::now().fixed_offset();
        profile::ActiveModel {
            id: Set(id.to_string()),
            username: Set(id.to_string()),
            display_name: Set(None),
            avatar_url: Set(None),
            token: Set(Some(format!("token-{id}"))),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&self.conn)
        .await
    }

    /// Insert a post with explicit timestamps.
    pub async fn seed_post(
        &self,
        id: &str,
        author_id: &str,
        status: post::Status,
        at: DateTime<FixedOffset>,
    ) -> Result<post::Model, DbErr> {
        post::ActiveModel {
            id: Set(id.to_string()),
            author_id: Set(author_id.to_string()),
            title: Set(format!("Post {id}")),
            content: Set(String::new()),
            category: Set(post::Category::Post),
            status: Set(status),
            created_at: Set(at),
            updated_at: Set(at),
        }
        .insert(&self.conn)
        .await
    }

    /// Insert a comment, optionally replying to `parent`.
    pub async fn seed_comment(
        &self,
        id: &str,
        post_id: &str,
        author_id: &str,
        parent: Option<&str>,
        at: DateTime<FixedOffset>,
    ) -> Result<comment::Model, DbErr> {
        comment::ActiveModel {
            id: Set(id.to_string()),
            post_id: Set(post_id.to_string()),
            author_id: Set(author_id.to_string()),
            parent_comment_id: Set(parent.map(str::to_string)),
            content: Set(format!("Comment {id}")),
            created_at: Set(at),
            updated_at: Set(at),
        }
        .insert(&self.conn)
        .await
    }
}
