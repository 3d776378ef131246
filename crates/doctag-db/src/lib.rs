//! # doctag-db
//!
//! PostgreSQL database layer for doctag.
//!
//! This crate provides:
//! - Connection pool management
//! - Repository implementations for documents and the tag vocabulary
//! - A filesystem blob storage backend with atomic writes
//!
//! ## Example
//!
//! ```rust,ignore
//! use doctag_db::Database;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::connect("postgres://localhost/doctag").await?;
//!     let docs = db.documents.list_for_owner(owner_id).await?;
//!     Ok(())
//! }
//! ```

pub mod blob;
pub mod documents;
pub mod pool;
pub mod tags;

// Re-export core types
pub use doctag_core::*;

pub use blob::{generate_storage_path, FilesystemBlobStore};
pub use documents::PgDocumentRepository;
pub use pool::{create_pool, create_pool_with_config, log_pool_metrics, PoolConfig};
pub use tags::PgTagStore;

/// Combined database context with all repositories.
pub struct Database {
    /// The underlying connection pool.
    pub pool: sqlx::Pool<sqlx::Postgres>,
    /// Document metadata repository.
    pub documents: PgDocumentRepository,
    /// Tag vocabulary store.
    pub tags: PgTagStore,
}

impl Database {
    /// Create a new Database instance from a connection pool.
    pub fn new(pool: sqlx::Pool<sqlx::Postgres>) -> Self {
        Self {
            documents: PgDocumentRepository::new(pool.clone()),
            tags: PgTagStore::new(pool.clone()),
            pool,
        }
    }

    /// Create a new Database instance by connecting to the given URL.
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = create_pool(url).await?;
        Ok(Self::new(pool))
    }

    /// Create with custom pool configuration.
    pub async fn connect_with_config(url: &str, config: PoolConfig) -> Result<Self> {
        let pool = create_pool_with_config(url, config).await?;
        Ok(Self::new(pool))
    }

    /// Run pending migrations.
    #[cfg(feature = "migrations")]
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(|e| Error::Database(sqlx::Error::Migrate(Box::new(e))))?;
        Ok(())
    }

    /// Get the underlying connection pool.
    pub fn pool(&self) -> &sqlx::Pool<sqlx::Postgres> {
        &self.pool
    }
}
