//! Document metadata repository implementation.

use async_trait::async_trait;
use sqlx::{postgres::PgRow, PgPool, Row};
use tracing::debug;
use uuid::Uuid;

use doctag_core::{CreateDocumentRequest, Document, DocumentRepository, Error, Result};

fn document_from_row(row: &PgRow) -> Result<Document> {
    Ok(Document {
        id: row.try_get("id")?,
        owner_id: row.try_get("owner_id")?,
        original_filename: row.try_get("original_filename")?,
        content_type: row.try_get("content_type")?,
        size_bytes: row.try_get("size_bytes")?,
        storage_path: row.try_get("storage_path")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

const DOCUMENT_COLUMNS: &str =
    "id, owner_id, original_filename, content_type, size_bytes, storage_path, \
     created_at, updated_at";

/// PostgreSQL implementation of [`DocumentRepository`].
pub struct PgDocumentRepository {
    pool: PgPool,
}

impl PgDocumentRepository {
    /// Create a new PgDocumentRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DocumentRepository for PgDocumentRepository {
    async fn insert(&self, req: CreateDocumentRequest) -> Result<Document> {
        let id = Uuid::now_v7();
        let row = sqlx::query(&format!(
            "INSERT INTO document \
             (id, owner_id, original_filename, content_type, size_bytes, storage_path) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {DOCUMENT_COLUMNS}"
        ))
        .bind(id)
        .bind(req.owner_id)
        .bind(&req.original_filename)
        .bind(&req.content_type)
        .bind(req.size_bytes)
        .bind(&req.storage_path)
        .fetch_one(&self.pool)
        .await?;

        debug!(
            subsystem = "db",
            component = "documents",
            op = "insert",
            document_id = %id,
            owner_id = %req.owner_id,
            "Document row created"
        );

        document_from_row(&row)
    }

    async fn fetch_for_owner(&self, id: Uuid, owner_id: Uuid) -> Result<Option<Document>> {
        let row = sqlx::query(&format!(
            "SELECT {DOCUMENT_COLUMNS} FROM document WHERE id = $1 AND owner_id = $2"
        ))
        .bind(id)
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(document_from_row).transpose()
    }

    async fn list_for_owner(&self, owner_id: Uuid) -> Result<Vec<Document>> {
        let rows = sqlx::query(&format!(
            "SELECT {DOCUMENT_COLUMNS} FROM document \
             WHERE owner_id = $1 ORDER BY created_at DESC"
        ))
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(document_from_row).collect()
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM document WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(Error::DocumentNotFound(id));
        }

        debug!(
            subsystem = "db",
            component = "documents",
            op = "delete",
            document_id = %id,
            "Document row deleted (tag links cascade)"
        );
        Ok(())
    }
}
