//! Tag vocabulary store implementation.
//!
//! The `tag.name` uniqueness constraint is the correctness backstop for
//! concurrent reconciliation: a 23505 aborts the whole bulk insert and
//! surfaces as `Error::Conflict`, which the reconciler consumes by
//! re-reading and re-inserting what is still missing.

use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::{postgres::PgRow, PgPool, Row};
use uuid::Uuid;

use doctag_core::{Error, Result, Tag, TagStore};

fn tag_from_row(row: &PgRow) -> Result<Tag> {
    Ok(Tag {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        created_at: row.try_get("created_at")?,
    })
}

/// Map a unique-constraint violation to `Error::Conflict`; everything
/// else stays a database error.
fn map_insert_error(e: sqlx::Error) -> Error {
    if let sqlx::Error::Database(db) = &e {
        if db.code().as_deref() == Some("23505") {
            return Error::Conflict(db.message().to_string());
        }
    }
    Error::Database(e)
}

/// PostgreSQL implementation of [`TagStore`].
pub struct PgTagStore {
    pool: PgPool,
}

impl PgTagStore {
    /// Create a new PgTagStore with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TagStore for PgTagStore {
    async fn find_by_names(&self, names: &[String]) -> Result<Vec<Tag>> {
        if names.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query("SELECT id, name, created_at FROM tag WHERE name = ANY($1)")
            .bind(names)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(tag_from_row).collect()
    }

    async fn insert_many(&self, names: &[String]) -> Result<Vec<Tag>> {
        if names.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<Uuid> = names.iter().map(|_| Uuid::now_v7()).collect();

        let rows = sqlx::query(
            "INSERT INTO tag (id, name) \
             SELECT u.id, u.name FROM UNNEST($1::uuid[], $2::text[]) AS u(id, name) \
             RETURNING id, name, created_at",
        )
        .bind(&ids)
        .bind(names)
        .fetch_all(&self.pool)
        .await
        .map_err(map_insert_error)?;

        rows.iter().map(tag_from_row).collect()
    }

    async fn link_to_document(&self, document_id: Uuid, tag_ids: &[Uuid]) -> Result<()> {
        if tag_ids.is_empty() {
            return Ok(());
        }

        // Additive and order-independent; the composite key absorbs
        // re-links without error.
        sqlx::query(
            "INSERT INTO document_tag (document_id, tag_id) \
             SELECT $1, unnest($2::uuid[]) \
             ON CONFLICT (document_id, tag_id) DO NOTHING",
        )
        .bind(document_id)
        .bind(tag_ids)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn tags_for_document(&self, document_id: Uuid) -> Result<Vec<Tag>> {
        let rows = sqlx::query(
            "SELECT t.id, t.name, t.created_at \
             FROM tag t \
             JOIN document_tag dt ON t.id = dt.tag_id \
             WHERE dt.document_id = $1 \
             ORDER BY t.name",
        )
        .bind(document_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(tag_from_row).collect()
    }

    async fn tags_for_documents(
        &self,
        document_ids: &[Uuid],
    ) -> Result<HashMap<Uuid, Vec<Tag>>> {
        if document_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = sqlx::query(
            "SELECT dt.document_id, t.id, t.name, t.created_at \
             FROM tag t \
             JOIN document_tag dt ON t.id = dt.tag_id \
             WHERE dt.document_id = ANY($1) \
             ORDER BY t.name",
        )
        .bind(document_ids)
        .fetch_all(&self.pool)
        .await?;

        let mut by_document: HashMap<Uuid, Vec<Tag>> = HashMap::new();
        for row in &rows {
            let document_id: Uuid = row.try_get("document_id")?;
            by_document
                .entry(document_id)
                .or_default()
                .push(tag_from_row(row)?);
        }
        Ok(by_document)
    }
}
