//! services/api/src/adapters/docstore.rs
//!
//! This module contains the document-store adapter, the concrete
//! implementation of the `DocumentStore` port from the `core` crate. All
//! documents live in a single `documents` table with their fields as jsonb;
//! queries are compiled to SQL at runtime because filters are dynamic.

use std::fmt::Write as _;

use async_trait::async_trait;
use intervu_core::ports::{Document, DocumentStore, PortError, PortResult};
use intervu_core::query::{Direction, FilterOp, Query};
use serde_json::Value;
use sqlx::{PgPool, Row};

/// A document-store adapter backed by PostgreSQL.
#[derive(Clone)]
pub struct PgDocumentStore {
    pool: PgPool,
}

impl PgDocumentStore {
    /// Creates a new `PgDocumentStore`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::Error> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

fn map_sqlx(e: sqlx::Error) -> PortError {
    PortError::Unavailable(e.to_string())
}

/// Field names are interpolated into SQL as jsonb path segments, so only
/// plain identifiers are accepted. Filters come from our own services, never
/// from request input; this guards against a future caller getting it wrong.
fn checked_field(field: &str) -> PortResult<&str> {
    let ok = !field.is_empty()
        && field
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_');
    if ok {
        Ok(field)
    } else {
        Err(PortError::Unavailable(format!("invalid field name: {field:?}")))
    }
}

/// Compiles a `Query` into SQL. `$1` is always the collection; each filter
/// value binds as the next jsonb parameter.
fn compile_query(query: &Query) -> PortResult<String> {
    let mut sql = String::from("SELECT doc_id, fields FROM documents WHERE collection = $1");

    for (i, filter) in query.filters.iter().enumerate() {
        let field = checked_field(&filter.field)?;
        let op = match filter.op {
            FilterOp::Eq => "=",
            // jsonb `<>` is NULL for missing fields, which correctly drops
            // documents that do not carry the field at all.
            FilterOp::Ne => "<>",
        };
        write!(sql, " AND fields->'{field}' {op} ${}", i + 2)
            .map_err(|e| PortError::Unavailable(e.to_string()))?;
    }

    if let Some((field, direction)) = &query.order_by {
        let field = checked_field(field)?;
        let dir = match direction {
            Direction::Ascending => "ASC",
            Direction::Descending => "DESC",
        };
        // Order fields hold RFC3339 timestamps with writer-defined
        // sub-second precision and offset; text ordering mis-sorts those,
        // so compare instants.
        write!(sql, " ORDER BY (fields->>'{field}')::timestamptz {dir}")
            .map_err(|e| PortError::Unavailable(e.to_string()))?;
    }

    if let Some(limit) = query.limit {
        write!(sql, " LIMIT {limit}").map_err(|e| PortError::Unavailable(e.to_string()))?;
    }

    Ok(sql)
}

fn row_to_document(row: &sqlx::postgres::PgRow) -> PortResult<Document> {
    let id: String = row.try_get("doc_id").map_err(map_sqlx)?;
    let fields: Value = row.try_get("fields").map_err(map_sqlx)?;
    Ok(Document { id, fields })
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn get_doc(&self, collection: &str, id: &str) -> PortResult<Option<Document>> {
        let row =
            sqlx::query("SELECT doc_id, fields FROM documents WHERE collection = $1 AND doc_id = $2")
                .bind(collection)
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(map_sqlx)?;

        row.as_ref().map(row_to_document).transpose()
    }

    async fn create_doc(&self, collection: &str, id: &str, fields: Value) -> PortResult<()> {
        let result = sqlx::query(
            "INSERT INTO documents (collection, doc_id, fields) VALUES ($1, $2, $3) \
             ON CONFLICT (collection, doc_id) DO NOTHING",
        )
        .bind(collection)
        .bind(id)
        .bind(&fields)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx)?;

        if result.rows_affected() == 0 {
            return Err(PortError::Conflict(format!("{collection}/{id} already exists")));
        }
        Ok(())
    }

    async fn run_query(&self, query: Query) -> PortResult<Vec<Document>> {
        let sql = compile_query(&query)?;

        let mut prepared = sqlx::query(&sql).bind(&query.collection);
        for filter in &query.filters {
            prepared = prepared.bind(&filter.value);
        }

        let rows = prepared.fetch_all(&self.pool).await.map_err(map_sqlx)?;
        rows.iter().map(row_to_document).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn compiles_filters_order_and_limit() {
        let query = Query::collection("interviews")
            .filter("finalized", FilterOp::Eq, true)
            .filter("userId", FilterOp::Ne, "u1")
            .order_by("createdAt", Direction::Descending)
            .limit(20);

        let sql = compile_query(&query).unwrap();
        assert_eq!(
            sql,
            "SELECT doc_id, fields FROM documents WHERE collection = $1 \
             AND fields->'finalized' = $2 AND fields->'userId' <> $3 \
             ORDER BY (fields->>'createdAt')::timestamptz DESC LIMIT 20"
        );
    }

    #[test]
    fn order_clause_compares_instants_not_text() {
        let query = Query::collection("interviews").order_by("createdAt", Direction::Descending);
        let sql = compile_query(&query).unwrap();
        assert!(sql.ends_with("ORDER BY (fields->>'createdAt')::timestamptz DESC"));
    }

    #[test]
    fn compiles_bare_collection_scan() {
        let query = Query::collection("users");
        let sql = compile_query(&query).unwrap();
        assert_eq!(sql, "SELECT doc_id, fields FROM documents WHERE collection = $1");
    }

    #[test]
    fn rejects_non_identifier_field_names() {
        let query = Query::collection("interviews").filter("a'; DROP TABLE", FilterOp::Eq, json!(1));
        assert!(compile_query(&query).is_err());

        let query = Query::collection("interviews").order_by("", Direction::Ascending);
        assert!(compile_query(&query).is_err());
    }
}
