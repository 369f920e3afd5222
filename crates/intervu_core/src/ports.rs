//! crates/intervu_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the
//! core to be independent of the concrete identity provider and document
//! database behind them.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::domain::{IdentityUser, SessionClaims};
use crate::query::Query;

/// A generic error type for all port operations. Adapters map their
/// provider-specific failures onto this taxonomy exactly once, so the
/// services above never see a raw provider error.
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    /// The record genuinely does not exist. An expected outcome, not a fault.
    #[error("not found: {0}")]
    NotFound(String),
    /// The record already exists and was not touched.
    #[error("conflict: {0}")]
    Conflict(String),
    /// The session artifact is malformed, expired, or revoked.
    #[error("invalid session: {0}")]
    InvalidSession(String),
    /// The provider itself failed (network, service outage, malformed data).
    #[error("provider unavailable: {0}")]
    Unavailable(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

/// A schemaless document as returned by the store: its id plus its fields.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub fields: Value,
}

impl Document {
    /// Deserializes the fields into a domain record, merging the document id
    /// in under `"id"` (document ids live outside the field map in the store).
    pub fn decode<T: DeserializeOwned>(self) -> PortResult<T> {
        let mut fields = self.fields;
        if let Value::Object(map) = &mut fields {
            map.insert("id".to_string(), Value::String(self.id));
        }
        serde_json::from_value(fields)
            .map_err(|e| PortError::Unavailable(format!("malformed document: {e}")))
    }
}

/// The managed identity service: credential verification happens on the
/// client against the provider directly; this port only covers what the
/// backend consumes.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Looks up the provider's own account record for an email address.
    async fn get_user_by_email(&self, email: &str) -> PortResult<IdentityUser>;

    /// Exchanges a short-lived id token for a long-lived signed session
    /// artifact. The provider API takes the lifetime in milliseconds.
    async fn create_session_cookie(&self, id_token: &str, expires_in_ms: i64)
        -> PortResult<String>;

    /// Verifies a session artifact, optionally checking revocation.
    async fn verify_session_cookie(
        &self,
        artifact: &str,
        check_revoked: bool,
    ) -> PortResult<SessionClaims>;

    /// Marks a session artifact as revoked. Revoking an already-invalid
    /// artifact is a no-op, not an error.
    async fn revoke_session(&self, artifact: &str) -> PortResult<()>;
}

/// The managed document database: keyed lookups, atomic create-if-absent,
/// and filtered/ordered/limited collection scans.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn get_doc(&self, collection: &str, id: &str) -> PortResult<Option<Document>>;

    /// Creates the document only if it does not exist yet; an existing
    /// document yields `PortError::Conflict` and no mutation. This is the
    /// store-level answer to check-then-create races.
    async fn create_doc(&self, collection: &str, id: &str, fields: Value) -> PortResult<()>;

    async fn run_query(&self, query: Query) -> PortResult<Vec<Document>>;
}
