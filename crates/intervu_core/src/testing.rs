//! crates/intervu_core/src/testing.rs
//!
//! Deterministic in-memory implementations of both ports, for unit tests.
//! `MemoryIdentity` carries its own clock so session expiry can be tested
//! without sleeping; `MemoryStore` interprets `Query` values the way the
//! real store does (stable order among equal sort keys is not guaranteed
//! there, insertion order here).

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde_json::Value;

use crate::domain::{IdentityUser, SessionClaims};
use crate::ports::{Document, DocumentStore, IdentityProvider, PortError, PortResult};
use crate::query::{Direction, Filter, FilterOp, Query};

//=========================================================================================
// MemoryStore
//=========================================================================================

struct StoredDoc {
    collection: String,
    id: String,
    fields: Value,
}

#[derive(Default)]
struct StoreInner {
    docs: Vec<StoredDoc>,
    unavailable: bool,
}

/// In-memory `DocumentStore`.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<StoreInner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Test setup: inserts or replaces a document directly.
    pub fn insert(&self, collection: &str, id: &str, fields: Value) {
        let mut inner = self.inner.lock().unwrap();
        inner
            .docs
            .retain(|d| !(d.collection == collection && d.id == id));
        inner.docs.push(StoredDoc {
            collection: collection.to_string(),
            id: id.to_string(),
            fields,
        });
    }

    /// When set, every operation fails with `PortError::Unavailable`.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.inner.lock().unwrap().unavailable = unavailable;
    }

    pub fn doc_count(&self, collection: &str) -> usize {
        self.inner
            .lock()
            .unwrap()
            .docs
            .iter()
            .filter(|d| d.collection == collection)
            .count()
    }
}

fn filter_matches(fields: &Value, filter: &Filter) -> bool {
    let actual = fields.get(&filter.field);
    match filter.op {
        FilterOp::Eq => actual == Some(&filter.value),
        // A missing field never matches an inequality filter.
        FilterOp::Ne => actual.map_or(false, |v| v != &filter.value),
    }
}

fn compare_sort_keys(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::String(x)), Some(Value::String(y))) => {
            // Timestamp strings compare as instants, never as text: writers
            // vary in sub-second precision and offset, and "10:00:00.500Z"
            // sorts before "10:00:00Z" lexicographically.
            match (DateTime::parse_from_rfc3339(x), DateTime::parse_from_rfc3339(y)) {
                (Ok(tx), Ok(ty)) => tx.cmp(&ty),
                _ => x.cmp(y),
            }
        }
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        _ => Ordering::Equal,
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get_doc(&self, collection: &str, id: &str) -> PortResult<Option<Document>> {
        let inner = self.inner.lock().unwrap();
        if inner.unavailable {
            return Err(PortError::Unavailable("store offline".to_string()));
        }
        Ok(inner
            .docs
            .iter()
            .find(|d| d.collection == collection && d.id == id)
            .map(|d| Document {
                id: d.id.clone(),
                fields: d.fields.clone(),
            }))
    }

    async fn create_doc(&self, collection: &str, id: &str, fields: Value) -> PortResult<()> {
        let mut inner = self.inner.lock().unwrap();
        if inner.unavailable {
            return Err(PortError::Unavailable("store offline".to_string()));
        }
        if inner
            .docs
            .iter()
            .any(|d| d.collection == collection && d.id == id)
        {
            return Err(PortError::Conflict(format!("{collection}/{id} already exists")));
        }
        inner.docs.push(StoredDoc {
            collection: collection.to_string(),
            id: id.to_string(),
            fields,
        });
        Ok(())
    }

    async fn run_query(&self, query: Query) -> PortResult<Vec<Document>> {
        let inner = self.inner.lock().unwrap();
        if inner.unavailable {
            return Err(PortError::Unavailable("store offline".to_string()));
        }

        let mut matches: Vec<Document> = inner
            .docs
            .iter()
            .filter(|d| d.collection == query.collection)
            .filter(|d| query.filters.iter().all(|f| filter_matches(&d.fields, f)))
            .map(|d| Document {
                id: d.id.clone(),
                fields: d.fields.clone(),
            })
            .collect();

        if let Some((field, direction)) = &query.order_by {
            // sort_by is stable, so equal keys keep insertion order.
            matches.sort_by(|a, b| {
                let ord = compare_sort_keys(a.fields.get(field), b.fields.get(field));
                match direction {
                    Direction::Ascending => ord,
                    Direction::Descending => ord.reverse(),
                }
            });
        }
        if let Some(limit) = query.limit {
            matches.truncate(limit);
        }
        Ok(matches)
    }
}

//=========================================================================================
// MemoryIdentity
//=========================================================================================

struct IssuedSession {
    uid: String,
    email: Option<String>,
    issued_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

struct IdentityInner {
    users: Vec<IdentityUser>,
    id_tokens: HashMap<String, String>,
    sessions: HashMap<String, IssuedSession>,
    revoked: HashSet<String>,
    now: DateTime<Utc>,
    counter: u64,
}

/// In-memory `IdentityProvider` with a settable clock.
pub struct MemoryIdentity {
    inner: Mutex<IdentityInner>,
}

impl MemoryIdentity {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(IdentityInner {
                users: Vec::new(),
                id_tokens: HashMap::new(),
                sessions: HashMap::new(),
                revoked: HashSet::new(),
                now: Utc::now(),
                counter: 0,
            }),
        }
    }

    /// Registers an account, as the real provider would during client-side
    /// account creation.
    pub fn register_user(&self, uid: &str, email: &str) {
        self.inner.lock().unwrap().users.push(IdentityUser {
            uid: uid.to_string(),
            email: email.to_string(),
            display_name: None,
        });
    }

    /// Issues a short-lived id token for `uid`, as the client would obtain
    /// after authenticating against the provider.
    pub fn issue_id_token(&self, uid: &str) -> String {
        let mut inner = self.inner.lock().unwrap();
        inner.counter += 1;
        let token = format!("idtok-{}-{}", uid, inner.counter);
        inner.id_tokens.insert(token.clone(), uid.to_string());
        token
    }

    /// Moves the provider's clock forward.
    pub fn advance(&self, delta: Duration) {
        let mut inner = self.inner.lock().unwrap();
        inner.now += delta;
    }

    pub fn session_count(&self) -> usize {
        self.inner.lock().unwrap().sessions.len()
    }
}

impl Default for MemoryIdentity {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IdentityProvider for MemoryIdentity {
    async fn get_user_by_email(&self, email: &str) -> PortResult<IdentityUser> {
        self.inner
            .lock()
            .unwrap()
            .users
            .iter()
            .find(|u| u.email == email)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("no account for {email}")))
    }

    async fn create_session_cookie(
        &self,
        id_token: &str,
        expires_in_ms: i64,
    ) -> PortResult<String> {
        let mut inner = self.inner.lock().unwrap();
        let uid = inner
            .id_tokens
            .get(id_token)
            .cloned()
            .ok_or_else(|| PortError::InvalidSession("unknown id token".to_string()))?;
        let email = inner
            .users
            .iter()
            .find(|u| u.uid == uid)
            .map(|u| u.email.clone());

        inner.counter += 1;
        let artifact = format!("sess-{}-{}", uid, inner.counter);
        let issued_at = inner.now;
        inner.sessions.insert(
            artifact.clone(),
            IssuedSession {
                uid,
                email,
                issued_at,
                expires_at: issued_at + Duration::milliseconds(expires_in_ms),
            },
        );
        Ok(artifact)
    }

    async fn verify_session_cookie(
        &self,
        artifact: &str,
        check_revoked: bool,
    ) -> PortResult<SessionClaims> {
        let inner = self.inner.lock().unwrap();
        let session = inner
            .sessions
            .get(artifact)
            .ok_or_else(|| PortError::InvalidSession("unknown session artifact".to_string()))?;
        if inner.now >= session.expires_at {
            return Err(PortError::InvalidSession("session expired".to_string()));
        }
        if check_revoked && inner.revoked.contains(artifact) {
            return Err(PortError::InvalidSession("session revoked".to_string()));
        }
        Ok(SessionClaims {
            uid: session.uid.clone(),
            email: session.email.clone(),
            issued_at: session.issued_at,
            expires_at: session.expires_at,
        })
    }

    async fn revoke_session(&self, artifact: &str) -> PortResult<()> {
        self.inner
            .lock()
            .unwrap()
            .revoked
            .insert(artifact.to_string());
        Ok(())
    }
}
