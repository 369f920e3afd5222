//! crates/intervu_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database or HTTP framework; the
//! serde attributes only fix the camelCase field names used by the
//! document store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A user profile, stored under `users/{uid}` in the document store.
/// `id` is assigned by the identity provider, not by us.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    #[serde(default)]
    pub id: String,
    pub name: String,
    pub email: String,
}

/// An account record held by the identity provider itself. Distinct from
/// `User`: the provider owns account creation, we only look accounts up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityUser {
    pub uid: String,
    pub email: String,
    pub display_name: Option<String>,
}

/// Claims decoded from a verified session artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionClaims {
    pub uid: String,
    pub email: Option<String>,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// A mock interview. Created by an external generation process; this core
/// only ever queries these records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Interview {
    #[serde(default)]
    pub id: String,
    pub user_id: String,
    pub role: String,
    #[serde(rename = "type")]
    pub interview_type: String,
    pub techstack: Vec<String>,
    pub questions: Vec<String>,
    pub finalized: bool,
    pub created_at: DateTime<Utc>,
}

/// AI-generated feedback for one interview, scoped to the user it was
/// graded for. Created by an external grading process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Feedback {
    #[serde(default)]
    pub id: String,
    pub interview_id: String,
    pub user_id: String,
    pub total_score: f64,
    pub final_assessment: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct SignUpParams {
    pub uid: String,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone)]
pub struct SignInParams {
    pub email: String,
    pub id_token: String,
}

#[derive(Debug, Clone)]
pub struct LatestInterviewsParams {
    pub user_id: String,
    /// Defaults to 20 when unset.
    pub limit: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct FeedbackLookupParams {
    pub interview_id: String,
    pub user_id: String,
}
