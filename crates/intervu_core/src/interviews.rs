//! crates/intervu_core/src/interviews.rs
//!
//! The Interview Query Service: a user's own interviews, the discovery feed
//! of other users' finalized interviews, and keyed interview/feedback
//! lookups. Unlike the auth boundary, provider failures here PROPAGATE as
//! `PortError`; the caller decides how to surface them.

use std::sync::Arc;

use crate::domain::{Feedback, FeedbackLookupParams, Interview, LatestInterviewsParams};
use crate::ports::{Document, DocumentStore, PortResult};
use crate::query::{Direction, FilterOp, Query};

pub const INTERVIEWS_COLLECTION: &str = "interviews";
pub const FEEDBACK_COLLECTION: &str = "feedback";

/// Default size of the discovery feed.
pub const DEFAULT_FEED_LIMIT: usize = 20;

#[derive(Clone)]
pub struct InterviewQueries {
    store: Arc<dyn DocumentStore>,
}

impl InterviewQueries {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// All interviews owned by `user_id`, most recent first.
    pub async fn interviews_by_user(&self, user_id: &str) -> PortResult<Vec<Interview>> {
        let docs = self
            .store
            .run_query(
                Query::collection(INTERVIEWS_COLLECTION)
                    .filter("userId", FilterOp::Eq, user_id)
                    .order_by("createdAt", Direction::Descending),
            )
            .await?;
        docs.into_iter().map(Document::decode).collect()
    }

    /// Other users' finalized interviews, most recent first, truncated to
    /// the limit. The caller's own interviews are excluded.
    pub async fn latest_interviews(
        &self,
        params: LatestInterviewsParams,
    ) -> PortResult<Vec<Interview>> {
        let limit = params.limit.unwrap_or(DEFAULT_FEED_LIMIT);
        let docs = self
            .store
            .run_query(
                Query::collection(INTERVIEWS_COLLECTION)
                    .filter("finalized", FilterOp::Eq, true)
                    .filter("userId", FilterOp::Ne, params.user_id.as_str())
                    .order_by("createdAt", Direction::Descending)
                    .limit(limit),
            )
            .await?;
        docs.into_iter().map(Document::decode).collect()
    }

    /// Keyed lookup; `None` when the interview does not exist.
    pub async fn interview_by_id(&self, id: &str) -> PortResult<Option<Interview>> {
        match self.store.get_doc(INTERVIEWS_COLLECTION, id).await? {
            Some(doc) => Ok(Some(doc.decode()?)),
            None => Ok(None),
        }
    }

    /// Feedback for one interview as graded for one viewing user. The
    /// ownership check is baked into the query, not a separate
    /// authorization layer.
    pub async fn feedback_by_interview(
        &self,
        params: FeedbackLookupParams,
    ) -> PortResult<Option<Feedback>> {
        let docs = self
            .store
            .run_query(
                Query::collection(FEEDBACK_COLLECTION)
                    .filter("interviewId", FilterOp::Eq, params.interview_id.as_str())
                    .filter("userId", FilterOp::Eq, params.user_id.as_str())
                    .limit(1),
            )
            .await?;
        docs.into_iter().next().map(Document::decode).transpose()
    }
}
