//! services/api/src/web/interviews.rs
//!
//! Contains the Axum handlers for the interview and feedback endpoints and
//! the master definition for the OpenAPI specification.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;
use utoipa::{IntoParams, OpenApi, ToSchema};

use intervu_core::domain::{Feedback, FeedbackLookupParams, Interview, LatestInterviewsParams, User};
use intervu_core::ports::PortError;

use crate::web::state::AppState;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::web::auth::sign_up_handler,
        crate::web::auth::sign_in_handler,
        crate::web::auth::sign_out_handler,
        crate::web::auth::me_handler,
        home_feed_handler,
        my_interviews_handler,
        latest_interviews_handler,
        interview_detail_handler,
    ),
    components(
        schemas(
            crate::web::auth::SignUpRequest,
            crate::web::auth::SignInRequest,
            crate::web::auth::AuthResultResponse,
            crate::web::auth::CurrentUserResponse,
            InterviewResponse,
            FeedbackResponse,
            HomeFeedResponse,
            InterviewDetailResponse,
        )
    ),
    tags(
        (name = "Intervu API", description = "API endpoints for interview practice sessions and feedback.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InterviewResponse {
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

impl From<Interview> for InterviewResponse {
    fn from(i: Interview) -> Self {
        Self {
            id: i.id,
            user_id: i.user_id,
            role: i.role,
            interview_type: i.interview_type,
            techstack: i.techstack,
            questions: i.questions,
            finalized: i.finalized,
            created_at: i.created_at,
        }
    }
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackResponse {
    pub id: String,
    pub interview_id: String,
    pub user_id: String,
    pub total_score: f64,
    pub final_assessment: String,
    pub created_at: DateTime<Utc>,
}

impl From<Feedback> for FeedbackResponse {
    fn from(f: Feedback) -> Self {
        Self {
            id: f.id,
            interview_id: f.interview_id,
            user_id: f.user_id,
            total_score: f.total_score,
            final_assessment: f.final_assessment,
            created_at: f.created_at,
        }
    }
}

/// Both home-page lists in one payload: the user's own interviews and the
/// discovery feed of other users' finalized ones.
#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HomeFeedResponse {
    pub user_interviews: Vec<InterviewResponse>,
    pub latest_interviews: Vec<InterviewResponse>,
}

/// One interview with the viewing user's feedback, when it exists.
#[derive(Serialize, ToSchema)]
pub struct InterviewDetailResponse {
    pub interview: InterviewResponse,
    pub feedback: Option<FeedbackResponse>,
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct FeedParams {
    /// Maximum number of feed entries; defaults to 20.
    pub limit: Option<usize>,
}

/// Query failures propagate out of the core as `PortError`; here is the one
/// place they turn into HTTP statuses. Detail goes to the log, not the body.
fn port_error_response(e: PortError) -> (StatusCode, String) {
    error!("interview query failed: {e}");
    let status = match e {
        PortError::NotFound(_) => StatusCode::NOT_FOUND,
        PortError::Conflict(_) => StatusCode::CONFLICT,
        PortError::InvalidSession(_) => StatusCode::UNAUTHORIZED,
        PortError::Unavailable(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, "Failed to load interviews".to_string())
}

//=========================================================================================
// REST API Handlers
//=========================================================================================

/// GET /home - Both home-page interview lists
///
/// The two fetches are independent reads, so they are issued concurrently
/// and awaited jointly.
#[utoipa::path(
    get,
    path = "/home",
    responses(
        (status = 200, description = "Own interviews plus the discovery feed", body = HomeFeedResponse),
        (status = 401, description = "Not authenticated"),
        (status = 500, description = "Query failure")
    )
)]
pub async fn home_feed_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
) -> Result<Json<HomeFeedResponse>, (StatusCode, String)> {
    let (own, latest) = tokio::join!(
        state.interviews.interviews_by_user(&user.id),
        state.interviews.latest_interviews(LatestInterviewsParams {
            user_id: user.id.clone(),
            limit: None,
        }),
    );

    Ok(Json(HomeFeedResponse {
        user_interviews: own
            .map_err(port_error_response)?
            .into_iter()
            .map(Into::into)
            .collect(),
        latest_interviews: latest
            .map_err(port_error_response)?
            .into_iter()
            .map(Into::into)
            .collect(),
    }))
}

/// GET /interviews/mine - The authenticated user's interviews, newest first
#[utoipa::path(
    get,
    path = "/interviews/mine",
    responses(
        (status = 200, description = "Interviews owned by the caller", body = [InterviewResponse]),
        (status = 401, description = "Not authenticated"),
        (status = 500, description = "Query failure")
    )
)]
pub async fn my_interviews_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
) -> Result<Json<Vec<InterviewResponse>>, (StatusCode, String)> {
    let interviews = state
        .interviews
        .interviews_by_user(&user.id)
        .await
        .map_err(port_error_response)?;
    Ok(Json(interviews.into_iter().map(Into::into).collect()))
}

/// GET /interviews/latest - Other users' finalized interviews
#[utoipa::path(
    get,
    path = "/interviews/latest",
    params(FeedParams),
    responses(
        (status = 200, description = "Discovery feed", body = [InterviewResponse]),
        (status = 401, description = "Not authenticated"),
        (status = 500, description = "Query failure")
    )
)]
pub async fn latest_interviews_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    Query(params): Query<FeedParams>,
) -> Result<Json<Vec<InterviewResponse>>, (StatusCode, String)> {
    let interviews = state
        .interviews
        .latest_interviews(LatestInterviewsParams {
            user_id: user.id,
            limit: params.limit,
        })
        .await
        .map_err(port_error_response)?;
    Ok(Json(interviews.into_iter().map(Into::into).collect()))
}

/// GET /interviews/{id} - One interview plus the caller's feedback, if any
#[utoipa::path(
    get,
    path = "/interviews/{id}",
    params(
        ("id" = String, Path, description = "Interview document id")
    ),
    responses(
        (status = 200, description = "Interview detail", body = InterviewDetailResponse),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "No such interview"),
        (status = 500, description = "Query failure")
    )
)]
pub async fn interview_detail_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    Path(id): Path<String>,
) -> Result<Json<InterviewDetailResponse>, (StatusCode, String)> {
    let interview = state
        .interviews
        .interview_by_id(&id)
        .await
        .map_err(port_error_response)?
        .ok_or((StatusCode::NOT_FOUND, "Interview not found".to_string()))?;

    let feedback = state
        .interviews
        .feedback_by_interview(FeedbackLookupParams {
            interview_id: id,
            user_id: user.id,
        })
        .await
        .map_err(port_error_response)?;

    Ok(Json(InterviewDetailResponse {
        interview: interview.into(),
        feedback: feedback.map(Into::into),
    }))
}
