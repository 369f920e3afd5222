//! services/api/src/web/auth.rs
//!
//! Authentication endpoints: sign-up, sign-in, sign-out, and current-user.

use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;
use utoipa::ToSchema;

use intervu_core::auth::{AuthResult, FailureKind};
use intervu_core::cookies::{RequestCookies, ResponseCookies};
use intervu_core::domain::{SignInParams, SignUpParams, User};

use crate::web::state::AppState;

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct SignUpRequest {
    pub uid: String,
    pub name: String,
    pub email: String,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SignInRequest {
    pub email: String,
    pub id_token: String,
}

/// Wire form of `AuthResult`. Sign-in success has no message; that field is
/// simply absent.
#[derive(Serialize, ToSchema)]
pub struct AuthResultResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct CurrentUserResponse {
    pub id: String,
    pub name: String,
    pub email: String,
}

impl From<User> for CurrentUserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
        }
    }
}

fn result_response(result: AuthResult, success_status: StatusCode) -> (StatusCode, Json<AuthResultResponse>) {
    match result {
        AuthResult::Success { message } => (
            success_status,
            Json(AuthResultResponse {
                success: true,
                message,
            }),
        ),
        AuthResult::Failure { message, kind } => {
            let status = match kind {
                FailureKind::Conflict => StatusCode::CONFLICT,
                FailureKind::NotFound => StatusCode::NOT_FOUND,
                FailureKind::Provider => StatusCode::INTERNAL_SERVER_ERROR,
            };
            (
                status,
                Json(AuthResultResponse {
                    success: false,
                    message: Some(message),
                }),
            )
        }
    }
}

fn request_cookies(headers: &HeaderMap) -> RequestCookies {
    RequestCookies::parse(headers.get(header::COOKIE).and_then(|v| v.to_str().ok()))
}

/// Applies queued Set-Cookie headers to an outbound response.
fn apply_cookies(response: &mut Response, cookies: ResponseCookies) {
    for cookie in cookies.into_headers() {
        match cookie.parse() {
            Ok(value) => {
                response.headers_mut().append(header::SET_COOKIE, value);
            }
            Err(e) => error!("unrepresentable Set-Cookie header: {e}"),
        }
    }
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /auth/sign-up - Create the profile for a freshly registered account
#[utoipa::path(
    post,
    path = "/auth/sign-up",
    request_body = SignUpRequest,
    responses(
        (status = 201, description = "Account created", body = AuthResultResponse),
        (status = 409, description = "Account or email already exists", body = AuthResultResponse),
        (status = 500, description = "Provider failure", body = AuthResultResponse)
    )
)]
pub async fn sign_up_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SignUpRequest>,
) -> impl IntoResponse {
    let result = state
        .auth
        .sign_up(SignUpParams {
            uid: req.uid,
            name: req.name,
            email: req.email,
        })
        .await;
    result_response(result, StatusCode::CREATED)
}

/// POST /auth/sign-in - Exchange an id token for a session cookie
#[utoipa::path(
    post,
    path = "/auth/sign-in",
    request_body = SignInRequest,
    responses(
        (status = 200, description = "Signed in; session cookie set", body = AuthResultResponse),
        (status = 404, description = "No such account", body = AuthResultResponse),
        (status = 500, description = "Provider failure", body = AuthResultResponse)
    )
)]
pub async fn sign_in_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SignInRequest>,
) -> Response {
    let mut cookies = ResponseCookies::new();
    let result = state
        .auth
        .sign_in(
            SignInParams {
                email: req.email,
                id_token: req.id_token,
            },
            &mut cookies,
        )
        .await;

    let mut response = result_response(result, StatusCode::OK).into_response();
    apply_cookies(&mut response, cookies);
    response
}

/// POST /auth/sign-out - Revoke the session and clear the cookie
#[utoipa::path(
    post,
    path = "/auth/sign-out",
    responses(
        (status = 200, description = "Session cleared", body = AuthResultResponse)
    )
)]
pub async fn sign_out_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Response {
    let request = request_cookies(&headers);
    let mut cookies = ResponseCookies::new();
    state.auth.sign_out(&request, &mut cookies).await;

    let body = Json(AuthResultResponse {
        success: true,
        message: None,
    });
    let mut response = (StatusCode::OK, body).into_response();
    apply_cookies(&mut response, cookies);
    response
}

/// GET /auth/me - Resolve the session cookie to its user
///
/// An absent or invalid session is a state, not an error: the body is
/// `null` and the status is still 200.
#[utoipa::path(
    get,
    path = "/auth/me",
    responses(
        (status = 200, description = "Current user, or null when unauthenticated", body = CurrentUserResponse)
    )
)]
pub async fn me_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Json<Option<CurrentUserResponse>> {
    let cookies = request_cookies(&headers);
    Json(state.auth.current_user(&cookies).await.map(Into::into))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_kinds_map_to_statuses() {
        let (status, _) = result_response(
            AuthResult::Failure {
                message: "taken".to_string(),
                kind: FailureKind::Conflict,
            },
            StatusCode::OK,
        );
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, _) = result_response(
            AuthResult::Failure {
                message: "who".to_string(),
                kind: FailureKind::NotFound,
            },
            StatusCode::OK,
        );
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[test]
    fn sign_in_success_serializes_without_message() {
        let (_, Json(body)) = result_response(AuthResult::Success { message: None }, StatusCode::OK);
        let json = serde_json::to_string(&body).unwrap();
        assert_eq!(json, r#"{"success":true}"#);
    }
}
