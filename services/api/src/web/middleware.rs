//! services/api/src/web/middleware.rs
//!
//! Authentication middleware for protecting routes.

use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

use intervu_core::cookies::RequestCookies;

use crate::web::state::AppState;

/// Middleware that resolves the session cookie to a user.
///
/// If valid, inserts the `User` into request extensions for handlers to use.
/// If invalid or missing, returns 401 Unauthorized. Verification failures
/// are already logged inside the auth service.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let cookies = RequestCookies::parse(
        req.headers()
            .get(header::COOKIE)
            .and_then(|v| v.to_str().ok()),
    );

    let user = state
        .auth
        .current_user(&cookies)
        .await
        .ok_or(StatusCode::UNAUTHORIZED)?;

    req.extensions_mut().insert(user);
    Ok(next.run(req).await)
}
