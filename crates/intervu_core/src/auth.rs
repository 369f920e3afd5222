//! crates/intervu_core/src/auth.rs
//!
//! The Auth Service: sign-up, sign-in, sign-out, and current-user
//! resolution. Every operation here is total over its result type: external
//! failures are caught, logged, and mapped to a typed failure or `None`,
//! never propagated to the caller as an error.

use std::sync::Arc;

use serde_json::json;
use tracing::{debug, error, warn};

use crate::cookies::{RequestCookies, ResponseCookies};
use crate::domain::{SignInParams, SignUpParams, User};
use crate::ports::{DocumentStore, IdentityProvider, PortError};
use crate::session::SessionManager;

/// Collection holding user profile documents, keyed by provider uid.
pub const USERS_COLLECTION: &str = "users";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The account or email already exists.
    Conflict,
    /// No matching account.
    NotFound,
    /// The identity provider or document store failed.
    Provider,
}

/// Outcome of a sign-up or sign-in. Sign-in success intentionally carries no
/// message (`message: None`); only sign-up announces one. That asymmetry is
/// part of the observable contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthResult {
    Success { message: Option<String> },
    Failure { message: String, kind: FailureKind },
}

impl AuthResult {
    fn success(message: impl Into<String>) -> Self {
        Self::Success {
            message: Some(message.into()),
        }
    }

    fn failure(kind: FailureKind, message: impl Into<String>) -> Self {
        Self::Failure {
            message: message.into(),
            kind,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

#[derive(Clone)]
pub struct AuthService {
    identity: Arc<dyn IdentityProvider>,
    store: Arc<dyn DocumentStore>,
    sessions: SessionManager,
}

impl AuthService {
    pub fn new(
        identity: Arc<dyn IdentityProvider>,
        store: Arc<dyn DocumentStore>,
        sessions: SessionManager,
    ) -> Self {
        Self {
            identity,
            store,
            sessions,
        }
    }

    /// Creates the profile document for a freshly registered account. The
    /// exists-check gives the specific message; the write itself is the
    /// store's atomic create-if-absent, so a concurrent sign-up for the same
    /// uid cannot double-create.
    pub async fn sign_up(&self, params: SignUpParams) -> AuthResult {
        let existing = match self.store.get_doc(USERS_COLLECTION, &params.uid).await {
            Ok(doc) => doc,
            Err(e) => {
                error!("sign-up lookup for {} failed: {e}", params.uid);
                return AuthResult::failure(
                    FailureKind::Provider,
                    "Failed to create account. Please try again.",
                );
            }
        };
        if existing.is_some() {
            return AuthResult::failure(
                FailureKind::Conflict,
                "User already exists. Please sign in instead.",
            );
        }

        let fields = json!({ "name": params.name, "email": params.email });
        match self.store.create_doc(USERS_COLLECTION, &params.uid, fields).await {
            Ok(()) => AuthResult::success("Account created successfully. Please sign in."),
            Err(PortError::Conflict(_)) => {
                AuthResult::failure(FailureKind::Conflict, "This email is already in use.")
            }
            Err(e) => {
                error!("sign-up write for {} failed: {e}", params.uid);
                AuthResult::failure(
                    FailureKind::Provider,
                    "Failed to create account. Please try again.",
                )
            }
        }
    }

    /// Verifies the account exists, then issues and stores the session
    /// cookie. No session is created for an unknown email.
    pub async fn sign_in(
        &self,
        params: SignInParams,
        cookies: &mut ResponseCookies,
    ) -> AuthResult {
        match self.identity.get_user_by_email(&params.email).await {
            Ok(_) => {}
            Err(PortError::NotFound(_)) => {
                return AuthResult::failure(
                    FailureKind::NotFound,
                    "User does not exist. Create an account instead.",
                );
            }
            Err(e) => {
                error!("sign-in lookup for {} failed: {e}", params.email);
                return AuthResult::failure(FailureKind::Provider, "Failed to log into an account.");
            }
        }

        match self.sessions.create_session(&params.id_token).await {
            Ok(artifact) => {
                self.sessions.store_session(cookies, &artifact);
                AuthResult::Success { message: None }
            }
            Err(e) => {
                error!("session creation for {} failed: {e}", params.email);
                AuthResult::failure(FailureKind::Provider, "Failed to log into an account.")
            }
        }
    }

    /// Revokes the current artifact (best effort) and expires the cookie.
    /// Terminal transition back to unauthenticated; never fails the caller.
    pub async fn sign_out(&self, request: &RequestCookies, response: &mut ResponseCookies) {
        if let Some(artifact) = self.sessions.read_session(request) {
            if let Err(e) = self.identity.revoke_session(artifact).await {
                warn!("session revocation failed: {e}");
            }
        }
        self.sessions.clear_session(response);
    }

    /// Resolves the session cookie to its user. Absent cookie, failed
    /// verification, or a missing profile document all yield `None`.
    pub async fn current_user(&self, cookies: &RequestCookies) -> Option<User> {
        let artifact = self.sessions.read_session(cookies)?;

        let claims = match self.sessions.verify_session(artifact, true).await {
            Ok(claims) => claims,
            Err(e) => {
                debug!("session rejected: {e}");
                return None;
            }
        };

        let doc = match self.store.get_doc(USERS_COLLECTION, &claims.uid).await {
            Ok(Some(doc)) => doc,
            Ok(None) => return None,
            Err(e) => {
                error!("profile lookup for {} failed: {e}", claims.uid);
                return None;
            }
        };

        match doc.decode::<User>() {
            Ok(user) => Some(user),
            Err(e) => {
                error!("profile document for {} is malformed: {e}", claims.uid);
                None
            }
        }
    }

    pub async fn is_authenticated(&self, cookies: &RequestCookies) -> bool {
        self.current_user(cookies).await.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MemoryIdentity, MemoryStore};
    use chrono::Duration;
    use crate::session::SESSION_TTL_SECONDS;

    struct Fixture {
        identity: Arc<MemoryIdentity>,
        store: Arc<MemoryStore>,
        auth: AuthService,
    }

    fn fixture() -> Fixture {
        let identity = Arc::new(MemoryIdentity::new());
        let store = Arc::new(MemoryStore::new());
        let sessions = SessionManager::new(identity.clone(), false);
        let auth = AuthService::new(identity.clone(), store.clone(), sessions);
        Fixture {
            identity,
            store,
            auth,
        }
    }

    fn sign_up_params(uid: &str) -> SignUpParams {
        SignUpParams {
            uid: uid.to_string(),
            name: "Ada Lovelace".to_string(),
            email: "ada@example.com".to_string(),
        }
    }

    /// Extracts the session artifact from a queued Set-Cookie header and
    /// builds the request context a browser would send back.
    fn replay_cookie(response: ResponseCookies) -> RequestCookies {
        let header = response.into_headers().remove(0);
        let pair = header.split(';').next().unwrap().to_string();
        RequestCookies::parse(Some(&pair))
    }

    async fn signed_in_fixture() -> (Fixture, RequestCookies) {
        let f = fixture();
        f.identity.register_user("u1", "ada@example.com");
        assert!(f.auth.sign_up(sign_up_params("u1")).await.is_success());

        let mut response = ResponseCookies::new();
        let id_token = f.identity.issue_id_token("u1");
        let result = f
            .auth
            .sign_in(
                SignInParams {
                    email: "ada@example.com".to_string(),
                    id_token,
                },
                &mut response,
            )
            .await;
        assert!(result.is_success());
        let request = replay_cookie(response);
        (f, request)
    }

    #[tokio::test]
    async fn sign_up_is_idempotent() {
        let f = fixture();

        let first = f.auth.sign_up(sign_up_params("u1")).await;
        assert_eq!(
            first,
            AuthResult::Success {
                message: Some("Account created successfully. Please sign in.".to_string())
            }
        );

        let second = f.auth.sign_up(sign_up_params("u1")).await;
        assert_eq!(
            second,
            AuthResult::Failure {
                message: "User already exists. Please sign in instead.".to_string(),
                kind: FailureKind::Conflict,
            }
        );
        assert_eq!(f.store.doc_count(USERS_COLLECTION), 1);
    }

    #[tokio::test]
    async fn sign_up_provider_failure_is_a_result_not_a_panic() {
        let f = fixture();
        f.store.set_unavailable(true);
        let result = f.auth.sign_up(sign_up_params("u1")).await;
        assert_eq!(
            result,
            AuthResult::Failure {
                message: "Failed to create account. Please try again.".to_string(),
                kind: FailureKind::Provider,
            }
        );
    }

    #[tokio::test]
    async fn sign_in_unknown_email_creates_no_session() {
        let f = fixture();
        let mut response = ResponseCookies::new();
        let result = f
            .auth
            .sign_in(
                SignInParams {
                    email: "nobody@x.com".to_string(),
                    id_token: "t".to_string(),
                },
                &mut response,
            )
            .await;

        assert_eq!(
            result,
            AuthResult::Failure {
                message: "User does not exist. Create an account instead.".to_string(),
                kind: FailureKind::NotFound,
            }
        );
        assert_eq!(f.identity.session_count(), 0);
        assert!(response.headers().is_empty());
    }

    #[tokio::test]
    async fn sign_in_success_carries_no_message() {
        let f = fixture();
        f.identity.register_user("u1", "ada@example.com");
        let id_token = f.identity.issue_id_token("u1");

        let mut response = ResponseCookies::new();
        let result = f
            .auth
            .sign_in(
                SignInParams {
                    email: "ada@example.com".to_string(),
                    id_token,
                },
                &mut response,
            )
            .await;

        assert_eq!(result, AuthResult::Success { message: None });
        assert!(response.headers()[0].starts_with("session="));
    }

    #[tokio::test]
    async fn sign_in_with_rejected_id_token_is_provider_failure() {
        let f = fixture();
        f.identity.register_user("u1", "ada@example.com");

        // Account exists, but the token exchange fails.
        let mut response = ResponseCookies::new();
        let result = f
            .auth
            .sign_in(
                SignInParams {
                    email: "ada@example.com".to_string(),
                    id_token: "bogus".to_string(),
                },
                &mut response,
            )
            .await;

        assert_eq!(
            result,
            AuthResult::Failure {
                message: "Failed to log into an account.".to_string(),
                kind: FailureKind::Provider,
            }
        );
        assert!(response.headers().is_empty());
    }

    #[tokio::test]
    async fn current_user_without_cookie_is_none() {
        let f = fixture();
        assert_eq!(f.auth.current_user(&RequestCookies::empty()).await, None);
        assert!(!f.auth.is_authenticated(&RequestCookies::empty()).await);
    }

    #[tokio::test]
    async fn current_user_resolves_profile_with_id() {
        let (f, request) = signed_in_fixture().await;
        let user = f.auth.current_user(&request).await.unwrap();
        assert_eq!(user.id, "u1");
        assert_eq!(user.name, "Ada Lovelace");
        assert_eq!(user.email, "ada@example.com");
        assert!(f.auth.is_authenticated(&request).await);
    }

    #[tokio::test]
    async fn current_user_without_profile_document_is_none() {
        let f = fixture();
        f.identity.register_user("ghost", "ghost@example.com");
        let id_token = f.identity.issue_id_token("ghost");
        let mut response = ResponseCookies::new();
        f.auth
            .sign_in(
                SignInParams {
                    email: "ghost@example.com".to_string(),
                    id_token,
                },
                &mut response,
            )
            .await;
        let request = replay_cookie(response);

        // Valid session, but no users/{uid} document.
        assert_eq!(f.auth.current_user(&request).await, None);
    }

    #[tokio::test]
    async fn expired_session_degrades_to_unauthenticated() {
        let (f, request) = signed_in_fixture().await;
        f.identity
            .advance(Duration::seconds(SESSION_TTL_SECONDS + 1));
        assert_eq!(f.auth.current_user(&request).await, None);
    }

    #[tokio::test]
    async fn sign_out_revokes_and_clears() {
        let (f, request) = signed_in_fixture().await;

        let mut response = ResponseCookies::new();
        f.auth.sign_out(&request, &mut response).await;
        assert!(response.headers()[0].contains("Max-Age=0"));

        // The revoked artifact no longer authenticates.
        assert_eq!(f.auth.current_user(&request).await, None);
    }

    #[tokio::test]
    async fn store_outage_during_lookup_is_none() {
        let (f, request) = signed_in_fixture().await;
        f.store.set_unavailable(true);
        assert_eq!(f.auth.current_user(&request).await, None);
    }
}
