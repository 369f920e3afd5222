//! crates/intervu_core/src/session.rs
//!
//! The session-cookie lifecycle: creation, storage, reads, and verification.
//! The artifact itself is opaque here; signing and verification belong to
//! the identity provider behind the port.

use std::sync::Arc;

use crate::cookies::{RequestCookies, ResponseCookies};
use crate::domain::SessionClaims;
use crate::ports::{IdentityProvider, PortResult};

/// Name of the session cookie on the wire.
pub const SESSION_COOKIE: &str = "session";

/// Session lifetime: one week. The single source of truth for both the
/// artifact lifetime (provider wants milliseconds) and the cookie Max-Age
/// (seconds).
pub const SESSION_TTL_SECONDS: i64 = 60 * 60 * 24 * 7;

#[derive(Clone)]
pub struct SessionManager {
    identity: Arc<dyn IdentityProvider>,
    secure_cookies: bool,
}

impl SessionManager {
    pub fn new(identity: Arc<dyn IdentityProvider>, secure_cookies: bool) -> Self {
        Self {
            identity,
            secure_cookies,
        }
    }

    /// Exchanges a short-lived id token for a week-long session artifact.
    pub async fn create_session(&self, id_token: &str) -> PortResult<String> {
        // The only place the TTL is converted to milliseconds.
        self.identity
            .create_session_cookie(id_token, SESSION_TTL_SECONDS * 1000)
            .await
    }

    /// Queues the artifact as a scoped cookie on the outbound response.
    pub fn store_session(&self, cookies: &mut ResponseCookies, artifact: &str) {
        cookies.set(SESSION_COOKIE, artifact, SESSION_TTL_SECONDS, self.secure_cookies);
    }

    /// Queues an expired cookie, removing the session from the client.
    pub fn clear_session(&self, cookies: &mut ResponseCookies) {
        cookies.set(SESSION_COOKIE, "", 0, self.secure_cookies);
    }

    /// Reads the raw artifact off the inbound request. Performs no
    /// verification.
    pub fn read_session<'a>(&self, cookies: &'a RequestCookies) -> Option<&'a str> {
        cookies.get(SESSION_COOKIE)
    }

    /// Verifies an artifact with the identity provider. Malformed, expired,
    /// or (when `check_revoked`) revoked artifacts yield
    /// `PortError::InvalidSession`.
    pub async fn verify_session(
        &self,
        artifact: &str,
        check_revoked: bool,
    ) -> PortResult<SessionClaims> {
        self.identity
            .verify_session_cookie(artifact, check_revoked)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MemoryIdentity;
    use chrono::Duration;

    fn manager() -> (Arc<MemoryIdentity>, SessionManager) {
        let identity = Arc::new(MemoryIdentity::new());
        let manager = SessionManager::new(identity.clone(), false);
        (identity, manager)
    }

    #[test]
    fn ttl_is_one_week() {
        assert_eq!(SESSION_TTL_SECONDS, 604_800);
    }

    #[tokio::test]
    async fn session_round_trip_resolves_original_uid() {
        let (identity, manager) = manager();
        identity.register_user("u1", "ada@example.com");
        let id_token = identity.issue_id_token("u1");

        let artifact = manager.create_session(&id_token).await.unwrap();
        let mut response = ResponseCookies::new();
        manager.store_session(&mut response, &artifact);
        assert!(response.headers()[0].starts_with("session="));
        assert!(response.headers()[0].contains("Max-Age=604800"));

        // Simulate the browser sending the cookie back.
        let request = RequestCookies::parse(Some(&format!("session={artifact}")));
        let raw = manager.read_session(&request).unwrap();
        let claims = manager.verify_session(raw, true).await.unwrap();
        assert_eq!(claims.uid, "u1");
        assert_eq!(claims.expires_at - claims.issued_at, Duration::seconds(SESSION_TTL_SECONDS));
    }

    #[tokio::test]
    async fn ttl_boundary_is_exact() {
        let (identity, manager) = manager();
        identity.register_user("u1", "ada@example.com");
        let id_token = identity.issue_id_token("u1");
        let artifact = manager.create_session(&id_token).await.unwrap();

        identity.advance(Duration::seconds(SESSION_TTL_SECONDS) - Duration::seconds(1));
        assert!(manager.verify_session(&artifact, true).await.is_ok());

        identity.advance(Duration::seconds(2));
        let err = manager.verify_session(&artifact, true).await.unwrap_err();
        assert!(matches!(err, crate::ports::PortError::InvalidSession(_)));
    }

    #[tokio::test]
    async fn invalid_id_token_is_rejected() {
        let (_identity, manager) = manager();
        let err = manager.create_session("not-a-token").await.unwrap_err();
        assert!(matches!(err, crate::ports::PortError::InvalidSession(_)));
    }

    #[test]
    fn read_session_without_cookie_is_none() {
        let (_identity, manager) = manager();
        assert_eq!(manager.read_session(&RequestCookies::empty()), None);
    }

    #[test]
    fn clear_session_expires_the_cookie() {
        let (_identity, manager) = manager();
        let mut response = ResponseCookies::new();
        manager.clear_session(&mut response);
        assert!(response.headers()[0].starts_with("session=;"));
        assert!(response.headers()[0].contains("Max-Age=0"));
    }
}
