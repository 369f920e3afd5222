//! services/api/src/adapters/identity.rs
//!
//! This module contains the identity-provider adapter, the concrete
//! implementation of the `IdentityProvider` port. Id tokens and session
//! artifacts are both HS256 JWTs signed with the deployment secret and
//! distinguished by audience; revocation is a table of revoked `jti`s.
//!
//! Account creation and credential verification happen against the provider
//! from the client; this adapter only covers lookups, the id-token →
//! session-cookie exchange, and verification.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use intervu_core::domain::{IdentityUser, SessionClaims};
use intervu_core::ports::{IdentityProvider, PortError, PortResult};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Row};
use uuid::Uuid;

const AUDIENCE_ID_TOKEN: &str = "intervu/id";
const AUDIENCE_SESSION: &str = "intervu/session";

#[derive(Debug, Serialize, Deserialize)]
struct TokenClaims {
    sub: String,
    aud: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    email: Option<String>,
    iat: i64,
    exp: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    jti: Option<String>,
}

/// An identity-provider adapter signing sessions as JWTs, with its account
/// registry and revocation list in PostgreSQL.
#[derive(Clone)]
pub struct JwtIdentityAdapter {
    pool: PgPool,
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl JwtIdentityAdapter {
    pub fn new(pool: PgPool, secret: &str) -> Self {
        Self {
            pool,
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    /// Zero leeway keeps the 7-day expiry boundary exact.
    fn validation(audience: &str) -> Validation {
        let mut validation = Validation::default();
        validation.set_audience(&[audience]);
        validation.leeway = 0;
        validation
    }

    fn timestamp(secs: i64) -> PortResult<DateTime<Utc>> {
        DateTime::from_timestamp(secs, 0)
            .ok_or_else(|| PortError::InvalidSession("claim timestamp out of range".to_string()))
    }
}

#[async_trait]
impl IdentityProvider for JwtIdentityAdapter {
    async fn get_user_by_email(&self, email: &str) -> PortResult<IdentityUser> {
        let row = sqlx::query("SELECT uid, email, display_name FROM identity_users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| PortError::Unavailable(e.to_string()))?;

        let row = row.ok_or_else(|| PortError::NotFound(format!("no account for {email}")))?;
        Ok(IdentityUser {
            uid: row
                .try_get("uid")
                .map_err(|e| PortError::Unavailable(e.to_string()))?,
            email: row
                .try_get("email")
                .map_err(|e| PortError::Unavailable(e.to_string()))?,
            display_name: row
                .try_get("display_name")
                .map_err(|e| PortError::Unavailable(e.to_string()))?,
        })
    }

    async fn create_session_cookie(
        &self,
        id_token: &str,
        expires_in_ms: i64,
    ) -> PortResult<String> {
        let id_claims = decode::<TokenClaims>(
            id_token,
            &self.decoding,
            &Self::validation(AUDIENCE_ID_TOKEN),
        )
        .map_err(|e| PortError::InvalidSession(format!("id token rejected: {e}")))?
        .claims;

        let now = Utc::now();
        let claims = TokenClaims {
            sub: id_claims.sub,
            aud: AUDIENCE_SESSION.to_string(),
            email: id_claims.email,
            iat: now.timestamp(),
            exp: (now + Duration::milliseconds(expires_in_ms)).timestamp(),
            jti: Some(Uuid::new_v4().to_string()),
        };

        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| PortError::Unavailable(e.to_string()))
    }

    async fn verify_session_cookie(
        &self,
        artifact: &str,
        check_revoked: bool,
    ) -> PortResult<SessionClaims> {
        let claims = decode::<TokenClaims>(
            artifact,
            &self.decoding,
            &Self::validation(AUDIENCE_SESSION),
        )
        .map_err(|e| PortError::InvalidSession(e.to_string()))?
        .claims;

        if check_revoked {
            if let Some(jti) = &claims.jti {
                let revoked = sqlx::query("SELECT 1 AS one FROM revoked_sessions WHERE jti = $1")
                    .bind(jti)
                    .fetch_optional(&self.pool)
                    .await
                    .map_err(|e| PortError::Unavailable(e.to_string()))?;
                if revoked.is_some() {
                    return Err(PortError::InvalidSession("session revoked".to_string()));
                }
            }
        }

        Ok(SessionClaims {
            uid: claims.sub,
            email: claims.email,
            issued_at: Self::timestamp(claims.iat)?,
            expires_at: Self::timestamp(claims.exp)?,
        })
    }

    async fn revoke_session(&self, artifact: &str) -> PortResult<()> {
        // An artifact that no longer verifies has nothing left to revoke.
        let claims = match decode::<TokenClaims>(
            artifact,
            &self.decoding,
            &Self::validation(AUDIENCE_SESSION),
        ) {
            Ok(data) => data.claims,
            Err(_) => return Ok(()),
        };

        if let Some(jti) = claims.jti {
            sqlx::query("INSERT INTO revoked_sessions (jti) VALUES ($1) ON CONFLICT DO NOTHING")
                .bind(jti)
                .execute(&self.pool)
                .await
                .map_err(|e| PortError::Unavailable(e.to_string()))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::postgres::PgPoolOptions;

    const SECRET: &str = "test-secret";

    // connect_lazy never touches the network; these tests only exercise the
    // token paths that stay off the database.
    fn adapter() -> JwtIdentityAdapter {
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/unused")
            .expect("lazy pool");
        JwtIdentityAdapter::new(pool, SECRET)
    }

    fn issue_id_token(uid: &str, email: &str, ttl: Duration) -> String {
        let now = Utc::now();
        let claims = TokenClaims {
            sub: uid.to_string(),
            aud: AUDIENCE_ID_TOKEN.to_string(),
            email: Some(email.to_string()),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
            jti: None,
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn exchanges_id_token_for_week_long_session() {
        let adapter = adapter();
        let id_token = issue_id_token("u1", "ada@example.com", Duration::minutes(5));

        let artifact = adapter
            .create_session_cookie(&id_token, 604_800_000)
            .await
            .unwrap();
        let claims = adapter
            .verify_session_cookie(&artifact, false)
            .await
            .unwrap();

        assert_eq!(claims.uid, "u1");
        assert_eq!(claims.email.as_deref(), Some("ada@example.com"));
        assert_eq!(claims.expires_at - claims.issued_at, Duration::days(7));
    }

    #[tokio::test]
    async fn rejects_expired_id_token() {
        let adapter = adapter();
        let stale = issue_id_token("u1", "ada@example.com", Duration::seconds(-30));
        let err = adapter
            .create_session_cookie(&stale, 604_800_000)
            .await
            .unwrap_err();
        assert!(matches!(err, PortError::InvalidSession(_)));
    }

    #[tokio::test]
    async fn session_artifact_is_not_an_id_token() {
        let adapter = adapter();
        let id_token = issue_id_token("u1", "ada@example.com", Duration::minutes(5));
        let artifact = adapter
            .create_session_cookie(&id_token, 604_800_000)
            .await
            .unwrap();

        // Wrong audience either way round.
        assert!(adapter
            .create_session_cookie(&artifact, 604_800_000)
            .await
            .is_err());
        assert!(adapter.verify_session_cookie(&id_token, false).await.is_err());
    }

    #[tokio::test]
    async fn rejects_tampered_artifact() {
        let adapter = adapter();
        let id_token = issue_id_token("u1", "ada@example.com", Duration::minutes(5));
        let mut artifact = adapter
            .create_session_cookie(&id_token, 604_800_000)
            .await
            .unwrap();
        artifact.push('x');

        let err = adapter
            .verify_session_cookie(&artifact, false)
            .await
            .unwrap_err();
        assert!(matches!(err, PortError::InvalidSession(_)));
    }
}
