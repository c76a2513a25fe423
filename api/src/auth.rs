//! Request identity.
//!
//! Tokens are HS256 JWTs issued elsewhere, presented either as
//! `Authorization: Bearer <token>` or in the configured cookie. A valid
//! token mirrors its user into the local `users` table; the row is only
//! written when it is missing or the username changed.

use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::header::{AUTHORIZATION, COOKIE};
use axum::http::request::Parts;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use tsundoku_core::models::User;
use tsundoku_core::storage::UserRepository;
use tsundoku_core::Error as CoreError;

use crate::handlers::blocking;
use crate::{ApiError, ApiState};

pub const DEFAULT_AUTH_COOKIE: &str = "access_token";

/// JWT claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User ID
    pub sub: String,
    pub username: String,
    #[serde(default)]
    pub admin: bool,
    /// Expiration time (Unix timestamp)
    pub exp: u64,
}

/// Identity resolved from a valid token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub id: i64,
    pub username: String,
    pub admin: bool,
}

impl AuthUser {
    pub fn require_admin(&self) -> Result<(), ApiError> {
        if self.admin {
            Ok(())
        } else {
            Err(CoreError::PermissionDenied("admin privileges required".to_string()).into())
        }
    }
}

#[derive(Clone)]
pub struct AuthGateway {
    key: DecodingKey,
    validation: Validation,
    cookie_name: String,
}

impl AuthGateway {
    pub fn new(secret: &str, cookie_name: impl Into<String>) -> Self {
        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
            cookie_name: cookie_name.into(),
        }
    }

    /// Verify and decode a token
    pub fn verify(&self, token: &str) -> Result<AuthUser, ApiError> {
        let data = decode::<Claims>(token, &self.key, &self.validation).map_err(|e| {
            tracing::warn!(error = %e, "rejected token");
            ApiError::Unauthenticated
        })?;

        let id = data.claims.sub.parse::<i64>().map_err(|_| {
            tracing::warn!(sub = %data.claims.sub, "token subject is not a user id");
            ApiError::Unauthenticated
        })?;

        Ok(AuthUser {
            id,
            username: data.claims.username,
            admin: data.claims.admin,
        })
    }

    /// Bearer token if present, otherwise the auth cookie
    fn token(&self, parts: &Parts) -> Option<String> {
        let bearer = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer "))
            .map(|t| t.trim().to_string());
        if bearer.is_some() {
            return bearer;
        }

        parts
            .headers
            .get_all(COOKIE)
            .iter()
            .filter_map(|h| h.to_str().ok())
            .flat_map(|h| h.split(';'))
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(name, _)| *name == self.cookie_name)
            .map(|(_, value)| value.to_string())
    }
}

/// The caller's identity, or `None` for anonymous requests.
/// A token that is present but invalid is still rejected with 401.
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<AuthUser>);

/// The caller's identity; anonymous requests are rejected with 401.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub AuthUser);

#[axum::async_trait]
impl FromRequestParts<Arc<ApiState>> for MaybeUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &Arc<ApiState>) -> Result<Self, Self::Rejection> {
        let Some(token) = state.auth.token(parts) else {
            return Ok(MaybeUser(None));
        };
        let user = state.auth.verify(&token)?;

        let db = state.db.clone();
        let row = User::new(user.id, user.username.clone());
        let written = blocking(move || {
            let conn = db.connect()?;
            UserRepository::sync(&conn, &row)
        })
        .await?;
        if written {
            tracing::debug!(user_id = user.id, username = %user.username, "user row synced from token");
        }

        Ok(MaybeUser(Some(user)))
    }
}

#[axum::async_trait]
impl FromRequestParts<Arc<ApiState>> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &Arc<ApiState>) -> Result<Self, Self::Rejection> {
        match MaybeUser::from_request_parts(parts, state).await? {
            MaybeUser(Some(user)) => Ok(CurrentUser(user)),
            MaybeUser(None) => Err(ApiError::Unauthenticated),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;
    use jsonwebtoken::{encode, EncodingKey, Header};

    const SECRET: &str = "test-secret";

    fn token(sub: &str, exp: u64) -> String {
        let claims = Claims {
            sub: sub.to_string(),
            username: "alice".to_string(),
            admin: false,
            exp,
        };
        encode(&Header::default(), &claims, &EncodingKey::from_secret(SECRET.as_bytes())).unwrap()
    }

    fn far_future() -> u64 {
        (chrono::Utc::now().timestamp() + 3600) as u64
    }

    fn parts(header: (&str, String)) -> Parts {
        let (parts, _) = Request::builder()
            .header(header.0, header.1)
            .body(())
            .unwrap()
            .into_parts();
        parts
    }

    #[test]
    fn test_verify_valid_token() {
        let gateway = AuthGateway::new(SECRET, DEFAULT_AUTH_COOKIE);
        let user = gateway.verify(&token("7", far_future())).unwrap();
        assert_eq!(user.id, 7);
        assert_eq!(user.username, "alice");
        assert!(user.require_admin().is_err());
    }

    #[test]
    fn test_verify_rejects_bad_tokens() {
        let gateway = AuthGateway::new(SECRET, DEFAULT_AUTH_COOKIE);
        assert!(gateway.verify(&token("7", 1_000)).is_err());
        assert!(gateway.verify(&token("not-a-number", far_future())).is_err());
        assert!(AuthGateway::new("other", DEFAULT_AUTH_COOKIE)
            .verify(&token("7", far_future()))
            .is_err());
    }

    #[test]
    fn test_token_sources() {
        let gateway = AuthGateway::new(SECRET, "session");

        let bearer = parts(("authorization", "Bearer abc".to_string()));
        assert_eq!(gateway.token(&bearer).as_deref(), Some("abc"));

        let cookie = parts(("cookie", "theme=dark; session=xyz".to_string()));
        assert_eq!(gateway.token(&cookie).as_deref(), Some("xyz"));

        let other = parts(("cookie", "theme=dark".to_string()));
        assert_eq!(gateway.token(&other), None);
    }
}
