use anyhow::{Context, Result};
use async_trait::async_trait;
use axum::http::HeaderMap;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use crate::backend::BackendClient;
use crate::tprintln;

use super::session::{cookie_header, parse_cookie, SessionResolver};
use super::{Role, SessionUser};

/// Cookie carrying the auth backend's signed session token.
pub const TOKEN_COOKIE: &str = "token";

/// Asks the identity provider for the current session, forwarding the caller's cookies.
/// One call per lookup; no timeout, no retry.
pub struct RemoteSessionResolver {
    backend: BackendClient,
}

impl RemoteSessionResolver {
    pub fn new(backend: BackendClient) -> Self { Self { backend } }
}

#[async_trait]
impl SessionResolver for RemoteSessionResolver {
    async fn resolve(&self, headers: &HeaderMap) -> Result<Option<SessionUser>> {
        let cookie = cookie_header(headers);
        self.backend.get_session(cookie.as_deref()).await
    }
}

/// Claims carried by the session token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<u64>,
}

impl From<SessionClaims> for SessionUser {
    fn from(c: SessionClaims) -> Self {
        SessionUser {
            id: c.id,
            name: c.name,
            email: c.email,
            role: c.role.as_deref().map(Role::parse_lenient).unwrap_or_default(),
            image: c.image,
        }
    }
}

/// Verifies the HS256 `token` cookie locally instead of calling out.
pub struct JwtSessionResolver {
    key: DecodingKey,
    validation: Validation,
}

impl JwtSessionResolver {
    pub fn new(secret: &[u8]) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Tokens without `exp` are accepted; `exp` is still enforced when present.
        validation.required_spec_claims.clear();
        Self { key: DecodingKey::from_secret(secret), validation }
    }

    pub fn verify(&self, token: &str) -> Result<SessionUser> {
        let data = decode::<SessionClaims>(token, &self.key, &self.validation).context("invalid session token")?;
        tprintln!("session.verify role={:?} id={:?}", data.claims.role, data.claims.id);
        Ok(data.claims.into())
    }
}

#[async_trait]
impl SessionResolver for JwtSessionResolver {
    async fn resolve(&self, headers: &HeaderMap) -> Result<Option<SessionUser>> {
        let Some(token) = parse_cookie(headers, TOKEN_COOKIE) else { return Ok(None); };
        self.verify(&token).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use jsonwebtoken::{encode, EncodingKey, Header};

    const SECRET: &[u8] = b"unit-test-secret";

    fn token(role: &str, exp: Option<u64>, secret: &[u8]) -> String {
        let claims = SessionClaims {
            id: Some("u-1".into()),
            name: Some("Rina".into()),
            email: Some("rina@example.com".into()),
            role: Some(role.into()),
            image: None,
            exp,
        };
        encode(&Header::default(), &claims, &EncodingKey::from_secret(secret)).unwrap()
    }

    fn headers_with_token(t: &str) -> HeaderMap {
        let mut h = HeaderMap::new();
        h.insert("cookie", HeaderValue::from_str(&format!("{}={}", TOKEN_COOKIE, t)).unwrap());
        h
    }

    fn future_exp() -> u64 { (chrono::Utc::now().timestamp() + 3600) as u64 }

    #[tokio::test]
    async fn valid_token_resolves_user() {
        let r = JwtSessionResolver::new(SECRET);
        let u = r.resolve(&headers_with_token(&token("provider", Some(future_exp()), SECRET))).await.unwrap().unwrap();
        assert_eq!(u.role, Role::Provider);
        assert_eq!(u.email.as_deref(), Some("rina@example.com"));
    }

    #[tokio::test]
    async fn token_without_exp_is_accepted() {
        let r = JwtSessionResolver::new(SECRET);
        let u = r.resolve(&headers_with_token(&token("ADMIN", None, SECRET))).await.unwrap().unwrap();
        assert_eq!(u.role, Role::Admin);
    }

    #[tokio::test]
    async fn missing_cookie_is_no_session() {
        let r = JwtSessionResolver::new(SECRET);
        assert!(r.resolve(&HeaderMap::new()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn bad_signature_and_expired_tokens_fail() {
        let r = JwtSessionResolver::new(SECRET);
        assert!(r.resolve(&headers_with_token(&token("admin", Some(future_exp()), b"other"))).await.is_err());
        let past = (chrono::Utc::now().timestamp() - 3600) as u64;
        assert!(r.resolve(&headers_with_token(&token("admin", Some(past), SECRET))).await.is_err());
        assert!(r.resolve(&headers_with_token("not-a-jwt")).await.is_err());
    }
}
