use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use axum::http::HeaderMap;

use super::{Role, SessionUser};

/// Looks up the session behind an inbound request.
///
/// `Ok(None)` means no session. Errors are the resolver's business to report; callers
/// that only need a yes/no (the gate) treat them exactly like `Ok(None)`.
#[async_trait]
pub trait SessionResolver: Send + Sync {
    async fn resolve(&self, headers: &HeaderMap) -> Result<Option<SessionUser>>;
}

pub type SharedResolver = Arc<dyn SessionResolver>;

/// Fixed answer, independent of the request. Counts lookups so callers can assert
/// whether a lookup happened at all.
pub struct StaticSessionResolver {
    answer: std::result::Result<Option<SessionUser>, String>,
    calls: AtomicUsize,
}

impl StaticSessionResolver {
    pub fn anonymous() -> Self { Self { answer: Ok(None), calls: AtomicUsize::new(0) } }
    pub fn signed_in(user: SessionUser) -> Self { Self { answer: Ok(Some(user)), calls: AtomicUsize::new(0) } }
    pub fn with_role(role: Role) -> Self { Self::signed_in(SessionUser::with_role(role)) }
    pub fn failing<S: Into<String>>(msg: S) -> Self { Self { answer: Err(msg.into()), calls: AtomicUsize::new(0) } }

    pub fn calls(&self) -> usize { self.calls.load(Ordering::SeqCst) }
}

#[async_trait]
impl SessionResolver for StaticSessionResolver {
    async fn resolve(&self, _headers: &HeaderMap) -> Result<Option<SessionUser>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.answer {
            Ok(u) => Ok(u.clone()),
            Err(e) => Err(anyhow!(e.clone())),
        }
    }
}

/// Value of a single cookie from the request's `Cookie` header.
pub fn parse_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    let s = cookie_header(headers)?;
    for part in s.split(';') {
        let p = part.trim();
        if let Some((k, v)) = p.split_once('=') {
            if k.trim() == name { return Some(v.trim().to_string()); }
        }
    }
    None
}

/// The raw `Cookie` header, for forwarding to the identity provider or backend.
pub fn cookie_header(headers: &HeaderMap) -> Option<String> {
    let joined = headers
        .get_all(axum::http::header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .collect::<Vec<_>>()
        .join("; ");
    if joined.is_empty() { None } else { Some(joined) }
}
