//! Thin HTTP client for the marketplace REST backend and its identity provider.
//! Callers pass the browser's `Cookie` header through; the client itself keeps no
//! cookie jar, so one user's session never leaks into another's request.

use anyhow::{anyhow, Context, Result};
use reqwest::header::{HeaderMap, HeaderValue, COOKIE};
use reqwest::Url;

use crate::checkout::{OrderError, OrderRequest, OrderStatus};
use crate::identity::{SessionEnvelope, SessionUser};

#[derive(Clone)]
pub struct BackendClient {
    api_base: String,
    auth_base: String,
    client: reqwest::Client,
}

/// Validate an absolute base URL and drop any trailing slash so endpoints can be appended.
pub fn normalize_base(raw: &str) -> Result<String> {
    let url = Url::parse(raw).with_context(|| format!("invalid base URL: {}", raw))?;
    if url.cannot_be_a_base() { return Err(anyhow!("not a base URL: {}", raw)); }
    Ok(raw.trim_end_matches('/').to_string())
}

impl BackendClient {
    pub fn new(api_base: &str, auth_base: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()?;
        Ok(Self { api_base: normalize_base(api_base)?, auth_base: normalize_base(auth_base)?, client })
    }

    pub fn api_base(&self) -> &str { &self.api_base }
    pub fn auth_base(&self) -> &str { &self.auth_base }

    fn cookie_headers(cookie: Option<&str>) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Some(c) = cookie {
            if let Ok(v) = HeaderValue::from_str(c) { headers.insert(COOKIE, v); }
        }
        headers
    }

    /// `GET <auth>/get-session`. `Ok(None)` when the provider reports no session.
    pub async fn get_session(&self, cookie: Option<&str>) -> Result<Option<SessionUser>> {
        let url = format!("{}/get-session", self.auth_base);
        let resp = self.client
            .get(&url)
            .headers(Self::cookie_headers(cookie))
            .send()
            .await
            .with_context(|| format!("session lookup failed: {}", url))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(anyhow!("session lookup failed: HTTP {}", status));
        }
        let body = resp.bytes().await?;
        SessionEnvelope::decode(&body).context("malformed session response")
    }

    /// `POST <api>/orders`. Returns the backend's `data` payload.
    pub async fn create_order(&self, cookie: Option<&str>, order: &OrderRequest) -> std::result::Result<serde_json::Value, OrderError> {
        let url = format!("{}/orders", self.api_base);
        let req = self.client.post(&url).headers(Self::cookie_headers(cookie)).json(order);
        let val = Self::send_order_call(req, "Failed to create order").await?;
        Ok(val.get("data").cloned().unwrap_or(serde_json::Value::Null))
    }

    /// `PATCH <api>/orders/{id}` with `{"status": ...}`.
    pub async fn update_order_status(&self, cookie: Option<&str>, order_id: &str, status: OrderStatus) -> std::result::Result<(), OrderError> {
        let mut url = Url::parse(&self.api_base).map_err(|e| OrderError::Transport(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| OrderError::Transport(format!("not a base URL: {}", self.api_base)))?
            .pop_if_empty()
            .push("orders")
            .push(order_id);
        let req = self.client
            .patch(url)
            .headers(Self::cookie_headers(cookie))
            .json(&serde_json::json!({ "status": status }));
        Self::send_order_call(req, "Update failed").await?;
        Ok(())
    }

    // 401 is always the login prompt; other failures carry the backend's `message` or `fallback`.
    async fn send_order_call(req: reqwest::RequestBuilder, fallback: &str) -> std::result::Result<serde_json::Value, OrderError> {
        let resp = req.send().await.map_err(|e| OrderError::Transport(e.to_string()))?;
        let status = resp.status();
        let val: serde_json::Value = resp.json().await.unwrap_or(serde_json::Value::Null);
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(OrderError::Unauthorized);
        }
        if !status.is_success() {
            let message = val.get("message").and_then(|m| m.as_str()).unwrap_or(fallback).to_string();
            return Err(OrderError::Rejected { message });
        }
        Ok(val)
    }
}
