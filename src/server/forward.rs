use axum::body::Body;
use axum::extract::Request;
use axum::http::{header, HeaderMap};
use axum::response::Response;
use tracing::warn;

use crate::error::{AppError, AppResult};

// Connection-scoped headers that must not cross the proxy; the body length is recomputed.
const HOP_BY_HOP: &[&str] = &[
    "connection",
    "keep-alive",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
    "proxy-authorization",
    "proxy-authenticate",
    "content-length",
];

fn strip_hop_by_hop(headers: &mut HeaderMap) {
    for h in HOP_BY_HOP {
        headers.remove(*h);
    }
}

/// An HTTP upstream requests are relayed to as-is (method, path, query, headers, body).
#[derive(Clone)]
pub struct Upstream {
    base: String,
    client: reqwest::Client,
    body_limit: usize,
}

impl Upstream {
    pub fn new(base: &str, body_limit: usize) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()?;
        Ok(Self { base: crate::backend::normalize_base(base)?, client, body_limit })
    }

    pub fn base(&self) -> &str { &self.base }

    /// Relay `req` to `<base><path?query>` and hand the upstream's answer back unchanged.
    /// The request body is buffered up to the body limit; the response body is streamed.
    pub async fn forward(&self, req: Request) -> AppResult<Response> {
        let (parts, body) = req.into_parts();
        let path_and_query = parts.uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("/");
        let url = format!("{}{}", self.base, path_and_query);

        let declared = parts.headers.get(header::CONTENT_LENGTH).and_then(|v| v.to_str().ok()).and_then(|v| v.parse::<usize>().ok());
        if declared.is_some_and(|n| n > self.body_limit) {
            return Err(AppError::too_large("request_body", format!("body exceeds {} bytes", self.body_limit).as_str()));
        }
        let bytes = axum::body::to_bytes(body, self.body_limit)
            .await
            .map_err(|e| AppError::user("request_body", e.to_string().as_str()))?;

        let mut headers = parts.headers.clone();
        strip_hop_by_hop(&mut headers);
        headers.remove(header::HOST);

        let resp = self.client
            .request(parts.method.clone(), &url)
            .headers(headers)
            .body(bytes)
            .send()
            .await
            .map_err(|e| {
                warn!(target: "forward", %url, error = %e, "upstream unreachable");
                AppError::upstream("upstream_unreachable", e.to_string().as_str())
            })?;

        let status = resp.status();
        let mut out_headers = resp.headers().clone();
        strip_hop_by_hop(&mut out_headers);

        // Streamed through; the response body is never held in full.
        let mut response = Response::new(Body::from_stream(resp.bytes_stream()));
        *response.status_mut() = status;
        *response.headers_mut() = out_headers;
        Ok(response)
    }
}
