use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::uri::PathAndQuery;
use axum::http::{HeaderValue, Uri};
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};
use uuid::Uuid;

use crate::error::AppError;
use crate::identity::RequestContext;

use super::{canonical_path, AccessGate, GateDecision};

#[derive(Clone, Debug)]
pub struct RequestId(pub String);

/// Tag every request with an id (extension + `x-request-id` response header).
pub async fn request_id(mut req: Request, next: Next) -> Response {
    let id = Uuid::new_v4().to_string();
    req.extensions_mut().insert(RequestId(id.clone()));
    let mut resp = next.run(req).await;
    if let Ok(value) = HeaderValue::from_str(&id) {
        resp.headers_mut().insert("x-request-id", value);
    }
    resp
}

fn with_path(uri: &Uri, path: &str) -> Result<Uri, AppError> {
    let pq = match uri.query() {
        Some(q) => format!("{}?{}", path, q),
        None => path.to_string(),
    };
    let mut parts = uri.clone().into_parts();
    parts.path_and_query = Some(
        pq.parse::<PathAndQuery>()
            .map_err(|e| AppError::user("request_path", e.to_string().as_str()))?,
    );
    Uri::from_parts(parts).map_err(|e| AppError::user("request_path", e.to_string().as_str()))
}

/// Rewrite the request URI to its canonical path before routing and gating, so the
/// path that is judged is the path that is relayed. Encoded separators are a 400.
pub async fn canonical_uri(mut req: Request, next: Next) -> Response {
    let raw = req.uri().path();
    let path = match canonical_path(raw) {
        Ok(p) => p,
        Err(e) => return AppError::user("request_path", e.to_string().as_str()).into_response(),
    };
    if path != raw {
        match with_path(req.uri(), &path) {
            Ok(uri) => *req.uri_mut() = uri,
            Err(e) => return e.into_response(),
        }
    }
    next.run(req).await
}

/// Gate middleware. A redirect is terminal: nothing downstream runs.
/// On allow, downstream handlers find a [`RequestContext`] in the request extensions.
pub async fn access_gate(State(gate): State<Arc<AccessGate>>, mut req: Request, next: Next) -> Response {
    let path = req.uri().path().to_string();
    let outcome = gate.check(&path, req.headers()).await;
    match outcome.decision {
        GateDecision::Redirect(target) => Redirect::temporary(&target).into_response(),
        GateDecision::Allow => {
            let request_id = req.extensions().get::<RequestId>().map(|r| r.0.clone());
            req.extensions_mut().insert(RequestContext { user: outcome.user, request_id });
            next.run(req).await
        }
    }
}
