//!
//! mealgate HTTP server
//! --------------------
//! Axum front door for the meal marketplace. Every request passes the access gate;
//! what survives is relayed to one of two upstreams.
//!
//! Responsibilities:
//! - Access gate on page navigation (role-based redirects, see `crate::gate`).
//! - `/api/*` relayed to the REST backend; never gated.
//! - `GET /api/auth/session` answered locally when a JWT secret is configured.
//! - Everything else relayed to the page renderer. The role the gate resolved travels
//!   in `x-user-role`; a client-supplied value is always dropped.
//! - Paths are canonicalised before routing, so the gate and the upstreams see one path.
//! - Request ids and HTTP tracing.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::middleware::{from_fn, from_fn_with_state};
use axum::response::{IntoResponse, Response};
use axum::routing::{any, get};
use axum::{Json, Router};
use serde_json::json;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::backend::BackendClient;
use crate::config::{Config, SessionSource};
use crate::gate::{access_gate, canonical_uri, request_id, AccessGate, RouteTable};
use crate::identity::{parse_cookie, JwtSessionResolver, RemoteSessionResolver, RequestContext, Role, SharedResolver, TOKEN_COOKIE};

pub mod forward;

use forward::Upstream;

/// Shared server state injected into all handlers.
#[derive(Clone)]
pub struct AppState {
    /// REST backend (`/api/*`)
    pub backend: Upstream,
    /// Page renderer (everything the gate lets through)
    pub frontend: Upstream,
    /// Local token verifier backing `/api/auth/session`
    pub jwt: Option<Arc<JwtSessionResolver>>,
}

impl AppState {
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let jwt = config.jwt_secret.as_ref().map(|s| Arc::new(JwtSessionResolver::new(s.as_bytes())));
        Ok(Self {
            backend: Upstream::new(&config.backend_url, config.body_limit)?,
            frontend: Upstream::new(&config.frontend_url, config.body_limit)?,
            jwt,
        })
    }
}

/// Pick the session resolver named by the configuration.
pub fn session_resolver(config: &Config, state: &AppState) -> anyhow::Result<SharedResolver> {
    match (config.session_source, state.jwt.as_ref()) {
        (SessionSource::Jwt, Some(jwt)) => Ok(jwt.clone()),
        (SessionSource::Jwt, None) => Err(anyhow::anyhow!("session source 'jwt' requires JWT_SECRET")),
        (SessionSource::Remote, _) => {
            let backend = BackendClient::new(&config.api_url, &config.auth_url)?;
            Ok(Arc::new(RemoteSessionResolver::new(backend)))
        }
    }
}

/// Header carrying the gate's resolved role to the page renderer.
pub const USER_ROLE_HEADER: &str = "x-user-role";

/// Wrap any router in the gate.
///
/// The inner router is mounted as a fallback service so the canonical URI is in place
/// before it routes. Order on the way in: request id, canonical URI, gate, routing.
pub fn with_gate(router: Router, gate: Arc<AccessGate>) -> Router {
    Router::new()
        .fallback_service(router)
        .layer(from_fn_with_state(gate, access_gate))
        .layer(from_fn(canonical_uri))
        .layer(from_fn(request_id))
}

/// Replace any inbound identity header with the gate's own answer.
fn set_identity_header(headers: &mut HeaderMap, role: Option<Role>) {
    headers.remove(USER_ROLE_HEADER);
    if let Some(role) = role {
        headers.insert(USER_ROLE_HEADER, HeaderValue::from_static(role.as_str()));
    }
}

/// Full application router.
pub fn app_router(state: AppState, gate: Arc<AccessGate>) -> Router {
    let mut router = Router::new().route("/health", get(health));
    if state.jwt.is_some() {
        router = router.route("/api/auth/session", get(session_endpoint));
    }
    let router = router
        .route("/api", any(forward_api))
        .route("/api/{*path}", any(forward_api))
        .fallback(forward_page)
        .with_state(state);
    with_gate(router, gate).layer(TraceLayer::new_for_http())
}

/// Start the gateway on the configured port.
pub async fn run_with_config(config: Config) -> anyhow::Result<()> {
    let state = AppState::from_config(&config)?;
    let resolver = session_resolver(&config, &state)?;
    let gate = Arc::new(AccessGate::new(RouteTable::default(), resolver));

    info!(
        target: "startup",
        "mealgate upstreams: backend={}, frontend={}, auth={}, session_source={:?}",
        config.backend_url, config.frontend_url, config.auth_url, config.session_source
    );

    let app = app_router(state, gate);
    let addr: SocketAddr = format!("0.0.0.0:{}", config.http_port).parse()?;
    info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

async fn health() -> impl IntoResponse {
    Json(json!({"status": "ok"}))
}

async fn forward_api(State(state): State<AppState>, mut req: Request) -> Response {
    req.headers_mut().remove(USER_ROLE_HEADER);
    match state.backend.forward(req).await {
        Ok(resp) => resp,
        Err(e) => e.into_response(),
    }
}

async fn forward_page(State(state): State<AppState>, mut req: Request) -> Response {
    let role = req.extensions().get::<RequestContext>().and_then(|ctx| ctx.role());
    set_identity_header(req.headers_mut(), role);
    match state.frontend.forward(req).await {
        Ok(resp) => resp,
        Err(e) => e.into_response(),
    }
}

async fn session_endpoint(State(state): State<AppState>, headers: HeaderMap) -> impl IntoResponse {
    let Some(jwt) = state.jwt.as_ref() else {
        return (StatusCode::UNAUTHORIZED, Json(json!({"user": null})));
    };
    let Some(token) = parse_cookie(&headers, TOKEN_COOKIE) else {
        return (StatusCode::UNAUTHORIZED, Json(json!({"user": null})));
    };
    match jwt.verify(&token) {
        Ok(user) => (StatusCode::OK, Json(json!({"user": user}))),
        Err(_) => (StatusCode::UNAUTHORIZED, Json(json!({"user": null}))),
    }
}
