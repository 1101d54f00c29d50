//! Access gate
//! -----------
//! Runs before any page handler and decides, per navigation request, whether the
//! request proceeds or is redirected. The decision depends only on the request path
//! and the role of the session resolved for that request; the gate keeps no state
//! between requests.
//!
//! Evaluation order:
//! - paths under the bypass prefix (`/api`) and paths outside the matched set proceed
//!   without a session lookup;
//! - otherwise the session is resolved once; no session, or any resolver error,
//!   redirects to the login page;
//! - otherwise the role must be contained in the path's class (see [`policy::decide`]).

pub mod routes;
pub mod policy;
pub mod middleware;

use std::sync::Arc;

use axum::http::HeaderMap;
use tracing::debug;

use crate::identity::{SessionResolver, SessionUser, SharedResolver};

pub use routes::{canonical_path, is_under, PathError, PathPattern, RouteClass, RouteTable};
pub use policy::{decide, GateDecision};
pub use middleware::{access_gate, canonical_uri, request_id, RequestId};

/// Outcome of one gate evaluation: the decision plus the user it was based on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateOutcome {
    pub decision: GateDecision,
    pub user: Option<SessionUser>,
}

pub struct AccessGate {
    table: RouteTable,
    resolver: SharedResolver,
}

impl AccessGate {
    pub fn new(table: RouteTable, resolver: SharedResolver) -> Self { Self { table, resolver } }

    pub fn with_resolver<R: SessionResolver + 'static>(resolver: R) -> Self {
        Self::new(RouteTable::default(), Arc::new(resolver))
    }

    pub fn table(&self) -> &RouteTable { &self.table }

    /// Evaluate a request. Resolves the session at most once.
    ///
    /// The path is judged in canonical form; a path that has none is sent to the login page.
    pub async fn check(&self, path: &str, headers: &HeaderMap) -> GateOutcome {
        let path = match canonical_path(path) {
            Ok(p) => p,
            Err(e) => {
                debug!(target: "gate", error = %e, "path refused");
                return GateOutcome { decision: GateDecision::Redirect(self.table.login_path.clone()), user: None };
            }
        };
        let path = path.as_str();
        let class = self.table.classify(path);
        if class == RouteClass::Public {
            return GateOutcome { decision: GateDecision::Allow, user: None };
        }
        let user = match self.resolver.resolve(headers).await {
            Ok(u) => u,
            Err(e) => {
                debug!(target: "gate", path, error = %e, "session lookup failed");
                None
            }
        };
        let decision = decide(&self.table, user.as_ref().map(|u| u.role), class);
        debug!(target: "gate", path, ?class, role = ?user.as_ref().map(|u| u.role), ?decision, "gate decision");
        GateOutcome { decision, user }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::{Role, StaticSessionResolver};

    #[tokio::test]
    async fn public_paths_skip_the_lookup() {
        let resolver = Arc::new(StaticSessionResolver::anonymous());
        let gate = AccessGate::new(RouteTable::default(), resolver.clone());
        let h = HeaderMap::new();
        for p in ["/", "/meals", "/meals/42", "/api/orders", "/providers/7"] {
            assert_eq!(gate.check(p, &h).await.decision, GateDecision::Allow, "{}", p);
        }
        assert_eq!(resolver.calls(), 0);
    }

    #[tokio::test]
    async fn dot_segments_cannot_escape_into_gated_areas() {
        let resolver = Arc::new(StaticSessionResolver::anonymous());
        let gate = AccessGate::new(RouteTable::default(), resolver.clone());
        let h = HeaderMap::new();
        assert_eq!(gate.check("/meals/../admin/users", &h).await.decision, GateDecision::Redirect("/login".into()));
        assert_eq!(gate.check("/meals/%2e%2e/cart", &h).await.decision, GateDecision::Redirect("/login".into()));
        assert_eq!(gate.check("/meals%2F..%2Fcart", &h).await.decision, GateDecision::Redirect("/login".into()));
        assert_eq!(resolver.calls(), 2);
    }

    #[tokio::test]
    async fn resolver_error_is_treated_as_signed_out() {
        let gate = AccessGate::with_resolver(StaticSessionResolver::failing("identity provider unreachable"));
        let out = gate.check("/orders", &HeaderMap::new()).await;
        assert_eq!(out.decision, GateDecision::Redirect("/login".into()));
        assert!(out.user.is_none());
    }

    #[tokio::test]
    async fn allowed_outcome_carries_the_user() {
        let gate = AccessGate::with_resolver(StaticSessionResolver::with_role(Role::Provider));
        let out = gate.check("/provider/orders/123", &HeaderMap::new()).await;
        assert_eq!(out.decision, GateDecision::Allow);
        assert_eq!(out.user.map(|u| u.role), Some(Role::Provider));
    }
}
