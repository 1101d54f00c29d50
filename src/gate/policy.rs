use crate::identity::Role;

use super::routes::{RouteClass, RouteTable};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    Allow,
    Redirect(String),
}

impl GateDecision {
    pub fn is_allow(&self) -> bool { matches!(self, GateDecision::Allow) }

    pub fn target(&self) -> Option<&str> {
        match self {
            GateDecision::Allow => None,
            GateDecision::Redirect(t) => Some(t.as_str()),
        }
    }
}

/// Role containment. `role` is `None` when no session could be resolved.
///
/// Admins stay inside the admin area, providers inside the provider area, and customers
/// are kept out of both; everyone else is sent to log in. Pure: the same inputs always
/// give the same decision.
pub fn decide(table: &RouteTable, role: Option<Role>, class: RouteClass) -> GateDecision {
    let redirect = |to: &str| GateDecision::Redirect(to.to_string());
    match (role, class) {
        (_, RouteClass::Public) => GateDecision::Allow,
        (None, _) => redirect(&table.login_path),
        (Some(Role::Admin), RouteClass::AdminOnly) => GateDecision::Allow,
        (Some(Role::Admin), RouteClass::CustomerDefault | RouteClass::ProviderOnly) => redirect(&table.admin_home),
        (Some(Role::Provider), RouteClass::ProviderOnly) => GateDecision::Allow,
        (Some(Role::Provider), RouteClass::CustomerDefault | RouteClass::AdminOnly) => redirect(&table.provider_home),
        (Some(Role::Customer), RouteClass::AdminOnly | RouteClass::ProviderOnly) => redirect(&table.customer_home),
        (Some(Role::Customer), RouteClass::CustomerDefault) => GateDecision::Allow,
    }
}
