use super::{Role, SessionUser};

/// Identity handed to downstream handlers once the gate lets a request through.
/// Read it with `Extension<RequestContext>` instead of resolving the session again.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    pub user: Option<SessionUser>,
    pub request_id: Option<String>,
}

impl RequestContext {
    pub fn role(&self) -> Option<Role> { self.user.as_ref().map(|u| u.role) }
    pub fn is_authenticated(&self) -> bool { self.user.is_some() }
}
