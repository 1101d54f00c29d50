use serde::{Deserialize, Serialize};

use super::Role;

/// The user behind a resolved session, as reported by the identity provider.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionUser {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub image: Option<String>,
}

impl SessionUser {
    pub fn with_role(role: Role) -> Self { Self { role, ..Default::default() } }
}

/// Wire shape of a session lookup: `{ "user": {...} }`, `{ "user": null }` or a bare `null`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionEnvelope {
    #[serde(default)]
    pub user: Option<SessionUser>,
}

impl SessionEnvelope {
    /// Decode a session body; a JSON `null` means no session.
    pub fn decode(body: &[u8]) -> serde_json::Result<Option<SessionUser>> {
        let env: Option<SessionEnvelope> = serde_json::from_slice(body)?;
        Ok(env.and_then(|e| e.user))
    }
}
