use serde::{Deserialize, Deserializer, Serialize};

/// Marketplace role assigned by the identity provider.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    #[default]
    Customer,
    Provider,
    Admin,
}

impl Role {
    /// Case-insensitive parse. Anything that is not ADMIN or PROVIDER is a customer,
    /// matching the backend's default role for new accounts.
    pub fn parse_lenient(s: &str) -> Role {
        match s.trim().to_ascii_uppercase().as_str() {
            "ADMIN" => Role::Admin,
            "PROVIDER" => Role::Provider,
            _ => Role::Customer,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Customer => "CUSTOMER",
            Role::Provider => "PROVIDER",
            Role::Admin => "ADMIN",
        }
    }
}

impl From<&str> for Role {
    fn from(s: &str) -> Self { Role::parse_lenient(s) }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { f.write_str(self.as_str()) }
}

// Accepts any string (or null) so an odd role never makes the whole session unreadable.
impl<'de> Deserialize<'de> for Role {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let raw: Option<String> = Option::deserialize(d)?;
        Ok(raw.as_deref().map(Role::parse_lenient).unwrap_or_default())
    }
}
