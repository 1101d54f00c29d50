//! Runtime configuration: environment variables (optionally from `.env`) with CLI flag overrides.

use std::fmt;

use crate::backend::normalize_base;

pub const DEFAULT_HTTP_PORT: u16 = 3000;
pub const DEFAULT_BACKEND_URL: &str = "http://localhost:5000";
pub const DEFAULT_FRONTEND_URL: &str = "http://localhost:3001";
pub const DEFAULT_BODY_LIMIT: usize = 10 * 1024 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{name} is not a valid absolute URL: {value}")]
    InvalidUrl { name: &'static str, value: String },
    #[error("{name} is not a valid number: {value}")]
    InvalidNumber { name: &'static str, value: String },
    #[error("unknown session source '{0}' (expected 'remote' or 'jwt')")]
    UnknownSessionSource(String),
    #[error("session source 'jwt' requires JWT_SECRET")]
    MissingJwtSecret,
}

/// Where the gate gets sessions from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionSource {
    /// Ask the identity provider over HTTP on every gated request.
    Remote,
    /// Verify the signed `token` cookie locally.
    Jwt,
}

impl SessionSource {
    pub fn parse(s: &str) -> Result<Self, ConfigError> {
        match s.trim().to_ascii_lowercase().as_str() {
            "remote" => Ok(SessionSource::Remote),
            "jwt" => Ok(SessionSource::Jwt),
            other => Err(ConfigError::UnknownSessionSource(other.to_string())),
        }
    }
}

#[derive(Clone)]
pub struct Config {
    pub http_port: u16,
    pub backend_url: String,
    pub frontend_url: String,
    pub api_url: String,
    pub auth_url: String,
    pub session_source: SessionSource,
    pub jwt_secret: Option<String>,
    pub body_limit: usize,
}

// Hand-written so the secret never lands in logs.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("http_port", &self.http_port)
            .field("backend_url", &self.backend_url)
            .field("frontend_url", &self.frontend_url)
            .field("api_url", &self.api_url)
            .field("auth_url", &self.auth_url)
            .field("session_source", &self.session_source)
            .field("jwt_secret", &self.jwt_secret.as_ref().map(|_| "<redacted>"))
            .field("body_limit", &self.body_limit)
            .finish()
    }
}

/// Value following `flag` in the argument list, if any.
pub fn parse_arg(args: &[String], flag: &str) -> Option<String> {
    let mut i = 0;
    while i < args.len() {
        if args[i] == flag && i + 1 < args.len() {
            return Some(args[i + 1].clone());
        }
        i += 1;
    }
    None
}

pub fn has_flag(args: &[String], flag: &str) -> bool {
    args.iter().any(|a| a == flag)
}

fn url_setting(name: &'static str, value: String) -> Result<String, ConfigError> {
    normalize_base(&value).map_err(|_| ConfigError::InvalidUrl { name, value })
}

fn number_setting<T: std::str::FromStr>(name: &'static str, value: String) -> Result<T, ConfigError> {
    value.trim().parse::<T>().map_err(|_| ConfigError::InvalidNumber { name, value })
}

impl Config {
    /// Process environment plus command-line flags (flags win).
    pub fn from_env_and_args(args: &[String]) -> Result<Self, ConfigError> {
        Self::from_lookup(|k| std::env::var(k).ok(), args)
    }

    /// Build from an arbitrary variable lookup; used directly by tests.
    pub fn from_lookup<F>(lookup: F, args: &[String]) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let pick = |flag: &str, var: &str| parse_arg(args, flag).or_else(|| lookup(var)).filter(|v| !v.trim().is_empty());

        let http_port = match pick("--http-port", "MEALGATE_HTTP_PORT") {
            Some(v) => number_setting("MEALGATE_HTTP_PORT", v)?,
            None => DEFAULT_HTTP_PORT,
        };
        let backend_url = url_setting("BACKEND_URL", pick("--backend-url", "BACKEND_URL").unwrap_or_else(|| DEFAULT_BACKEND_URL.to_string()))?;
        let frontend_url = url_setting("FRONTEND_URL", pick("--frontend-url", "FRONTEND_URL").unwrap_or_else(|| DEFAULT_FRONTEND_URL.to_string()))?;
        let api_url = url_setting("API_URL", pick("--api-url", "API_URL").unwrap_or_else(|| format!("{}/api", backend_url)))?;
        let auth_url = url_setting("AUTH_URL", pick("--auth-url", "AUTH_URL").unwrap_or_else(|| format!("{}/auth", api_url)))?;
        let session_source = match pick("--session-source", "MEALGATE_SESSION_SOURCE") {
            Some(v) => SessionSource::parse(&v)?,
            None => SessionSource::Remote,
        };
        let jwt_secret = lookup("JWT_SECRET").filter(|s| !s.is_empty());
        if session_source == SessionSource::Jwt && jwt_secret.is_none() {
            return Err(ConfigError::MissingJwtSecret);
        }
        let body_limit = match pick("--body-limit", "MEALGATE_BODY_LIMIT") {
            Some(v) => number_setting("MEALGATE_BODY_LIMIT", v)?,
            None => DEFAULT_BODY_LIMIT,
        };

        Ok(Config { http_port, backend_url, frontend_url, api_url, auth_url, session_source, jwt_secret, body_limit })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let m: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |k| m.get(k).cloned()
    }

    #[test]
    fn defaults_derive_api_and_auth_from_backend() {
        let c = Config::from_lookup(lookup(&[]), &[]).unwrap();
        assert_eq!(c.http_port, 3000);
        assert_eq!(c.backend_url, "http://localhost:5000");
        assert_eq!(c.api_url, "http://localhost:5000/api");
        assert_eq!(c.auth_url, "http://localhost:5000/api/auth");
        assert_eq!(c.session_source, SessionSource::Remote);
        assert_eq!(c.body_limit, DEFAULT_BODY_LIMIT);
    }

    #[test]
    fn flags_override_environment() {
        let args: Vec<String> = ["mealgate_server", "--http-port", "8088", "--backend-url", "http://api.internal:9000/"]
            .iter().map(|s| s.to_string()).collect();
        let c = Config::from_lookup(lookup(&[("MEALGATE_HTTP_PORT", "7000"), ("BACKEND_URL", "http://ignored:1")]), &args).unwrap();
        assert_eq!(c.http_port, 8088);
        assert_eq!(c.backend_url, "http://api.internal:9000");
        assert_eq!(c.api_url, "http://api.internal:9000/api");
    }

    #[test]
    fn invalid_values_are_reported() {
        let err = Config::from_lookup(lookup(&[("BACKEND_URL", "not a url")]), &[]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidUrl { name: "BACKEND_URL", .. }));
        let err = Config::from_lookup(lookup(&[("MEALGATE_HTTP_PORT", "eighty")]), &[]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidNumber { .. }));
        let err = Config::from_lookup(lookup(&[("MEALGATE_SESSION_SOURCE", "ldap")]), &[]).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownSessionSource(_)));
    }

    #[test]
    fn jwt_source_needs_a_secret() {
        let err = Config::from_lookup(lookup(&[("MEALGATE_SESSION_SOURCE", "jwt")]), &[]).unwrap_err();
        assert!(matches!(err, ConfigError::MissingJwtSecret));
        let c = Config::from_lookup(lookup(&[("MEALGATE_SESSION_SOURCE", "JWT"), ("JWT_SECRET", "s3cret")]), &[]).unwrap();
        assert_eq!(c.session_source, SessionSource::Jwt);
        assert!(!format!("{:?}", c).contains("s3cret"));
    }
}
