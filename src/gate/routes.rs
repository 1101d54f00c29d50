/// True if `path` equals `prefix` or continues it with a `/`.
/// `/admin/users` is under `/admin`; `/administrator` is not.
pub fn is_under(path: &str, prefix: &str) -> bool {
    let prefix = prefix.trim_end_matches('/');
    if prefix.is_empty() { return path.starts_with('/'); }
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

/// Drop a single trailing slash (except on `/`) so `/cart/` matches `/cart`.
pub fn normalize_path(path: &str) -> &str {
    if path.len() > 1 { path.strip_suffix('/').unwrap_or(path) } else { path }
}

/// Request paths the gateway refuses to interpret.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    #[error("encoded path separator in {0}")]
    EncodedSeparator(String),
}

fn is_unreserved(b: u8) -> bool { b.is_ascii_alphanumeric() || matches!(b, b'-' | b'.' | b'_' | b'~') }

fn hex_val(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

/// The one path both the gate and the upstreams see.
///
/// Percent-escapes of unreserved characters are decoded (`%2e` is `.`, `%61` is `a`),
/// `\` counts as `/`, empty segments are dropped, and `.`/`..` segments are resolved;
/// `..` never climbs above `/`. Encoded separators (`%2F`, `%5C`) are refused because
/// an upstream may decode them into segments the gate never saw.
pub fn canonical_path(raw: &str) -> Result<String, PathError> {
    let bytes = raw.as_bytes();
    let mut out: Vec<u8> = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        if b == b'%' && i + 2 < bytes.len() {
            if let (Some(h), Some(l)) = (hex_val(bytes[i + 1]), hex_val(bytes[i + 2])) {
                let v = h * 16 + l;
                if v == b'/' || v == b'\\' {
                    return Err(PathError::EncodedSeparator(raw.to_string()));
                }
                if is_unreserved(v) {
                    out.push(v);
                } else {
                    out.extend_from_slice(format!("%{:02X}", v).as_bytes());
                }
                i += 3;
                continue;
            }
        }
        out.push(if b == b'\\' { b'/' } else { b });
        i += 1;
    }
    // Only ASCII was inserted or substituted, so the input's UTF-8 survives.
    let decoded = String::from_utf8_lossy(&out);

    let mut segments: Vec<&str> = Vec::new();
    let mut trailing = false;
    for seg in decoded.split('/') {
        trailing = false;
        match seg {
            "" | "." => trailing = true,
            ".." => {
                segments.pop();
                trailing = true;
            }
            s => segments.push(s),
        }
    }
    let mut out = format!("/{}", segments.join("/"));
    if trailing && !segments.is_empty() {
        out.push('/');
    }
    Ok(out)
}

/// A matcher entry. `/orders/:path*` covers `/orders` and everything below it;
/// a plain path matches only itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathPattern {
    Exact(String),
    Subtree(String),
}

impl PathPattern {
    pub fn parse(pattern: &str) -> PathPattern {
        if let Some((base, _)) = pattern.split_once("/:") {
            return PathPattern::Subtree(normalize_path(base).to_string());
        }
        if let Some(base) = pattern.strip_suffix("/*") {
            return PathPattern::Subtree(normalize_path(base).to_string());
        }
        PathPattern::Exact(normalize_path(pattern).to_string())
    }

    pub fn matches(&self, path: &str) -> bool {
        let path = normalize_path(path);
        match self {
            PathPattern::Exact(p) => path == p,
            PathPattern::Subtree(p) => is_under(path, p),
        }
    }
}

/// Which audience a path belongs to. Exactly one class applies to any path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RouteClass {
    /// Outside the gate: bypassed API traffic and unmatched pages.
    Public,
    /// Gated, and not under the admin or provider area.
    CustomerDefault,
    ProviderOnly,
    AdminOnly,
}

/// Declarative gate configuration: what is gated, what is bypassed, where to send people.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteTable {
    pub matched: Vec<PathPattern>,
    pub bypass_prefix: String,
    pub admin_prefix: String,
    pub provider_prefix: String,
    pub login_path: String,
    pub admin_home: String,
    pub provider_home: String,
    pub customer_home: String,
}

pub const DEFAULT_MATCHED: &[&str] = &[
    "/dashboard/:path*",
    "/cart",
    "/checkout",
    "/orders/:path*",
    "/profile",
    "/provider/:path*",
    "/admin/:path*",
];

impl Default for RouteTable {
    fn default() -> Self {
        Self {
            matched: DEFAULT_MATCHED.iter().map(|p| PathPattern::parse(p)).collect(),
            bypass_prefix: "/api".into(),
            admin_prefix: "/admin".into(),
            provider_prefix: "/provider".into(),
            login_path: "/login".into(),
            admin_home: "/admin".into(),
            provider_home: "/provider/dashboard".into(),
            customer_home: "/dashboard".into(),
        }
    }
}

impl RouteTable {
    pub fn is_bypassed(&self, path: &str) -> bool { is_under(path, &self.bypass_prefix) }

    pub fn is_matched(&self, path: &str) -> bool { self.matched.iter().any(|p| p.matches(path)) }

    pub fn classify(&self, path: &str) -> RouteClass {
        let path = normalize_path(path);
        if self.is_bypassed(path) || !self.is_matched(path) {
            return RouteClass::Public;
        }
        if is_under(path, &self.admin_prefix) {
            RouteClass::AdminOnly
        } else if is_under(path, &self.provider_prefix) {
            RouteClass::ProviderOnly
        } else {
            RouteClass::CustomerDefault
        }
    }
}
