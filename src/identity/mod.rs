//! Identity for gated requests: roles, the session user, and the resolvers that look them up.
//! The gate only reads identity; issuing and revoking sessions belongs to the auth backend.

mod role;
mod user;
mod session;
mod provider;
mod request_context;

pub use role::Role;
pub use user::{SessionEnvelope, SessionUser};
pub use session::{parse_cookie, cookie_header, SessionResolver, SharedResolver, StaticSessionResolver};
pub use provider::{JwtSessionResolver, RemoteSessionResolver, SessionClaims, TOKEN_COOKIE};
pub use request_context::RequestContext;
