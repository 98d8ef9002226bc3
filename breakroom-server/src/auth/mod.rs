//! Session authentication
//!
//! Tokens are HS256 JWTs carrying the user's handle. They arrive as a
//! bearer header (mobile) or the `jwtToken` cookie (web), and every request
//! with a valid token gets a fresh one back.

pub mod extract;
pub mod session;
pub mod token;

pub use extract::{session_token, AuthUser, ReporterKey, API_KEY_HEADER, SESSION_COOKIE};
pub use session::{refresh_session, session_cookie, NEW_TOKEN_HEADER};
pub use token::{Claims, TokenError, TokenService, SESSION_TTL_SECS};
