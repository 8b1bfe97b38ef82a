//! Session middleware for HTTP handler tests.

use actix_session::{SessionMiddleware, config::CookieContentSecurity, storage::CookieSessionStore};
use actix_web::cookie::Key;

use super::session::SESSION_COOKIE;

/// Encrypted cookie session like the server's, minus the `Secure` flag so
/// plain-HTTP test requests carry the access token back.
pub fn test_session_middleware() -> SessionMiddleware<CookieSessionStore> {
    SessionMiddleware::builder(CookieSessionStore::default(), Key::generate())
        .cookie_name(SESSION_COOKIE.to_owned())
        .cookie_content_security(CookieContentSecurity::Private)
        .cookie_secure(false)
        .build()
}
