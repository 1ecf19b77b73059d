//! Session gate for protected routes.
//!
//! A session is a signed cookie holding the Unix time it was issued. It is
//! valid until `ttl` has passed; there is no server-side session table.

use std::time::Duration;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::{
    SignedCookieJar,
    cookie::{Cookie, Key, SameSite},
};
use chrono::{DateTime, Utc};
use imagegate_shared::AppError;
use tracing::debug;

use crate::AppState;

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "imagegate_session";

/// Where unauthenticated requests are sent.
pub const LOGIN_PATH: &str = "/login";

/// Session cookie settings.
#[derive(Clone)]
pub struct SessionSettings {
    /// Cookie signing key.
    pub key: Key,
    /// How long a session lasts after login.
    pub ttl: Duration,
    /// Mark the cookie `Secure` (HTTPS only).
    pub secure_cookie: bool,
}

impl SessionSettings {
    /// Build settings from a secret of at least 64 bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the secret is too short to derive a key.
    pub fn from_secret(
        secret: &[u8],
        ttl: Duration,
        secure_cookie: bool,
    ) -> Result<Self, AppError> {
        let key = Key::try_from(secret)
            .map_err(|e| AppError::Internal(format!("invalid session secret: {e}")))?;
        Ok(Self {
            key,
            ttl,
            secure_cookie,
        })
    }

    /// A fresh session cookie issued at `now`.
    #[must_use]
    pub fn issue(&self, now: DateTime<Utc>) -> Cookie<'static> {
        Cookie::build((SESSION_COOKIE, now.timestamp().to_string()))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(self.secure_cookie)
            .build()
    }

    /// Whether `jar` carries a session that is still valid at `now`.
    #[must_use]
    pub fn is_valid(&self, jar: &SignedCookieJar, now: DateTime<Utc>) -> bool {
        let Some(issued_at) = jar
            .get(SESSION_COOKIE)
            .and_then(|cookie| cookie.value().parse::<i64>().ok())
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
        else {
            return false;
        };

        let age = now.signed_duration_since(issued_at);
        age >= chrono::Duration::zero()
            && age.to_std().is_ok_and(|age| age < self.ttl)
    }
}

impl std::fmt::Debug for SessionSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionSettings")
            .field("key", &"[hidden]")
            .field("ttl", &self.ttl)
            .field("secure_cookie", &self.secure_cookie)
            .finish()
    }
}

/// Lets the request through only with a valid session, otherwise
/// redirects to the login page.
pub async fn require_session(
    State(state): State<AppState>,
    jar: SignedCookieJar,
    request: Request,
    next: Next,
) -> Response {
    if state.session.is_valid(&jar, Utc::now()) {
        return next.run(request).await;
    }

    debug!(path = %request.uri().path(), "No valid session, redirecting to login");
    Redirect::to(LOGIN_PATH).into_response()
}
