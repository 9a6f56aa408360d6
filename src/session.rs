//! Cookie-based admin session.
//!
//! The session is nothing more than an `authenticated=true` cookie. With a
//! configured secret the cookie is signed, otherwise any client can set it.

use std::convert::Infallible;

use axum::http::HeaderMap;
use axum::response::{IntoResponseParts, ResponseParts};
use axum_extra::extract::CookieJar;
use axum_extra::extract::cookie::{Cookie, Key, SameSite, SignedCookieJar};

pub const SESSION_COOKIE: &str = "authenticated";
pub const SESSION_MARKER: &str = "true";

#[derive(Clone)]
pub enum SessionMode {
    Plain,
    Signed(Key),
}

#[derive(Clone)]
pub struct SessionGuard {
    mode: SessionMode,
    secure: bool,
    max_age: Option<time::Duration>,
}

/// Set-Cookie headers produced by a sign in or sign out.
pub enum SessionCookies {
    Plain(CookieJar),
    Signed(SignedCookieJar),
}

impl IntoResponseParts for SessionCookies {
    type Error = Infallible;

    fn into_response_parts(self, res: ResponseParts) -> Result<ResponseParts, Self::Error> {
        match self {
            SessionCookies::Plain(jar) => jar.into_response_parts(res),
            SessionCookies::Signed(jar) => jar.into_response_parts(res),
        }
    }
}

impl SessionGuard {
    pub fn new(secret: Option<&str>, secure: bool, timeout_secs: Option<i64>) -> Self {
        let mode = match secret {
            // Secret length (>= 64 bytes) is checked by Config.
            Some(secret) => SessionMode::Signed(Key::from(secret.as_bytes())),
            None => SessionMode::Plain,
        };

        Self {
            mode,
            secure,
            max_age: timeout_secs.map(time::Duration::seconds),
        }
    }

    pub fn is_signed(&self) -> bool {
        matches!(self.mode, SessionMode::Signed(_))
    }

    pub fn is_authenticated(&self, headers: &HeaderMap) -> bool {
        let marker = match &self.mode {
            SessionMode::Plain => CookieJar::from_headers(headers)
                .get(SESSION_COOKIE)
                .map(|c| c.value_trimmed().to_string()),
            SessionMode::Signed(key) => SignedCookieJar::<Key>::from_headers(headers, key.clone())
                .get(SESSION_COOKIE)
                .map(|c| c.value_trimmed().to_string()),
        };

        marker.is_some_and(|v| v == SESSION_MARKER)
    }

    pub fn sign_in(&self) -> SessionCookies {
        let mut cookie = Cookie::build((SESSION_COOKIE, SESSION_MARKER))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(self.secure)
            .build();
        if let Some(max_age) = self.max_age {
            cookie.set_max_age(max_age);
        }

        match &self.mode {
            SessionMode::Plain => SessionCookies::Plain(CookieJar::new().add(cookie)),
            SessionMode::Signed(key) => {
                SessionCookies::Signed(SignedCookieJar::<Key>::new(key.clone()).add(cookie))
            }
        }
    }

    pub fn sign_out(&self) -> SessionCookies {
        let expired = Cookie::build((SESSION_COOKIE, ""))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(self.secure)
            .max_age(time::Duration::ZERO)
            .build();

        match &self.mode {
            SessionMode::Plain => SessionCookies::Plain(CookieJar::new().add(expired)),
            SessionMode::Signed(key) => {
                SessionCookies::Signed(SignedCookieJar::<Key>::new(key.clone()).add(expired))
            }
        }
    }
}
