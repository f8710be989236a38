use crate::auth::{Principal, Role};
use crate::errors::Error;
use axum::extract::{FromRef, FromRequestParts};
use axum::http::request::Parts;
use axum::response::Redirect;
use axum_extra::extract::cookie::{Cookie, Key, SameSite};
use axum_extra::extract::SignedCookieJar;
use std::fmt;
use std::str::FromStr;

pub const SESSION_COOKIE: &str = "session";

/// Authenticated session read from the signed session cookie.
///
/// Handlers taking `Session` directly redirect anonymous callers to the login
/// page; handlers taking `Option<Session>` accept anonymous callers.
pub struct Session(pub Principal);

impl Session {
    /// Build the signed session cookie for this session.
    pub fn cookie(&self) -> Cookie<'static> {
        Cookie::build((SESSION_COOKIE, self.to_string()))
            .http_only(true)
            .same_site(SameSite::Strict)
            .path("/")
            .build()
    }
}

impl fmt::Display for Session {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let role = match self.0.role {
            Role::Admin => "admin",
            Role::User => "user",
        };

        write!(f, "{role}:{}", self.0.username)
    }
}

impl FromStr for Session {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let (role, username) = value
            .split_once(':')
            .ok_or_else(|| Error::CookieParsing("missing role separator".to_string()))?;

        let role = match role {
            "admin" => Role::Admin,
            "user" => Role::User,
            other => return Err(Error::CookieParsing(format!("unknown role {other}"))),
        };

        if username.is_empty() {
            return Err(Error::CookieParsing("empty username".to_string()));
        }

        Ok(Self(Principal {
            username: username.to_string(),
            role,
        }))
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for Session
where
    S: Send + Sync,
    Key: FromRef<S>,
{
    type Rejection = Redirect;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let jar = match SignedCookieJar::<Key>::from_request_parts(parts, state).await {
            Ok(jar) => jar,
            Err(err) => match err {},
        };

        jar.get(SESSION_COOKIE)
            .and_then(|cookie| cookie.value().parse().ok())
            .ok_or_else(|| Redirect::to("/login"))
    }
}
