use crate::auth::{Principal, Role};
use crate::errors::Error;
use crate::handlers::extract::{Session, SESSION_COOKIE};
use crate::handlers::html::{make_error, ErrorResponse};
use crate::{crypto, Database, Page};
use askama::Template;
use axum::extract::{Form, State};
use axum::response::Redirect;
use axum_extra::extract::cookie::Cookie;
use axum_extra::extract::SignedCookieJar;
use serde::Deserialize;

/// Login page with the credentials form.
#[derive(Template)]
#[template(path = "login.html")]
pub struct Login {
    page: Page,
}

#[derive(Debug, Deserialize)]
pub struct Credentials {
    username: String,
    password: String,
}

pub async fn get(State(page): State<Page>) -> Login {
    Login { page }
}

pub async fn post(
    State(db): State<Database>,
    State(page): State<Page>,
    jar: SignedCookieJar,
    Form(credentials): Form<Credentials>,
) -> Result<(SignedCookieJar, Redirect), ErrorResponse> {
    async {
        let user = db
            .get_user(credentials.username)
            .await
            .map_err(|err| match err {
                Error::NotFound => Error::Credentials,
                err => err,
            })?;

        if !crypto::verify(user.password, credentials.password).await? {
            return Err(Error::Credentials);
        }

        let role = if user.admin { Role::Admin } else { Role::User };

        let session = Session(Principal {
            username: user.name,
            role,
        });

        tracing::debug!(user = %session.0.username, "logged in");

        Ok((jar.add(session.cookie()), Redirect::to("/")))
    }
    .await
    .map_err(|err| make_error(err, page))
}

pub async fn logout(jar: SignedCookieJar) -> (SignedCookieJar, Redirect) {
    (
        jar.remove(Cookie::build(SESSION_COOKIE).path("/")),
        Redirect::to("/"),
    )
}
