use axum::http::StatusCode;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("not allowed to delete")]
    Delete,
    #[error("not found")]
    NotFound,
    #[error("wrong username or password")]
    Credentials,
    #[error("a trick with this name already exists")]
    Duplicate,
    #[error("referenced data no longer exists")]
    Constraint,
    #[error("trick name must contain at least one letter or digit")]
    EmptyName,
    #[error("illegal characters")]
    IllegalCharacters,
    #[error("could not parse cookie: {0}")]
    CookieParsing(String),
    #[error("sqlite error: {0}")]
    Sqlite(rusqlite::Error),
    #[error("migrations error: {0}")]
    Migration(#[from] rusqlite_migration::Error),
    #[error("password hashing error: {0}")]
    Argon2(#[from] argon2::Error),
    #[error("join error: {0}")]
    Join(#[from] tokio::task::JoinError),
    #[error("timestamp out of range: {0}")]
    TimeRange(#[from] time::error::ComponentRange),
    #[error("time formatting error: {0}")]
    TimeFormatting(#[from] time::error::Format),
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::SqliteFailure(failure, _)
                if failure.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                // only uniqueness conflicts are duplicates; a failed foreign
                // key means the referenced row is gone
                match failure.extended_code {
                    rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                    | rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY => Error::Duplicate,
                    _ => Error::Constraint,
                }
            }
            err => Error::Sqlite(err),
        }
    }
}

impl From<Error> for StatusCode {
    fn from(err: Error) -> Self {
        match err {
            Error::Sqlite(err) => match err {
                rusqlite::Error::QueryReturnedNoRows => StatusCode::NOT_FOUND,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Error::NotFound => StatusCode::NOT_FOUND,
            Error::Delete => StatusCode::FORBIDDEN,
            Error::Credentials => StatusCode::UNAUTHORIZED,
            Error::Duplicate => StatusCode::CONFLICT,
            Error::EmptyName
            | Error::IllegalCharacters
            | Error::CookieParsing(_)
            | Error::Constraint => StatusCode::BAD_REQUEST,
            Error::Join(_)
            | Error::Migration(_)
            | Error::Argon2(_)
            | Error::TimeRange(_)
            | Error::TimeFormatting(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
