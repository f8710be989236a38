pub mod comments;
pub mod edit;
pub mod index;
pub mod login;
pub mod trick;

use crate::{errors, Page};
use askama::Template;
use axum::http::StatusCode;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::OffsetDateTime;

const CREATED_FORMAT: &[BorrowedFormatItem<'_>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]");

/// Error page showing a message.
#[derive(Template)]
#[template(path = "error.html")]
pub struct Error {
    pub page: Page,
    pub description: String,
}

/// Error response carrying a status code and the page itself.
pub type ErrorResponse = (StatusCode, Error);

/// Create an error response from `error` consisting of [`StatusCode`] derived
/// from `error` as well as a rendered page with a description.
pub fn make_error(error: errors::Error, page: Page) -> ErrorResponse {
    let description = error.to_string();
    (error.into(), Error { page, description })
}

/// Format a database unix timestamp for display.
pub fn format_created(timestamp: i64) -> Result<String, errors::Error> {
    Ok(OffsetDateTime::from_unix_timestamp(timestamp)?.format(CREATED_FORMAT)?)
}
