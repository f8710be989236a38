use crate::db;
use axum_extra::extract::cookie::Key;
use std::env::VarError;
use std::net::SocketAddr;
use std::num::ParseIntError;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

const VAR_ADDRESS_PORT: &str = "TRICKBIN_ADDRESS_PORT";
const VAR_ADMIN_PASSWORD: &str = "TRICKBIN_ADMIN_PASSWORD";
const VAR_BASE_URL: &str = "TRICKBIN_BASE_URL";
const VAR_DATABASE_PATH: &str = "TRICKBIN_DATABASE_PATH";
const VAR_HTTP_TIMEOUT: &str = "TRICKBIN_HTTP_TIMEOUT";
const VAR_MAX_BODY_SIZE: &str = "TRICKBIN_MAX_BODY_SIZE";
const VAR_SIGNING_KEY: &str = "TRICKBIN_SIGNING_KEY";
const VAR_TITLE: &str = "TRICKBIN_TITLE";

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("failed to parse {VAR_ADDRESS_PORT}, expected `host:port`")]
    AddressPort,
    #[error("failed to parse {VAR_BASE_URL}: {0}")]
    BaseUrl(String),
    #[error("failed to parse {VAR_DATABASE_PATH}, contains non-Unicode data")]
    DatabasePath,
    #[error("failed to parse {VAR_HTTP_TIMEOUT}, expected number of seconds: {0}")]
    HttpTimeout(ParseIntError),
    #[error("failed to parse {VAR_MAX_BODY_SIZE}, expected number of bytes: {0}")]
    MaxBodySize(ParseIntError),
    #[error("failed to generate key from {VAR_SIGNING_KEY}: {0}")]
    SigningKey(String),
}

pub fn title() -> String {
    std::env::var(VAR_TITLE).unwrap_or_else(|_| "trickbin".to_string())
}

pub fn database_method() -> Result<db::Open, Error> {
    match std::env::var(VAR_DATABASE_PATH) {
        Ok(path) => Ok(db::Open::Path(PathBuf::from(path))),
        Err(VarError::NotUnicode(_)) => Err(Error::DatabasePath),
        Err(VarError::NotPresent) => Ok(db::Open::Memory),
    }
}

pub fn signing_key() -> Result<Key, Error> {
    std::env::var(VAR_SIGNING_KEY).map_or_else(
        |_| Ok(Key::generate()),
        |s| Key::try_from(s.as_bytes()).map_err(|err| Error::SigningKey(err.to_string())),
    )
}

pub fn addr() -> Result<SocketAddr, Error> {
    std::env::var(VAR_ADDRESS_PORT)
        .unwrap_or_else(|_| "0.0.0.0:8088".to_string())
        .parse()
        .map_err(|_| Error::AddressPort)
}

pub fn base_url() -> Result<Url, Error> {
    std::env::var(VAR_BASE_URL).map_or_else(
        |_| Url::parse("http://localhost:8088").map_err(|err| Error::BaseUrl(err.to_string())),
        |s| Url::parse(&s).map_err(|err| Error::BaseUrl(err.to_string())),
    )
}

pub fn max_body_size() -> Result<usize, Error> {
    std::env::var(VAR_MAX_BODY_SIZE)
        .map_or_else(|_| Ok(1024 * 1024), |s| s.parse::<usize>())
        .map_err(Error::MaxBodySize)
}

pub fn http_timeout() -> Result<Duration, Error> {
    std::env::var(VAR_HTTP_TIMEOUT)
        .map_or_else(|_| Ok(30), |s| s.parse::<u64>())
        .map(Duration::from_secs)
        .map_err(Error::HttpTimeout)
}

/// Password for the bootstrapped `admin` account, created on startup if no such
/// user exists yet.
pub fn admin_password() -> Option<String> {
    std::env::var(VAR_ADMIN_PASSWORD).ok()
}
