mod assets;
mod auth;
mod crypto;
mod db;
mod embed;
mod env;
mod errors;
mod handlers;
mod page;
mod slug;
#[cfg(test)]
mod test_helpers;

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{DefaultBodyLimit, FromRef, Request, State};
use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum::middleware::{from_fn, from_fn_with_state, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, Router};
use axum_extra::extract::cookie::Key;
use http::header::{
    CONTENT_SECURITY_POLICY, REFERRER_POLICY, SERVER, X_CONTENT_TYPE_OPTIONS, X_FRAME_OPTIONS,
};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::compression::CompressionLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::assets::Asset;
use crate::db::Database;
use crate::handlers::{delete, html};

/// Reference counted [`page::Page`] wrapper.
pub(crate) type Page = Arc<page::Page>;

#[derive(Clone)]
pub(crate) struct AppState {
    db: Database,
    key: Key,
    page: Page,
}

impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.key.clone()
    }
}

impl FromRef<AppState> for Database {
    fn from_ref(state: &AppState) -> Self {
        state.db.clone()
    }
}

impl FromRef<AppState> for Page {
    fn from_ref(state: &AppState) -> Self {
        state.page.clone()
    }
}

async fn style_css(State(page): State<Page>) -> Asset {
    page.assets.style.clone()
}

async fn trick_js(State(page): State<Page>) -> Asset {
    page.assets.trick_js.clone()
}

async fn security_headers_layer(req: Request, next: Next) -> impl IntoResponse {
    const SECURITY_HEADERS: [(HeaderName, HeaderValue); 5] = [
        (SERVER, HeaderValue::from_static(env!("CARGO_PKG_NAME"))),
        (
            CONTENT_SECURITY_POLICY,
            // frame-src must admit the two supported video platforms
            HeaderValue::from_static(
                "default-src 'none'; script-src 'self'; img-src * data: ; style-src 'self' ; frame-src https://www.youtube.com https://www.dailymotion.com ; object-src 'none' ; base-uri 'none' ; frame-ancestors 'none' ; form-action 'self' ;",
            ),
        ),
        (REFERRER_POLICY, HeaderValue::from_static("same-origin")),
        (X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff")),
        (X_FRAME_OPTIONS, HeaderValue::from_static("SAMEORIGIN")),
    ];

    (SECURITY_HEADERS, next.run(req).await)
}

async fn handle_service_errors(State(page): State<Page>, req: Request, next: Next) -> Response {
    let response = next.run(req).await;

    match response.status() {
        StatusCode::PAYLOAD_TOO_LARGE => (
            StatusCode::PAYLOAD_TOO_LARGE,
            html::Error {
                page,
                description: String::from("payload exceeded limit"),
            },
        )
            .into_response(),
        StatusCode::UNSUPPORTED_MEDIA_TYPE => (
            StatusCode::UNSUPPORTED_MEDIA_TYPE,
            html::Error {
                page,
                description: String::from("unsupported media type"),
            },
        )
            .into_response(),
        _ => response,
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received signal, exiting ...");
}

fn make_app(state: AppState, timeout: Duration, max_body_size: usize) -> Router {
    let style_route = state.page.assets.style.route().to_string();
    let trick_js_route = state.page.assets.trick_js.route().to_string();

    Router::new()
        .route(&style_route, get(style_css))
        .route(&trick_js_route, get(trick_js))
        .route("/", get(html::index::get))
        .route("/login", get(html::login::get).post(html::login::post))
        .route("/logout", get(html::login::logout))
        .route(
            "/tricks/new",
            get(html::edit::get_new).post(html::edit::post_new),
        )
        .route("/tricks/:slug", get(html::trick::get))
        .route(
            "/tricks/:slug/edit",
            get(html::edit::get_edit).post(html::edit::post_edit),
        )
        .route(
            "/tricks/:slug/comments",
            get(html::comments::get).post(html::comments::post),
        )
        .route("/tricks/:slug/delete", get(delete::trick))
        .route("/tricks/:slug/delete-comment/:id", get(delete::comment))
        .route("/tricks/:slug/delete-video/:id", get(delete::video))
        .route("/users/:name/delete", get(delete::user))
        .layer(
            ServiceBuilder::new()
                .layer(DefaultBodyLimit::max(max_body_size))
                .layer(CompressionLayer::new())
                .layer(TraceLayer::new_for_http())
                .layer(TimeoutLayer::new(timeout))
                .layer(from_fn_with_state(state.clone(), handle_service_errors))
                .layer(from_fn(security_headers_layer)),
        )
        .with_state(state)
}

pub(crate) async fn serve(
    listener: TcpListener,
    state: AppState,
    timeout: Duration,
    max_body_size: usize,
) -> Result<(), std::io::Error> {
    let app = make_app(state, timeout, max_body_size);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn start() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let method = env::database_method()?;
    let key = env::signing_key()?;
    let addr = env::addr()?;
    let max_body_size = env::max_body_size()?;
    let base_url = env::base_url()?;
    let timeout = env::http_timeout()?;
    let title = env::title();

    let db = Database::new(method)?;

    if let Some(password) = env::admin_password() {
        match db.get_user("admin".to_string()).await {
            Ok(_) => {}
            Err(errors::Error::NotFound) => {
                let hash = crypto::hash(password).await?;
                db.insert_user("admin".to_string(), hash, true).await?;
                tracing::info!("created admin account");
            }
            Err(err) => return Err(err.into()),
        }
    }

    tracing::debug!("restricting maximum body size to {max_body_size} bytes");
    tracing::debug!("enforcing a http timeout of {timeout:#?}");

    let page = Arc::new(page::Page::new(title, base_url));
    let state = AppState { db, key, page };

    let listener = TcpListener::bind(addr).await?;
    tracing::info!("listening on {addr}");

    serve(listener, state, timeout, max_body_size).await?;

    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    match start().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err}");
            ExitCode::FAILURE
        }
    }
}
