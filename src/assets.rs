use axum::response::{IntoResponse, Response};
use axum_extra::{headers, TypedHeader};
use sha2::{Digest, Sha256};
use std::time::Duration;

/// An asset associated with a MIME type.
#[derive(Clone)]
pub struct Asset {
    /// Route that this will be served under.
    route: String,
    /// MIME type of this asset determined for the `ContentType` response header.
    mime: mime::Mime,
    /// Actual asset content.
    content: Vec<u8>,
}

/// Asset kind.
#[derive(Copy, Clone)]
pub enum Kind {
    Css,
    Js,
}

impl IntoResponse for Asset {
    fn into_response(self) -> Response {
        let content_type_header = headers::ContentType::from(self.mime);

        let headers = (
            TypedHeader(content_type_header),
            TypedHeader(headers::CacheControl::new().with_max_age(Duration::from_secs(3600))),
        );

        (headers, self.content).into_response()
    }
}

impl Asset {
    /// Construct new hashed asset under the given `name`, `kind` and `content`.
    pub fn new_hashed(name: &str, kind: Kind, content: Vec<u8>) -> Self {
        let (mime, ext) = match kind {
            Kind::Css => (mime::TEXT_CSS, "css"),
            Kind::Js => (mime::TEXT_JAVASCRIPT, "js"),
        };

        let route = format!(
            "/{name}.{}.{ext}",
            hex::encode(Sha256::digest(&content))
                .get(0..16)
                .expect("at least 16 characters")
        );

        Self {
            route,
            mime,
            content,
        }
    }

    pub fn route(&self) -> &str {
        &self.route
    }
}
