use crate::assets::{Asset, Kind};
use crate::env;
use url::Url;

/// Static page metadata shared by all templates.
pub struct Page {
    pub version: &'static str,
    pub title: String,
    pub base_url: Url,
    pub assets: Assets,
}

/// Static assets served by the application.
pub struct Assets {
    pub style: Asset,
    pub trick_js: Asset,
}

impl Page {
    /// Create new page metadata from `title` and `base_url`.
    #[must_use]
    pub fn new(title: String, base_url: Url) -> Self {
        let assets = Assets {
            style: Asset::new_hashed(
                "style",
                Kind::Css,
                include_str!("assets/style.css").as_bytes().to_vec(),
            ),
            trick_js: Asset::new_hashed(
                "trick",
                Kind::Js,
                include_str!("assets/trick.js").as_bytes().to_vec(),
            ),
        };

        Self {
            version: env::VERSION,
            title,
            base_url,
            assets,
        }
    }
}
