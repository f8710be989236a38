use url::Url;

/// Embed references longer than this are rejected outright. Keeps pathological
/// form input away from the matcher and the markup below.
const MAX_EMBED_LEN: usize = 2048;

/// Characters that terminate a video id.
const TERMINATORS: [char; 5] = ['?', '&', '"', '\'', '>'];

/// Video platform recognized from a raw embed reference.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Platform {
    YouTube,
    Dailymotion,
}

/// A recognized video reference. The id is never empty.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Embed {
    pub platform: Platform,
    pub video_id: String,
}

/// Resolve a raw user-entered embed reference into an [`Embed`], or `None` if
/// no known platform pattern matches.
///
/// Matching is anchored at the start of the input and case-sensitive. YouTube
/// is tried first, then Dailymotion. An accepted reference carries an optional
/// `http://`/`https://` scheme and an optional `www.` and/or `m.` subdomain
/// before the platform host.
pub fn resolve(raw: &str) -> Option<Embed> {
    if raw.is_empty() || raw.len() > MAX_EMBED_LEN {
        return None;
    }

    let rest = raw
        .strip_prefix("https://")
        .or_else(|| raw.strip_prefix("http://"))
        .unwrap_or(raw);
    let rest = rest.strip_prefix("www.").unwrap_or(rest);
    let rest = rest.strip_prefix("m.").unwrap_or(rest);

    youtube(rest).or_else(|| dailymotion(rest))
}

/// Extract a non-empty id from the start of `input`, ending at the first
/// terminator character.
fn video_id(input: &str) -> Option<&str> {
    let end = input.find(TERMINATORS).unwrap_or(input.len());
    (end > 0).then(|| &input[..end])
}

fn embed(platform: Platform, id: &str) -> Option<Embed> {
    Some(Embed {
        platform,
        video_id: id.to_string(),
    })
}

fn youtube(input: &str) -> Option<Embed> {
    if let Some(tail) = input.strip_prefix("youtu.be/") {
        return embed(Platform::YouTube, video_id(tail)?);
    }

    let tail = input.strip_prefix("youtube.com/")?;

    for prefix in ["embed/", "v/", "vi/", "user/"] {
        if let Some(tail) = tail.strip_prefix(prefix) {
            return embed(Platform::YouTube, video_id(tail)?);
        }
    }

    // `watch?v=<id>` or the host-only `?v=<id>` form. Any other parameters may
    // precede the `v`/`vi` key; the last occurrence wins.
    let query = tail
        .strip_prefix("watch?")
        .or_else(|| tail.strip_prefix("?"))?;

    let mut id = None;

    for pair in query.split('&') {
        if let Some((key, value)) = pair.split_once('=') {
            if key == "v" || key == "vi" {
                if let Some(value) = video_id(value) {
                    id = Some(value);
                }
            }
        }
    }

    embed(Platform::YouTube, id?)
}

fn dailymotion(input: &str) -> Option<Embed> {
    if let Some(tail) = input.strip_prefix("dai.ly/") {
        return embed(Platform::Dailymotion, video_id(tail)?);
    }

    let tail = input.strip_prefix("dailymotion.com/embed/")?;
    embed(Platform::Dailymotion, video_id(tail)?)
}

impl Embed {
    /// Render the iframe markup fragment for this embed. The id is passed
    /// through [`Url`] path-segment building and thereby percent-encoded.
    pub fn to_iframe(&self) -> String {
        let base = match self.platform {
            Platform::YouTube => "https://www.youtube.com/embed/",
            Platform::Dailymotion => "https://www.dailymotion.com/embed/",
        };

        let mut url = Url::parse(base).expect("valid base url");
        url.path_segments_mut()
            .expect("base url with path segments")
            .pop_if_empty()
            .push(&self.video_id);

        match self.platform {
            Platform::YouTube => {
                url.set_query(Some("rel=0"));

                format!(
                    r#"<iframe title="video figure" class="embed-responsive-item" src="{url}" allow="accelerometer; autoplay; encrypted-media; gyroscope; picture-in-picture" allowfullscreen></iframe>"#
                )
            }
            Platform::Dailymotion => {
                format!(
                    r#"<iframe title="video figure" class="embed-responsive-item" src="{url}" allowfullscreen></iframe>"#
                )
            }
        }
    }
}
