use crate::auth::{self, Action};
use crate::handlers::extract::Session;
use crate::handlers::html::comments::{next_page, rows, CommentRow};
use crate::handlers::html::{format_created, make_error, ErrorResponse};
use crate::slug::Slug;
use crate::{embed, Database, Page};
use askama::Template;
use axum::extract::{Path, State};

/// A resolved video with its delete affordance.
pub struct VideoRow {
    pub id: i64,
    pub markup: String,
    pub can_delete: bool,
}

/// Trick detail page with pictures, videos and the first comment page.
#[derive(Template)]
#[template(path = "trick.html")]
pub struct Detail {
    page: Page,
    slug: String,
    name: String,
    description: String,
    author: String,
    created: String,
    cover: Option<String>,
    pictures: Vec<String>,
    videos: Vec<VideoRow>,
    can_delete: bool,
    logged_in: bool,
    total: u32,
    comments: Vec<CommentRow>,
    next_page: Option<u32>,
}

pub async fn get(
    Path(slug): Path<String>,
    State(db): State<Database>,
    State(page): State<Page>,
    session: Option<Session>,
) -> Result<Detail, ErrorResponse> {
    async {
        let slug: Slug = slug.parse()?;
        let trick = db.get_trick(slug.to_string()).await?;
        let principal = session.as_ref().map(|session| &session.0);

        let pictures = db.pictures(trick.id).await?;

        // unrecognized embed strings are skipped entirely
        let can_delete_video = auth::can_moderate(principal, &trick.author, Action::DeleteVideo);
        let videos = db
            .videos(trick.id)
            .await?
            .into_iter()
            .filter_map(|video| {
                embed::resolve(&video.embed).map(|embed| VideoRow {
                    id: video.id,
                    markup: embed.to_iframe(),
                    can_delete: can_delete_video,
                })
            })
            .collect();

        let comment_page = db.comments(trick.id, 1).await?;

        Ok(Detail {
            page: page.clone(),
            slug: trick.slug,
            name: trick.name,
            description: trick.description,
            created: format_created(trick.created)?,
            cover: trick.cover,
            pictures,
            videos,
            can_delete: auth::can_moderate(principal, &trick.author, Action::DeleteTrick),
            logged_in: principal.is_some(),
            total: comment_page.total,
            comments: rows(&comment_page, principal)?,
            next_page: next_page(1, comment_page.total),
            author: trick.author,
        })
    }
    .await
    .map_err(|err| make_error(err, page))
}

#[cfg(test)]
mod tests {
    use crate::test_helpers::Client;
    use reqwest::StatusCode;

    #[tokio::test]
    async fn unknown_trick() -> Result<(), Box<dyn std::error::Error>> {
        let client = Client::new().await;

        let res = client.get("/tricks/no-such-trick").send().await?;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);

        let res = client.get("/tricks/Not-A-Slug").send().await?;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);

        Ok(())
    }

    #[tokio::test]
    async fn detail_embeds_recognized_videos() -> Result<(), Box<dyn std::error::Error>> {
        let client = Client::new().await;
        client.login("alice").await?;
        client
            .create_trick(
                "Backside 360",
                &[
                    "https://youtu.be/abc123",
                    "https://dai.ly/x7tlz3",
                    "https://example.com/not-a-video",
                ],
            )
            .await?;

        let content = client.get("/tricks/backside-360").send().await?.text().await?;
        assert!(content.contains("https://www.youtube.com/embed/abc123?rel=0"));
        assert!(content.contains("https://www.dailymotion.com/embed/x7tlz3"));
        assert!(!content.contains("example.com"));

        Ok(())
    }

    #[tokio::test]
    async fn delete_links_require_ownership() -> Result<(), Box<dyn std::error::Error>> {
        let client = Client::new().await;
        client.login("alice").await?;
        client.create_trick("Backside 360", &[]).await?;

        let content = client.get("/tricks/backside-360").send().await?.text().await?;
        assert!(content.contains("/tricks/backside-360/delete"));

        client.logout().await?;
        client.login("bob").await?;

        let content = client.get("/tricks/backside-360").send().await?.text().await?;
        assert!(!content.contains("/tricks/backside-360/delete\""));

        Ok(())
    }
}
