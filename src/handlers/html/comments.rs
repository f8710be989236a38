use crate::auth::{self, Action, Principal};
use crate::db::{CommentPage, COMMENTS_PER_PAGE};
use crate::errors::Error;
use crate::handlers::extract::Session;
use crate::handlers::html::{format_created, make_error, ErrorResponse};
use crate::slug::Slug;
use crate::{Database, Page};
use askama::Template;
use axum::extract::{Form, Path, Query, State};
use axum::response::Redirect;
use serde::Deserialize;

/// A reply rendered below its parent comment.
pub struct ReplyRow {
    pub id: i64,
    pub author: String,
    pub text: String,
    pub created: String,
    pub can_delete: bool,
}

/// A top-level comment with its replies, ready for rendering.
pub struct CommentRow {
    pub id: i64,
    pub author: String,
    pub text: String,
    pub created: String,
    pub can_delete: bool,
    pub replies: Vec<ReplyRow>,
}

/// Comment list fragment, also included by the trick detail page.
#[derive(Template)]
#[template(path = "comments.html")]
pub struct CommentList {
    pub slug: String,
    pub comments: Vec<CommentRow>,
    pub next_page: Option<u32>,
    pub logged_in: bool,
}

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    page: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct CommentForm {
    text: String,
    parent: Option<String>,
}

/// Turn one database page of comments into view rows with per-row delete
/// affordances for `principal`.
pub fn rows(
    comment_page: &CommentPage,
    principal: Option<&Principal>,
) -> Result<Vec<CommentRow>, Error> {
    comment_page
        .threads
        .iter()
        .map(|thread| {
            let replies = thread
                .replies
                .iter()
                .map(|reply| {
                    Ok(ReplyRow {
                        id: reply.id,
                        author: reply.author.clone(),
                        text: reply.text.clone(),
                        created: format_created(reply.created)?,
                        can_delete: auth::can_moderate(
                            principal,
                            &reply.author,
                            Action::DeleteComment,
                        ),
                    })
                })
                .collect::<Result<Vec<_>, Error>>()?;

            let comment = &thread.comment;

            Ok(CommentRow {
                id: comment.id,
                author: comment.author.clone(),
                text: comment.text.clone(),
                created: format_created(comment.created)?,
                can_delete: auth::can_moderate(principal, &comment.author, Action::DeleteComment),
                replies,
            })
        })
        .collect()
}

/// Page number of the page after `page`, if any comments remain.
pub fn next_page(page: u32, total: u32) -> Option<u32> {
    (u64::from(page) * u64::from(COMMENTS_PER_PAGE) < u64::from(total)).then(|| page + 1)
}

/// GET handler for a single page of comments, used by the load-more link.
pub async fn get(
    Path(slug): Path<String>,
    Query(query): Query<PageQuery>,
    State(db): State<Database>,
    State(page): State<Page>,
    session: Option<Session>,
) -> Result<CommentList, ErrorResponse> {
    async {
        let slug: Slug = slug.parse()?;
        let trick = db.get_trick(slug.to_string()).await?;

        let number = query.page.unwrap_or(1).max(1);
        let comment_page = db.comments(trick.id, number).await?;
        let principal = session.as_ref().map(|session| &session.0);

        Ok(CommentList {
            slug: slug.to_string(),
            comments: rows(&comment_page, principal)?,
            next_page: next_page(number, comment_page.total),
            logged_in: principal.is_some(),
        })
    }
    .await
    .map_err(|err| make_error(err, page))
}

/// POST handler adding a comment or a reply. Anonymous callers are redirected
/// to the login page by the [`Session`] extractor.
pub async fn post(
    Path(slug): Path<String>,
    State(db): State<Database>,
    State(page): State<Page>,
    session: Session,
    Form(form): Form<CommentForm>,
) -> Result<Redirect, ErrorResponse> {
    async {
        let slug: Slug = slug.parse()?;
        let trick = db.get_trick(slug.to_string()).await?;

        let text = form.text.trim();

        if !text.is_empty() {
            let parent = form
                .parent
                .as_deref()
                .filter(|id| !id.is_empty())
                .map(|id| id.parse().map_err(|_| Error::IllegalCharacters))
                .transpose()?;

            db.insert_comment(trick.id, parent, session.0.username, text.to_string())
                .await?;
        }

        Ok(Redirect::to(&format!("/tricks/{slug}")))
    }
    .await
    .map_err(|err| make_error(err, page))
}

#[cfg(test)]
mod tests {
    use crate::test_helpers::Client;
    use reqwest::StatusCode;

    #[tokio::test]
    async fn comment_and_load_more() -> Result<(), Box<dyn std::error::Error>> {
        let client = Client::new().await;
        client.login("alice").await?;
        client.create_trick("Backside 360", &[]).await?;

        for n in 0..5 {
            let res = client
                .post("/tricks/backside-360/comments")
                .form(&[("text", format!("comment {n}"))])
                .send()
                .await?;
            assert_eq!(res.status(), StatusCode::SEE_OTHER);
        }

        let content = client.get("/tricks/backside-360").send().await?.text().await?;
        assert!(content.contains("comment 4"));
        assert!(content.contains("comment 1"));
        assert!(!content.contains("comment 0"));
        assert!(content.contains("/tricks/backside-360/comments?page=2"));

        let content = client
            .get("/tricks/backside-360/comments?page=2")
            .send()
            .await?
            .text()
            .await?;
        assert!(content.contains("comment 0"));
        assert!(!content.contains("comment 1"));
        assert!(!content.contains("Load more"));

        Ok(())
    }

    #[tokio::test]
    async fn anonymous_comment_redirects_to_login() -> Result<(), Box<dyn std::error::Error>> {
        let client = Client::new().await;
        client.login("alice").await?;
        client.create_trick("Backside 360", &[]).await?;
        client.logout().await?;

        let res = client
            .post("/tricks/backside-360/comments")
            .form(&[("text", "drive-by")])
            .send()
            .await?;
        assert_eq!(res.status(), StatusCode::SEE_OTHER);
        assert_eq!(res.headers().get("location").unwrap(), "/login");

        Ok(())
    }

    #[tokio::test]
    async fn malformed_reply_target_is_rejected() -> Result<(), Box<dyn std::error::Error>> {
        let client = Client::new().await;
        client.login("alice").await?;
        client.create_trick("Backside 360", &[]).await?;

        let res = client
            .post("/tricks/backside-360/comments")
            .form(&[("text", "orphan"), ("parent", "not-a-number")])
            .send()
            .await?;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);

        // nothing was stored, not even as a top-level comment
        let content = client.get("/tricks/backside-360").send().await?.text().await?;
        assert!(!content.contains("orphan"));

        Ok(())
    }

    #[tokio::test]
    async fn replies_are_nested() -> Result<(), Box<dyn std::error::Error>> {
        let client = Client::new().await;
        client.login("alice").await?;
        client.create_trick("Backside 360", &[]).await?;

        client
            .post("/tricks/backside-360/comments")
            .form(&[("text", "parent comment")])
            .send()
            .await?;

        let content = client.get("/tricks/backside-360").send().await?.text().await?;
        let id = content
            .split("comment-")
            .nth(1)
            .and_then(|rest| rest.split('"').next())
            .unwrap()
            .to_string();

        client
            .post("/tricks/backside-360/comments")
            .form(&[("text", "the reply"), ("parent", &id)])
            .send()
            .await?;

        let content = client.get("/tricks/backside-360").send().await?.text().await?;
        assert!(content.contains("the reply"));
        // one top-level comment, so no pagination link
        assert!(!content.contains("page=2"));

        Ok(())
    }
}
