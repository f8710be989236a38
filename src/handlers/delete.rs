//! Delete handlers for tricks, comments, videos and accounts. Every handler
//! resolves the resource first (missing resources are 404) and then asks
//! [`auth::can_moderate`] before touching the database.

use crate::auth::{self, Action};
use crate::errors::Error;
use crate::handlers::extract::Session;
use crate::handlers::html::{make_error, ErrorResponse};
use crate::slug::Slug;
use crate::{Database, Page};
use axum::extract::{Path, State};
use axum::response::Redirect;

pub async fn trick(
    Path(slug): Path<String>,
    State(db): State<Database>,
    State(page): State<Page>,
    session: Option<Session>,
) -> Result<Redirect, ErrorResponse> {
    async {
        let slug: Slug = slug.parse()?;
        let trick = db.get_trick(slug.to_string()).await?;
        let principal = session.as_ref().map(|session| &session.0);

        if !auth::can_moderate(principal, &trick.author, Action::DeleteTrick) {
            return Err(Error::Delete);
        }

        db.delete_trick(slug.to_string()).await?;
        tracing::info!(%slug, "deleted trick");

        Ok(Redirect::to(&format!("/?deleted={slug}")))
    }
    .await
    .map_err(|err| make_error(err, page))
}

pub async fn comment(
    Path((slug, id)): Path<(String, i64)>,
    State(db): State<Database>,
    State(page): State<Page>,
    session: Option<Session>,
) -> Result<Redirect, ErrorResponse> {
    async {
        let slug: Slug = slug.parse()?;
        let trick = db.get_trick(slug.to_string()).await?;
        let comment = db.get_comment(id).await?;

        if comment.trick_id != trick.id {
            return Err(Error::NotFound);
        }

        let principal = session.as_ref().map(|session| &session.0);

        if !auth::can_moderate(principal, &comment.author, Action::DeleteComment) {
            return Err(Error::Delete);
        }

        db.delete_comment(id).await?;
        tracing::info!(%slug, id, "deleted comment");

        Ok(Redirect::to(&format!("/tricks/{slug}")))
    }
    .await
    .map_err(|err| make_error(err, page))
}

pub async fn video(
    Path((slug, id)): Path<(String, i64)>,
    State(db): State<Database>,
    State(page): State<Page>,
    session: Option<Session>,
) -> Result<Redirect, ErrorResponse> {
    async {
        let slug: Slug = slug.parse()?;
        let video = db.get_video(id).await?;

        if video.trick_slug != slug.as_str() {
            return Err(Error::NotFound);
        }

        let principal = session.as_ref().map(|session| &session.0);

        // videos belong to their trick's author
        if !auth::can_moderate(principal, &video.trick_author, Action::DeleteVideo) {
            return Err(Error::Delete);
        }

        db.delete_video(video.id).await?;
        tracing::info!(%slug, id, "deleted video");

        Ok(Redirect::to(&format!("/tricks/{slug}")))
    }
    .await
    .map_err(|err| make_error(err, page))
}

pub async fn user(
    Path(name): Path<String>,
    State(db): State<Database>,
    State(page): State<Page>,
    session: Option<Session>,
) -> Result<Redirect, ErrorResponse> {
    async {
        let user = db.get_user(name).await?;
        let principal = session.as_ref().map(|session| &session.0);

        if !auth::can_moderate(principal, &user.name, Action::DeleteUser) {
            return Err(Error::Delete);
        }

        db.delete_user(user.name.clone()).await?;
        tracing::info!(user = %user.name, "deleted account");

        Ok(Redirect::to("/"))
    }
    .await
    .map_err(|err| make_error(err, page))
}

#[cfg(test)]
mod tests {
    use crate::test_helpers::Client;
    use reqwest::StatusCode;

    #[tokio::test]
    async fn owner_deletes_own_trick() -> Result<(), Box<dyn std::error::Error>> {
        let client = Client::new().await;
        client.login("alice").await?;
        client.create_trick("Backside 360", &[]).await?;

        let res = client.get("/tricks/backside-360/delete").send().await?;
        assert_eq!(res.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            res.headers().get("location").unwrap(),
            "/?deleted=backside-360"
        );

        let res = client.get("/tricks/backside-360").send().await?;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);

        Ok(())
    }

    #[tokio::test]
    async fn non_owner_is_forbidden() -> Result<(), Box<dyn std::error::Error>> {
        let client = Client::new().await;
        client.login("alice").await?;
        client.create_trick("Backside 360", &[]).await?;
        client.logout().await?;

        // anonymous
        let res = client.get("/tricks/backside-360/delete").send().await?;
        assert_eq!(res.status(), StatusCode::FORBIDDEN);

        // authenticated but neither owner nor admin
        client.login("bob").await?;
        let res = client.get("/tricks/backside-360/delete").send().await?;
        assert_eq!(res.status(), StatusCode::FORBIDDEN);

        let res = client.get("/tricks/backside-360").send().await?;
        assert_eq!(res.status(), StatusCode::OK);

        Ok(())
    }

    #[tokio::test]
    async fn admin_deletes_any_trick() -> Result<(), Box<dyn std::error::Error>> {
        let client = Client::new().await;
        client.login("alice").await?;
        client.create_trick("Backside 360", &[]).await?;
        client.logout().await?;

        client.login("admin").await?;
        let res = client.get("/tricks/backside-360/delete").send().await?;
        assert_eq!(res.status(), StatusCode::SEE_OTHER);

        Ok(())
    }

    #[tokio::test]
    async fn delete_missing_trick_is_not_found() -> Result<(), Box<dyn std::error::Error>> {
        let client = Client::new().await;
        client.login("admin").await?;

        let res = client.get("/tricks/no-such-trick/delete").send().await?;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);

        Ok(())
    }

    #[tokio::test]
    async fn comment_moderation() -> Result<(), Box<dyn std::error::Error>> {
        let client = Client::new().await;
        client.login("alice").await?;
        client.create_trick("Backside 360", &[]).await?;
        client.logout().await?;

        client.login("bob").await?;
        client
            .post("/tricks/backside-360/comments")
            .form(&[("text", "bob was here")])
            .send()
            .await?;

        let content = client.get("/tricks/backside-360").send().await?.text().await?;
        let id = content
            .split("comment-")
            .nth(1)
            .and_then(|rest| rest.split('"').next())
            .unwrap()
            .to_string();
        client.logout().await?;

        // alice owns the trick but not the comment
        client.login("alice").await?;
        let res = client
            .get(&format!("/tricks/backside-360/delete-comment/{id}"))
            .send()
            .await?;
        assert_eq!(res.status(), StatusCode::FORBIDDEN);
        client.logout().await?;

        client.login("bob").await?;
        let res = client
            .get(&format!("/tricks/backside-360/delete-comment/{id}"))
            .send()
            .await?;
        assert_eq!(res.status(), StatusCode::SEE_OTHER);

        let content = client.get("/tricks/backside-360").send().await?.text().await?;
        assert!(!content.contains("bob was here"));

        Ok(())
    }

    #[tokio::test]
    async fn video_deletion_requires_authentication() -> Result<(), Box<dyn std::error::Error>> {
        let client = Client::new().await;
        client.login("alice").await?;
        client
            .create_trick("Backside 360", &["https://youtu.be/abc123"])
            .await?;

        let content = client.get("/tricks/backside-360").send().await?.text().await?;
        let id = content
            .split("delete-video/")
            .nth(1)
            .and_then(|rest| rest.split('"').next())
            .unwrap()
            .to_string();
        client.logout().await?;

        let res = client
            .get(&format!("/tricks/backside-360/delete-video/{id}"))
            .send()
            .await?;
        assert_eq!(res.status(), StatusCode::FORBIDDEN);

        client.login("alice").await?;
        let res = client
            .get(&format!("/tricks/backside-360/delete-video/{id}"))
            .send()
            .await?;
        assert_eq!(res.status(), StatusCode::SEE_OTHER);

        let content = client.get("/tricks/backside-360").send().await?.text().await?;
        assert!(!content.contains("youtube.com/embed"));

        Ok(())
    }

    #[tokio::test]
    async fn only_admin_deletes_accounts() -> Result<(), Box<dyn std::error::Error>> {
        let client = Client::new().await;

        // not even the account owner may delete through this path
        client.login("alice").await?;
        let res = client.get("/users/alice/delete").send().await?;
        assert_eq!(res.status(), StatusCode::FORBIDDEN);
        client.logout().await?;

        client.login("admin").await?;
        let res = client.get("/users/alice/delete").send().await?;
        assert_eq!(res.status(), StatusCode::SEE_OTHER);

        let res = client.get("/users/alice/delete").send().await?;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);

        Ok(())
    }
}
