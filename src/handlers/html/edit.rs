use crate::db::{NewTrick, TrickUpdate};
use crate::handlers::extract::Session;
use crate::handlers::html::{make_error, ErrorResponse};
use crate::slug::Slug;
use crate::{Database, Page};
use askama::Template;
use axum::extract::{Form, Path, State};
use axum::response::Redirect;
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
pub struct TrickForm {
    pub name: String,
    pub description: String,
    pub cover: String,
    /// One picture reference per line.
    pub pictures: String,
    /// One video URL per line.
    pub videos: String,
}

/// Create/edit form, prefilled when editing an existing trick.
#[derive(Template)]
#[template(path = "edit.html")]
pub struct Edit {
    page: Page,
    slug: Option<String>,
    form: TrickForm,
}

fn lines(input: &str) -> Vec<String> {
    input
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(ToString::to_string)
        .collect()
}

fn optional(input: String) -> Option<String> {
    let input = input.trim();
    (!input.is_empty()).then(|| input.to_string())
}

/// GET handler for the creation form.
pub async fn get_new(State(page): State<Page>, _session: Session) -> Edit {
    Edit {
        page,
        slug: None,
        form: TrickForm::default(),
    }
}

/// POST handler creating a new trick owned by the session user.
pub async fn post_new(
    State(db): State<Database>,
    State(page): State<Page>,
    session: Session,
    Form(form): Form<TrickForm>,
) -> Result<Redirect, ErrorResponse> {
    async {
        let slug = Slug::new(&form.name)?;

        db.insert_trick(NewTrick {
            slug: slug.to_string(),
            name: form.name.trim().to_string(),
            description: form.description,
            cover: optional(form.cover),
            author: session.0.username,
            pictures: lines(&form.pictures),
            videos: lines(&form.videos),
        })
        .await?;

        tracing::debug!(%slug, "created trick");

        Ok(Redirect::to(&format!("/?saved={slug}")))
    }
    .await
    .map_err(|err| make_error(err, page))
}

/// GET handler for the edit form, prefilled from the stored trick.
pub async fn get_edit(
    Path(slug): Path<String>,
    State(db): State<Database>,
    State(page): State<Page>,
    _session: Session,
) -> Result<Edit, ErrorResponse> {
    async {
        let slug: Slug = slug.parse()?;
        let trick = db.get_trick(slug.to_string()).await?;

        let pictures = db.pictures(trick.id).await?.join("\n");

        let videos = db
            .videos(trick.id)
            .await?
            .into_iter()
            .map(|video| video.embed)
            .collect::<Vec<_>>()
            .join("\n");

        Ok(Edit {
            page: page.clone(),
            slug: Some(trick.slug),
            form: TrickForm {
                name: trick.name,
                description: trick.description,
                cover: trick.cover.unwrap_or_default(),
                pictures,
                videos,
            },
        })
    }
    .await
    .map_err(|err| make_error(err, page))
}

/// POST handler updating an existing trick. The slug stays stable.
pub async fn post_edit(
    Path(slug): Path<String>,
    State(db): State<Database>,
    State(page): State<Page>,
    _session: Session,
    Form(form): Form<TrickForm>,
) -> Result<Redirect, ErrorResponse> {
    async {
        let slug: Slug = slug.parse()?;

        db.update_trick(
            slug.to_string(),
            TrickUpdate {
                name: form.name.trim().to_string(),
                description: form.description,
                cover: optional(form.cover),
                pictures: lines(&form.pictures),
                videos: lines(&form.videos),
            },
        )
        .await?;

        Ok(Redirect::to(&format!("/?saved={slug}")))
    }
    .await
    .map_err(|err| make_error(err, page))
}
