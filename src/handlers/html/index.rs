use crate::db::TrickSummary;
use crate::handlers::html::{make_error, ErrorResponse};
use crate::{Database, Page};
use askama::Template;
use axum::extract::{Query, State};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct IndexQuery {
    saved: Option<String>,
    deleted: Option<String>,
}

/// Index page listing all tricks.
#[derive(Template)]
#[template(path = "index.html")]
pub struct Index {
    page: Page,
    tricks: Vec<TrickSummary>,
    notice: Option<String>,
}

pub async fn get(
    State(db): State<Database>,
    State(page): State<Page>,
    Query(query): Query<IndexQuery>,
) -> Result<Index, ErrorResponse> {
    let notice = match (query.saved, query.deleted) {
        (Some(slug), _) => Some(format!("Trick saved: {slug}")),
        (_, Some(slug)) => Some(format!("Trick deleted: {slug}")),
        _ => None,
    };

    async {
        let tricks = db.list_tricks().await?;

        Ok(Index {
            page: page.clone(),
            tricks,
            notice,
        })
    }
    .await
    .map_err(|err| make_error(err, page))
}
