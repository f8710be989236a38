use crate::errors::Error;
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use rusqlite_migration::{Migrations, M};
use std::path::PathBuf;
use std::sync::{Arc, LazyLock};
use tokio::task::spawn_blocking;

static MIGRATIONS: LazyLock<Migrations> = LazyLock::new(|| {
    Migrations::new(vec![
        M::up(include_str!("migrations/0001-initial.sql")),
        M::up(include_str!("migrations/0002-add-comment-index.sql")),
    ])
});

/// Number of top-level comments per page on a trick detail view.
pub const COMMENTS_PER_PAGE: u32 = 4;

/// Our main database.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

/// Database opening modes
#[derive(Debug)]
pub enum Open {
    /// Open in-memory database that is wiped after reload
    Memory,
    /// Open database from given path
    Path(PathBuf),
}

/// A registered account.
pub struct User {
    pub name: String,
    /// Encoded argon2 hash.
    pub password: String,
    pub admin: bool,
}

/// A trick read from the database.
pub struct Trick {
    pub id: i64,
    pub slug: String,
    pub name: String,
    pub description: String,
    pub cover: Option<String>,
    pub author: String,
    /// Unix timestamp of creation.
    pub created: i64,
}

/// Trick data for the index listing.
pub struct TrickSummary {
    pub slug: String,
    pub name: String,
    pub author: String,
    pub cover: Option<String>,
}

/// A trick to insert, together with its picture and video references.
pub struct NewTrick {
    pub slug: String,
    pub name: String,
    pub description: String,
    pub cover: Option<String>,
    pub author: String,
    pub pictures: Vec<String>,
    pub videos: Vec<String>,
}

/// Updated trick fields. The slug stays stable across edits.
pub struct TrickUpdate {
    pub name: String,
    pub description: String,
    pub cover: Option<String>,
    pub pictures: Vec<String>,
    pub videos: Vec<String>,
}

/// A video reference attached to a trick, carrying the raw embed string.
pub struct Video {
    pub id: i64,
    pub embed: String,
}

/// A single video joined with its owning trick, for authorization and
/// redirects.
pub struct OwnedVideo {
    pub id: i64,
    pub trick_slug: String,
    pub trick_author: String,
}

pub struct Comment {
    pub id: i64,
    pub trick_id: i64,
    pub author: String,
    pub text: String,
    /// Unix timestamp of creation.
    pub created: i64,
}

/// A top-level comment with its direct replies.
pub struct CommentThread {
    pub comment: Comment,
    pub replies: Vec<Comment>,
}

/// One page of top-level comments, newest first.
pub struct CommentPage {
    pub threads: Vec<CommentThread>,
    /// Total number of top-level comments for the trick.
    pub total: u32,
}

fn comment_from_row(row: &rusqlite::Row) -> Result<Comment, rusqlite::Error> {
    Ok(Comment {
        id: row.get(0)?,
        trick_id: row.get(1)?,
        author: row.get(2)?,
        text: row.get(3)?,
        created: row.get(4)?,
    })
}

impl Database {
    /// Create new database with the given `method`.
    pub fn new(method: Open) -> Result<Self, Error> {
        tracing::debug!("opening {method:?}");

        let mut conn = match method {
            Open::Memory => Connection::open_in_memory()?,
            Open::Path(path) => Connection::open(path)?,
        };

        conn.pragma_update(None, "foreign_keys", true)?;
        MIGRATIONS.to_latest(&mut conn)?;

        let conn = Arc::new(Mutex::new(conn));

        Ok(Self { conn })
    }

    /// Insert account `name` with an already encoded `password` hash.
    pub async fn insert_user(
        &self,
        name: String,
        password: String,
        admin: bool,
    ) -> Result<(), Error> {
        let conn = self.conn.clone();

        spawn_blocking(move || {
            conn.lock().execute(
                "INSERT INTO users (name, password, admin) VALUES (?1, ?2, ?3)",
                params![name, password, admin],
            )?;

            Ok(())
        })
        .await?
    }

    /// Get account for `name` or fail with [`Error::NotFound`].
    pub async fn get_user(&self, name: String) -> Result<User, Error> {
        let conn = self.conn.clone();

        spawn_blocking(move || {
            conn.lock()
                .query_row(
                    "SELECT name, password, admin FROM users WHERE name = ?1",
                    params![name],
                    |row| {
                        Ok(User {
                            name: row.get(0)?,
                            password: row.get(1)?,
                            admin: row.get(2)?,
                        })
                    },
                )
                .optional()?
                .ok_or(Error::NotFound)
        })
        .await?
    }

    /// Delete account `name` including all owned tricks and comments.
    pub async fn delete_user(&self, name: String) -> Result<(), Error> {
        let conn = self.conn.clone();

        spawn_blocking(move || {
            conn.lock()
                .execute("DELETE FROM users WHERE name = ?1", params![name])?;

            Ok(())
        })
        .await?
    }

    /// Insert `trick` with its pictures and videos in one transaction.
    pub async fn insert_trick(&self, trick: NewTrick) -> Result<(), Error> {
        let conn = self.conn.clone();

        spawn_blocking(move || {
            let mut conn = conn.lock();
            let tx = conn.transaction()?;

            tx.execute(
                "INSERT INTO tricks (slug, name, description, cover, author) VALUES (?1, ?2, ?3, ?4, ?5)",
                params![trick.slug, trick.name, trick.description, trick.cover, trick.author],
            )?;

            let id = tx.last_insert_rowid();

            for file_name in &trick.pictures {
                tx.execute(
                    "INSERT INTO pictures (trick_id, file_name) VALUES (?1, ?2)",
                    params![id, file_name],
                )?;
            }

            for embed in &trick.videos {
                tx.execute(
                    "INSERT INTO videos (trick_id, embed) VALUES (?1, ?2)",
                    params![id, embed],
                )?;
            }

            tx.commit()?;

            Ok(())
        })
        .await?
    }

    /// Update the trick under `slug`, replacing its pictures and videos.
    pub async fn update_trick(&self, slug: String, update: TrickUpdate) -> Result<(), Error> {
        let conn = self.conn.clone();

        spawn_blocking(move || {
            let mut conn = conn.lock();
            let tx = conn.transaction()?;

            let rows = tx.execute(
                "UPDATE tricks SET name = ?2, description = ?3, cover = ?4 WHERE slug = ?1",
                params![slug, update.name, update.description, update.cover],
            )?;

            if rows == 0 {
                return Err(Error::NotFound);
            }

            let id: i64 = tx.query_row(
                "SELECT id FROM tricks WHERE slug = ?1",
                params![slug],
                |row| row.get(0),
            )?;

            tx.execute("DELETE FROM pictures WHERE trick_id = ?1", params![id])?;
            tx.execute("DELETE FROM videos WHERE trick_id = ?1", params![id])?;

            for file_name in &update.pictures {
                tx.execute(
                    "INSERT INTO pictures (trick_id, file_name) VALUES (?1, ?2)",
                    params![id, file_name],
                )?;
            }

            for embed in &update.videos {
                tx.execute(
                    "INSERT INTO videos (trick_id, embed) VALUES (?1, ?2)",
                    params![id, embed],
                )?;
            }

            tx.commit()?;

            Ok(())
        })
        .await?
    }

    /// Get the trick under `slug` or fail with [`Error::NotFound`].
    pub async fn get_trick(&self, slug: String) -> Result<Trick, Error> {
        let conn = self.conn.clone();

        spawn_blocking(move || {
            conn.lock()
                .query_row(
                    "SELECT id, slug, name, description, cover, author, created FROM tricks WHERE slug = ?1",
                    params![slug],
                    |row| {
                        Ok(Trick {
                            id: row.get(0)?,
                            slug: row.get(1)?,
                            name: row.get(2)?,
                            description: row.get(3)?,
                            cover: row.get(4)?,
                            author: row.get(5)?,
                            created: row.get(6)?,
                        })
                    },
                )
                .optional()?
                .ok_or(Error::NotFound)
        })
        .await?
    }

    /// List all tricks, newest first.
    pub async fn list_tricks(&self) -> Result<Vec<TrickSummary>, Error> {
        let conn = self.conn.clone();

        spawn_blocking(move || {
            let conn = conn.lock();
            let mut stmt = conn.prepare(
                "SELECT slug, name, author, cover FROM tricks ORDER BY created DESC, id DESC",
            )?;

            let tricks = stmt
                .query_map([], |row| {
                    Ok(TrickSummary {
                        slug: row.get(0)?,
                        name: row.get(1)?,
                        author: row.get(2)?,
                        cover: row.get(3)?,
                    })
                })?
                .collect::<Result<Vec<_>, _>>()?;

            Ok(tricks)
        })
        .await?
    }

    /// Delete the trick under `slug` including pictures, videos and comments.
    pub async fn delete_trick(&self, slug: String) -> Result<(), Error> {
        let conn = self.conn.clone();

        spawn_blocking(move || {
            conn.lock()
                .execute("DELETE FROM tricks WHERE slug = ?1", params![slug])?;

            Ok(())
        })
        .await?
    }

    /// List picture file names attached to trick `trick_id`.
    pub async fn pictures(&self, trick_id: i64) -> Result<Vec<String>, Error> {
        let conn = self.conn.clone();

        spawn_blocking(move || {
            let conn = conn.lock();
            let mut stmt =
                conn.prepare("SELECT file_name FROM pictures WHERE trick_id = ?1 ORDER BY id")?;

            let pictures = stmt
                .query_map(params![trick_id], |row| row.get(0))?
                .collect::<Result<Vec<_>, _>>()?;

            Ok(pictures)
        })
        .await?
    }

    /// List video references attached to trick `trick_id`.
    pub async fn videos(&self, trick_id: i64) -> Result<Vec<Video>, Error> {
        let conn = self.conn.clone();

        spawn_blocking(move || {
            let conn = conn.lock();
            let mut stmt =
                conn.prepare("SELECT id, embed FROM videos WHERE trick_id = ?1 ORDER BY id")?;

            let videos = stmt
                .query_map(params![trick_id], |row| {
                    Ok(Video {
                        id: row.get(0)?,
                        embed: row.get(1)?,
                    })
                })?
                .collect::<Result<Vec<_>, _>>()?;

            Ok(videos)
        })
        .await?
    }

    /// Get video `id` joined with its owning trick or fail with
    /// [`Error::NotFound`].
    pub async fn get_video(&self, id: i64) -> Result<OwnedVideo, Error> {
        let conn = self.conn.clone();

        spawn_blocking(move || {
            conn.lock()
                .query_row(
                    "SELECT videos.id, tricks.slug, tricks.author
                     FROM videos JOIN tricks ON tricks.id = videos.trick_id
                     WHERE videos.id = ?1",
                    params![id],
                    |row| {
                        Ok(OwnedVideo {
                            id: row.get(0)?,
                            trick_slug: row.get(1)?,
                            trick_author: row.get(2)?,
                        })
                    },
                )
                .optional()?
                .ok_or(Error::NotFound)
        })
        .await?
    }

    /// Delete video `id`.
    pub async fn delete_video(&self, id: i64) -> Result<(), Error> {
        let conn = self.conn.clone();

        spawn_blocking(move || {
            conn.lock()
                .execute("DELETE FROM videos WHERE id = ?1", params![id])?;

            Ok(())
        })
        .await?
    }

    /// Insert a comment by `author` on trick `trick_id`, optionally replying
    /// to `parent_id`. The parent must belong to the same trick.
    pub async fn insert_comment(
        &self,
        trick_id: i64,
        parent_id: Option<i64>,
        author: String,
        text: String,
    ) -> Result<(), Error> {
        let conn = self.conn.clone();

        spawn_blocking(move || {
            let conn = conn.lock();

            if let Some(parent_id) = parent_id {
                let parent_trick: Option<i64> = conn
                    .query_row(
                        "SELECT trick_id FROM comments WHERE id = ?1",
                        params![parent_id],
                        |row| row.get(0),
                    )
                    .optional()?;

                if parent_trick != Some(trick_id) {
                    return Err(Error::NotFound);
                }
            }

            conn.execute(
                "INSERT INTO comments (trick_id, parent_id, author, text) VALUES (?1, ?2, ?3, ?4)",
                params![trick_id, parent_id, author, text],
            )?;

            Ok(())
        })
        .await?
    }

    /// Get comment `id` or fail with [`Error::NotFound`].
    pub async fn get_comment(&self, id: i64) -> Result<Comment, Error> {
        let conn = self.conn.clone();

        spawn_blocking(move || {
            conn.lock()
                .query_row(
                    "SELECT id, trick_id, author, text, created FROM comments WHERE id = ?1",
                    params![id],
                    comment_from_row,
                )
                .optional()?
                .ok_or(Error::NotFound)
        })
        .await?
    }

    /// Delete comment `id` including its replies.
    pub async fn delete_comment(&self, id: i64) -> Result<(), Error> {
        let conn = self.conn.clone();

        spawn_blocking(move || {
            conn.lock()
                .execute("DELETE FROM comments WHERE id = ?1", params![id])?;

            Ok(())
        })
        .await?
    }

    /// Get one page of top-level comments for trick `trick_id`, newest first,
    /// together with their replies. Pages are 1-based.
    pub async fn comments(&self, trick_id: i64, page: u32) -> Result<CommentPage, Error> {
        let conn = self.conn.clone();

        spawn_blocking(move || {
            let conn = conn.lock();

            let total: u32 = conn.query_row(
                "SELECT COUNT(*) FROM comments WHERE trick_id = ?1 AND parent_id IS NULL",
                params![trick_id],
                |row| row.get(0),
            )?;

            let offset = i64::from(page.saturating_sub(1)) * i64::from(COMMENTS_PER_PAGE);

            let mut stmt = conn.prepare(
                "SELECT id, trick_id, author, text, created FROM comments
                 WHERE trick_id = ?1 AND parent_id IS NULL
                 ORDER BY created DESC, id DESC LIMIT ?2 OFFSET ?3",
            )?;

            let comments = stmt
                .query_map(params![trick_id, COMMENTS_PER_PAGE, offset], comment_from_row)?
                .collect::<Result<Vec<_>, _>>()?;

            let mut replies_stmt = conn.prepare(
                "SELECT id, trick_id, author, text, created FROM comments
                 WHERE parent_id = ?1 ORDER BY created ASC, id ASC",
            )?;

            let mut threads = Vec::with_capacity(comments.len());

            for comment in comments {
                let replies = replies_stmt
                    .query_map(params![comment.id], comment_from_row)?
                    .collect::<Result<Vec<_>, _>>()?;

                threads.push(CommentThread { comment, replies });
            }

            Ok(CommentPage { threads, total })
        })
        .await?
    }
}
