//! SQLite database for favorite articles

use anyhow::{Context, Result};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use tracing::{debug, info};

use crate::news::{Article, Source};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS articles (
    id           INTEGER PRIMARY KEY AUTOINCREMENT,
    author       TEXT,
    content      TEXT,
    description  TEXT,
    published_at TEXT,
    source_id    TEXT,
    source_name  TEXT,
    title        TEXT,
    url          TEXT UNIQUE,
    url_to_image TEXT
);
";

const COLUMNS: &str =
    "id, author, content, description, published_at, source_id, source_name, title, url, url_to_image";

/// Database connection wrapper
pub struct ArticleDatabase {
    conn: Mutex<Connection>,
}

impl ArticleDatabase {
    /// Open or create database at path
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database {:?}", path))?;
        info!("Opened article database at {:?}", path);
        Self::with_connection(conn)
    }

    /// Open a throwaway in-memory database
    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        let db = Self {
            conn: Mutex::new(conn),
        };
        db.init_schema()?;
        Ok(db)
    }

    /// Initialize database schema
    pub fn init_schema(&self) -> Result<()> {
        self.conn
            .lock()
            .execute_batch(SCHEMA)
            .context("Failed to create schema")?;
        Ok(())
    }

    /// Insert or update an article, returning its row id.
    ///
    /// Articles with an id are updated in place; otherwise an existing row
    /// with the same url is updated.
    pub fn upsert(&self, article: &Article) -> Result<i64> {
        let conn = self.conn.lock();

        if let Some(id) = article.id {
            let updated = conn.execute(
                "UPDATE articles SET author = ?2, content = ?3, description = ?4,
                    published_at = ?5, source_id = ?6, source_name = ?7, title = ?8,
                    url = ?9, url_to_image = ?10
                 WHERE id = ?1",
                params![
                    id,
                    article.author,
                    article.content,
                    article.description,
                    article.published_at,
                    article.source.id,
                    article.source.name,
                    article.title,
                    article.url,
                    article.url_to_image,
                ],
            )?;
            if updated > 0 {
                debug!("Updated article {}", id);
                return Ok(id);
            }
        }

        let id: i64 = conn.query_row(
            "INSERT INTO articles (id, author, content, description, published_at,
                source_id, source_name, title, url, url_to_image)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
             ON CONFLICT(url) DO UPDATE SET
                author = excluded.author,
                content = excluded.content,
                description = excluded.description,
                published_at = excluded.published_at,
                source_id = excluded.source_id,
                source_name = excluded.source_name,
                title = excluded.title,
                url_to_image = excluded.url_to_image
             RETURNING id",
            params![
                article.id,
                article.author,
                article.content,
                article.description,
                article.published_at,
                article.source.id,
                article.source.name,
                article.title,
                article.url,
                article.url_to_image,
            ],
            |row| row.get(0),
        )?;

        debug!("Upserted article {}", id);
        Ok(id)
    }

    /// All stored articles, most recently added first
    pub fn get_all_articles(&self) -> Result<Vec<Article>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&format!("SELECT {} FROM articles ORDER BY id DESC", COLUMNS))?;
        let articles = stmt
            .query_map([], article_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(articles)
    }

    /// Look up a stored article by url
    pub fn find_by_url(&self, url: &str) -> Result<Option<Article>> {
        let conn = self.conn.lock();
        let article = conn
            .query_row(
                &format!("SELECT {} FROM articles WHERE url = ?1", COLUMNS),
                params![url],
                article_from_row,
            )
            .optional()?;
        Ok(article)
    }

    /// Delete an article by id, or by url when it has no id.
    /// Returns whether a row was removed.
    pub fn delete_article(&self, article: &Article) -> Result<bool> {
        let conn = self.conn.lock();
        let removed = match (article.id, article.url.as_deref()) {
            (Some(id), _) => conn.execute("DELETE FROM articles WHERE id = ?1", params![id])?,
            (None, Some(url)) => conn.execute("DELETE FROM articles WHERE url = ?1", params![url])?,
            (None, None) => 0,
        };
        Ok(removed > 0)
    }
}

fn article_from_row(row: &Row<'_>) -> rusqlite::Result<Article> {
    Ok(Article {
        id: row.get(0)?,
        author: row.get(1)?,
        content: row.get(2)?,
        description: row.get(3)?,
        published_at: row.get(4)?,
        source: Source {
            id: row.get(5)?,
            name: row.get(6)?,
        },
        title: row.get(7)?,
        url: row.get(8)?,
        url_to_image: row.get(9)?,
    })
}
