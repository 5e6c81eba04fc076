//! Repository forwarding to the news API and the favorites database

use anyhow::Result;

use super::api::{NewsApi, NewsError};
use super::models::{Article, NewsResponse};
use crate::storage::ArticleDatabase;

pub struct NewsRepository {
    api: NewsApi,
    db: ArticleDatabase,
}

impl NewsRepository {
    pub fn new(api: NewsApi, db: ArticleDatabase) -> Self {
        Self { api, db }
    }

    pub async fn get_headlines(&self, page: u32) -> Result<NewsResponse, NewsError> {
        self.api.get_headlines(page).await
    }

    pub async fn search_news(&self, query: &str, page: u32) -> Result<NewsResponse, NewsError> {
        self.api.search_news(query, page).await
    }

    /// Save an article to favorites
    pub fn upsert(&self, article: &Article) -> Result<i64> {
        self.db.upsert(article)
    }

    pub fn get_favorite_news(&self) -> Result<Vec<Article>> {
        self.db.get_all_articles()
    }

    pub fn find_favorite(&self, url: &str) -> Result<Option<Article>> {
        self.db.find_by_url(url)
    }

    pub fn delete_article(&self, article: &Article) -> Result<bool> {
        self.db.delete_article(article)
    }
}
