//! NewsAPI response types

use serde::{Deserialize, Serialize};

/// Publisher of an article
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    pub id: Option<String>,
    pub name: Option<String>,
}

/// A news article.
///
/// `id` is only set for articles stored as favorites.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub author: Option<String>,
    pub content: Option<String>,
    pub description: Option<String>,
    pub published_at: Option<String>,
    #[serde(default)]
    pub source: Source,
    pub title: Option<String>,
    pub url: Option<String>,
    pub url_to_image: Option<String>,
}

impl Article {
    /// Title for display, falling back to the url
    pub fn display_title(&self) -> &str {
        self.title
            .as_deref()
            .or(self.url.as_deref())
            .unwrap_or("(untitled)")
    }
}

/// Body of a successful NewsAPI response
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsResponse {
    pub status: String,
    #[serde(default)]
    pub total_results: u32,
    #[serde(default)]
    pub articles: Vec<Article>,
}
