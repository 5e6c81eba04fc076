//! News Layer
//!
//! Remote headlines and search through NewsAPI, plus locally stored
//! favorites, behind a single repository.

pub mod api;
pub mod models;
pub mod repository;

pub use api::{NewsApi, NewsError};
pub use models::{Article, NewsResponse, Source};
pub use repository::NewsRepository;
