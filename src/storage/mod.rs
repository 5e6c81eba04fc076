//! Storage Layer
//!
//! Locates the application's data and config directories and persists
//! favorite articles using SQLite.

pub mod database;

pub use database::ArticleDatabase;

use anyhow::Result;
use directories::ProjectDirs;
use std::path::PathBuf;

fn project_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from("com", "pdinews", "PdiNews")
        .ok_or_else(|| anyhow::anyhow!("Could not determine home directory"))
}

/// Get the application data directory
pub fn get_data_dir() -> Result<PathBuf> {
    let data_dir = project_dirs()?.data_dir().to_path_buf();
    std::fs::create_dir_all(&data_dir)?;

    Ok(data_dir)
}

/// Get the configuration directory
pub fn get_config_dir() -> Result<PathBuf> {
    let config_dir = project_dirs()?.config_dir().to_path_buf();
    std::fs::create_dir_all(&config_dir)?;

    Ok(config_dir)
}

/// Default location of the favorites database
pub fn default_database_path() -> Result<PathBuf> {
    Ok(get_data_dir()?.join("articles.db"))
}

/// Default directory for captured photos
pub fn default_capture_dir() -> Result<PathBuf> {
    Ok(get_data_dir()?.join("captures"))
}
