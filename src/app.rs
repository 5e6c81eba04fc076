//! Application Coordinator
//!
//! Resolves configuration into concrete collaborators: the news repository
//! backed by the favorites database, and capture workflows built from the
//! configured permission policy and recognizer.

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;

use crate::capture::{CameraProvider, CaptureConfig};
use crate::config::AppConfig;
use crate::news::{NewsApi, NewsRepository};
use crate::storage::{self, ArticleDatabase};
use crate::vision::TesseractRecognizer;
use crate::workflow::{prompt_for_policy, CaptureWorkflow, ConsoleInput, UserNotifier};

/// Main application coordinator
pub struct NewsApp {
    config: AppConfig,
    repository: NewsRepository,
}

impl NewsApp {
    /// Open the favorites database and build the API client
    pub fn new(config: AppConfig) -> Result<Self> {
        let db_path = match &config.storage.database_path {
            Some(path) => path.clone(),
            None => storage::default_database_path()?,
        };
        let db = ArticleDatabase::open(&db_path)?;
        let api = NewsApi::new(&config.news).context("Failed to build news API client")?;

        Ok(Self::with_repository(config, NewsRepository::new(api, db)))
    }

    pub fn with_repository(config: AppConfig, repository: NewsRepository) -> Self {
        Self { config, repository }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn repository(&self) -> &NewsRepository {
        &self.repository
    }

    /// Capture settings with the capture directory resolved
    pub fn capture_config(&self) -> Result<CaptureConfig> {
        let settings = &self.config.capture;
        let capture_dir = match &settings.capture_dir {
            Some(dir) => dir.clone(),
            None => storage::default_capture_dir()?,
        };

        Ok(CaptureConfig {
            capture_dir,
            file_prefix: settings.file_prefix.clone(),
            extension: settings.extension.clone(),
            crop_to_center: settings.crop_to_center,
        })
    }

    /// Build a capture workflow around `camera`. A `prompt` permission
    /// policy reads its answer from `input`.
    pub fn capture_workflow(
        &self,
        camera: Arc<dyn CameraProvider>,
        notifier: Arc<dyn UserNotifier>,
        capture: CaptureConfig,
        input: &ConsoleInput,
    ) -> CaptureWorkflow {
        info!(
            "Capture workflow: camera '{}', permission {:?}, captures in {:?}",
            camera.name(),
            self.config.permission.camera,
            capture.capture_dir
        );

        CaptureWorkflow::new(
            Arc::from(prompt_for_policy(self.config.permission.camera, input)),
            camera,
            Arc::new(TesseractRecognizer::new(self.config.recognition.clone())),
            notifier,
            capture,
        )
    }
}
