//! Still-image camera
//!
//! Serves a fixed source image as the camera feed. Capturing re-encodes the
//! source into the requested file, so downstream code sees the same
//! file-on-disk contract as a real camera. The camera can be held by one
//! session at a time.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::{debug, info};

use super::{CameraError, CameraProvider, CameraSession};

/// Camera backed by an image file
pub struct StillImageCamera {
    source: PathBuf,
    lock: Arc<Semaphore>,
}

impl StillImageCamera {
    pub fn new(source: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            lock: Arc::new(Semaphore::new(1)),
        }
    }
}

#[async_trait]
impl CameraProvider for StillImageCamera {
    fn name(&self) -> &str {
        "still-image"
    }

    async fn bind(&self) -> Result<Box<dyn CameraSession>, CameraError> {
        if !tokio::fs::try_exists(&self.source).await? {
            return Err(CameraError::Unavailable(format!(
                "source image {:?} does not exist",
                self.source
            )));
        }

        let permit = self
            .lock
            .clone()
            .try_acquire_owned()
            .map_err(|_| CameraError::Busy)?;

        info!("Camera bound to {:?}", self.source);

        Ok(Box::new(StillImageSession {
            source: self.source.clone(),
            permit: Some(permit),
        }))
    }
}

struct StillImageSession {
    source: PathBuf,
    permit: Option<OwnedSemaphorePermit>,
}

#[async_trait]
impl CameraSession for StillImageSession {
    async fn capture(&mut self, path: &Path) -> Result<(), CameraError> {
        if self.permit.is_none() {
            return Err(CameraError::Released);
        }

        let source = self.source.clone();
        let target = path.to_path_buf();

        tokio::task::spawn_blocking(move || -> Result<(), CameraError> {
            let frame = image::open(&source)?;
            // JPEG has no alpha channel
            frame.to_rgb8().save(&target)?;
            Ok(())
        })
        .await
        .map_err(|e| CameraError::Io(std::io::Error::other(e)))??;

        debug!("Still image written to {:?}", path);
        Ok(())
    }

    fn release(&mut self) {
        if self.permit.take().is_some() {
            debug!("Still-image camera released");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn write_source(dir: &Path) -> PathBuf {
        let path = dir.join("source.png");
        RgbImage::from_pixel(64, 48, Rgb([200, 10, 10]))
            .save(&path)
            .unwrap();
        path
    }

    #[tokio::test]
    async fn test_bind_missing_source_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let camera = StillImageCamera::new(dir.path().join("nope.png"));

        let result = camera.bind().await;
        assert!(matches!(result, Err(CameraError::Unavailable(_))));
    }

    #[tokio::test]
    async fn test_capture_writes_jpeg() {
        let dir = tempfile::tempdir().unwrap();
        let camera = StillImageCamera::new(write_source(dir.path()));

        let mut session = camera.bind().await.unwrap();
        let target = dir.path().join("capture.jpg");
        session.capture(&target).await.unwrap();

        let captured = image::open(&target).unwrap();
        assert_eq!((captured.width(), captured.height()), (64, 48));
    }

    #[tokio::test]
    async fn test_second_bind_is_busy_until_release() {
        let dir = tempfile::tempdir().unwrap();
        let camera = StillImageCamera::new(write_source(dir.path()));

        let mut first = camera.bind().await.unwrap();
        assert!(matches!(camera.bind().await, Err(CameraError::Busy)));

        first.release();
        assert!(camera.bind().await.is_ok());
    }

    #[tokio::test]
    async fn test_dropping_session_frees_camera() {
        let dir = tempfile::tempdir().unwrap();
        let camera = StillImageCamera::new(write_source(dir.path()));

        let session = camera.bind().await.unwrap();
        drop(session);

        assert!(camera.bind().await.is_ok());
    }

    #[tokio::test]
    async fn test_capture_after_release_fails() {
        let dir = tempfile::tempdir().unwrap();
        let camera = StillImageCamera::new(write_source(dir.path()));

        let mut session = camera.bind().await.unwrap();
        session.release();

        let result = session.capture(&dir.path().join("late.jpg")).await;
        assert!(matches!(result, Err(CameraError::Released)));
    }
}
