//! Camera Capture Layer
//!
//! The camera is consumed as a capability provider: binding yields an
//! exclusively held session, and a session writes still images to disk.
//! Sessions are wrapped in a [`SessionGuard`] so they are released on every
//! exit path, including cancellation.

pub mod frame;
pub mod still;

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Local};
use thiserror::Error;
use tracing::debug;

pub use frame::CapturedImage;
pub use still::StillImageCamera;

/// Errors reported by camera providers
#[derive(Debug, Error)]
pub enum CameraError {
    /// No usable camera (missing hardware or source)
    #[error("no camera available: {0}")]
    Unavailable(String),
    /// Another session currently holds the camera
    #[error("camera is busy")]
    Busy,
    /// Capture requested on a session that was already released
    #[error("camera session already released")]
    Released,
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("image encoding failed: {0}")]
    Image(#[from] image::ImageError),
}

/// Capture configuration resolved from settings
#[derive(Debug, Clone)]
pub struct CaptureConfig {
    /// Directory captured images are written to
    pub capture_dir: PathBuf,
    /// File name prefix for captured images
    pub file_prefix: String,
    /// File extension (without the dot), also selects the encoder
    pub extension: String,
    /// Crop the captured image to its central region before recognition
    pub crop_to_center: bool,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            capture_dir: std::env::temp_dir().join("pdi-news"),
            file_prefix: "ocr_capture_".to_string(),
            extension: DEFAULT_EXTENSION.to_string(),
            crop_to_center: true,
        }
    }
}

impl CaptureConfig {
    /// Build a fresh, timestamped path for the next capture, creating the
    /// capture directory if needed. Captures within the same second get a
    /// numeric suffix instead of overwriting each other.
    pub fn next_capture_path(&self) -> std::io::Result<PathBuf> {
        std::fs::create_dir_all(&self.capture_dir)?;

        let name = capture_file_name(&self.file_prefix, &self.extension, Local::now());
        let mut path = self.capture_dir.join(&name);
        let mut suffix = 1;
        while path.exists() {
            let mut numbered = PathBuf::from(&name);
            let stem = numbered
                .file_stem()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_default();
            numbered.set_file_name(format!("{}_{}", stem, suffix));
            numbered.set_extension(file_extension(&self.extension));
            path = self.capture_dir.join(numbered);
            suffix += 1;
        }
        Ok(path)
    }
}

/// Extension used when the configured one is blank
pub const DEFAULT_EXTENSION: &str = "jpg";

fn file_extension(extension: &str) -> &str {
    match extension.trim().trim_start_matches('.') {
        "" => DEFAULT_EXTENSION,
        ext => ext,
    }
}

/// Format a capture file name as `<prefix><yyyyMMdd_HHmmss>.<extension>`
pub fn capture_file_name(prefix: &str, extension: &str, at: DateTime<Local>) -> String {
    format!(
        "{}{}.{}",
        prefix,
        at.format("%Y%m%d_%H%M%S"),
        file_extension(extension)
    )
}

/// A source of camera sessions
#[async_trait]
pub trait CameraProvider: Send + Sync {
    /// Human readable provider name for logs
    fn name(&self) -> &str;

    /// Bind a camera session. Fails when no camera is available or the
    /// camera is already held by another session.
    async fn bind(&self) -> Result<Box<dyn CameraSession>, CameraError>;
}

/// An exclusively held camera session
#[async_trait]
pub trait CameraSession: Send {
    /// Capture a still image and write it to `path`
    async fn capture(&mut self, path: &Path) -> Result<(), CameraError>;

    /// Release the underlying camera. Must be idempotent.
    fn release(&mut self);
}

/// Scoped ownership of a camera session.
///
/// The session is released when the guard is dropped, so early returns and
/// cancelled futures never leak the camera.
pub struct SessionGuard {
    session: Option<Box<dyn CameraSession>>,
}

impl SessionGuard {
    pub fn new(session: Box<dyn CameraSession>) -> Self {
        Self {
            session: Some(session),
        }
    }

    /// Capture to `path` and return the captured image once the file exists
    pub async fn capture(&mut self, path: PathBuf) -> Result<CapturedImage, CameraError> {
        let session = self.session.as_mut().ok_or(CameraError::Released)?;
        session.capture(&path).await?;

        // A provider that reports success without writing anything is an I/O failure
        let metadata = tokio::fs::metadata(&path).await?;
        debug!("Captured {} bytes to {:?}", metadata.len(), path);

        Ok(CapturedImage::new(path))
    }

    /// Release the session now instead of at drop
    pub fn release(&mut self) {
        if let Some(mut session) = self.session.take() {
            session.release();
            debug!("Camera session released");
        }
    }

    pub fn is_held(&self) -> bool {
        self.session.is_some()
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct CountingSession {
        releases: Arc<AtomicUsize>,
        write: bool,
    }

    #[async_trait]
    impl CameraSession for CountingSession {
        async fn capture(&mut self, path: &Path) -> Result<(), CameraError> {
            if self.write {
                std::fs::write(path, b"not really a jpeg")?;
            }
            Ok(())
        }

        fn release(&mut self) {
            self.releases.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_capture_file_name_format() {
        let at = Local.with_ymd_and_hms(2024, 3, 7, 9, 5, 1).unwrap();
        assert_eq!(
            capture_file_name("ocr_capture_", "jpg", at),
            "ocr_capture_20240307_090501.jpg"
        );
        assert_eq!(
            capture_file_name("scan_", ".png", at),
            "scan_20240307_090501.png"
        );
    }

    #[test]
    fn test_next_capture_path_creates_dir() {
        let dir = tempfile::tempdir().unwrap();
        let config = CaptureConfig {
            capture_dir: dir.path().join("nested").join("captures"),
            ..Default::default()
        };

        let path = config.next_capture_path().unwrap();
        assert!(config.capture_dir.is_dir());
        assert_eq!(path.parent().unwrap(), config.capture_dir);
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("ocr_capture_"));
        assert!(name.ends_with(".jpg"));
    }

    #[test]
    fn test_blank_extension_falls_back_to_jpg() {
        let at = Local.with_ymd_and_hms(2024, 3, 7, 9, 5, 1).unwrap();
        assert_eq!(
            capture_file_name("scan_", "", at),
            "scan_20240307_090501.jpg"
        );
        assert_eq!(
            capture_file_name("scan_", " . ", at),
            "scan_20240307_090501.jpg"
        );

        let dir = tempfile::tempdir().unwrap();
        let config = CaptureConfig {
            capture_dir: dir.path().to_path_buf(),
            extension: String::new(),
            ..Default::default()
        };
        let first = config.next_capture_path().unwrap();
        std::fs::write(&first, b"x").unwrap();
        let second = config.next_capture_path().unwrap();

        assert!(first.to_string_lossy().ends_with(".jpg"));
        assert_ne!(first, second);
        assert!(second.to_string_lossy().ends_with(".jpg"));
    }

    #[test]
    fn test_next_capture_path_avoids_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let config = CaptureConfig {
            capture_dir: dir.path().to_path_buf(),
            extension: "png".to_string(),
            ..Default::default()
        };

        let first = config.next_capture_path().unwrap();
        std::fs::write(&first, b"x").unwrap();
        let second = config.next_capture_path().unwrap();

        assert_ne!(first, second);
        assert!(second.to_string_lossy().ends_with(".png"));
    }

    #[test]
    fn test_guard_releases_once_on_drop() {
        let releases = Arc::new(AtomicUsize::new(0));
        let mut guard = SessionGuard::new(Box::new(CountingSession {
            releases: releases.clone(),
            write: true,
        }));
        assert!(guard.is_held());

        guard.release();
        assert!(!guard.is_held());
        drop(guard);

        assert_eq!(releases.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_guard_capture_requires_written_file() {
        let dir = tempfile::tempdir().unwrap();
        let releases = Arc::new(AtomicUsize::new(0));

        let mut guard = SessionGuard::new(Box::new(CountingSession {
            releases: releases.clone(),
            write: false,
        }));
        let result = guard.capture(dir.path().join("missing.jpg")).await;
        assert!(matches!(result, Err(CameraError::Io(_))));

        let mut guard = SessionGuard::new(Box::new(CountingSession {
            releases: releases.clone(),
            write: true,
        }));
        let captured = guard.capture(dir.path().join("written.jpg")).await.unwrap();
        assert!(captured.path().exists());

        drop(guard);
        assert_eq!(releases.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_capture_after_release_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut guard = SessionGuard::new(Box::new(CountingSession {
            releases: Arc::new(AtomicUsize::new(0)),
            write: true,
        }));
        guard.release();

        let result = guard.capture(dir.path().join("late.jpg")).await;
        assert!(matches!(result, Err(CameraError::Released)));
    }
}
