//! Captured image handle

use std::path::{Path, PathBuf};
use std::time::Instant;

/// A still image written to disk by a camera session.
///
/// The workflow owns this handle until recognition completes. The file
/// itself is left in place for the caller to clean up.
#[derive(Debug)]
pub struct CapturedImage {
    /// Location of the encoded image
    path: PathBuf,
    /// When the capture completed
    timestamp: Instant,
}

impl CapturedImage {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            timestamp: Instant::now(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Time since the capture completed
    pub fn age(&self) -> std::time::Duration {
        self.timestamp.elapsed()
    }
}
