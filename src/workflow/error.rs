use thiserror::Error;

use super::state::{WorkflowEvent, WorkflowState};
use crate::capture::CameraError;
use crate::vision::RecognitionError;

/// Terminal outcomes of a capture workflow invocation other than success.
/// None of them are retried.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("camera permission denied")]
    PermissionDenied { requires_user_prompt: bool },

    #[error("failed to start camera: {0}")]
    CameraBindingFailed(#[source] CameraError),

    #[error("failed to capture the image: {0}")]
    CaptureIoFailed(#[source] CameraError),

    #[error("failed to recognize the text: {0}")]
    RecognitionFailed(#[source] RecognitionError),

    #[error("capture workflow cancelled")]
    Cancelled,

    #[error("invalid workflow transition from {from:?} on {event:?}")]
    InvalidTransition {
        from: WorkflowState,
        event: WorkflowEvent,
    },
}

impl CaptureError {
    /// Message to show the user, if this outcome is user visible
    pub fn user_message(&self) -> Option<&'static str> {
        match self {
            CaptureError::PermissionDenied { .. } => Some("Camera permission needed"),
            CaptureError::CameraBindingFailed(_) => Some("Unable to start the camera"),
            CaptureError::CaptureIoFailed(_) => Some("Unable to capture the image"),
            CaptureError::RecognitionFailed(_) => Some("No text could be recognized"),
            CaptureError::Cancelled | CaptureError::InvalidTransition { .. } => None,
        }
    }
}
