//! Capture Workflow
//!
//! Permission check → camera start → capture → decode/crop → recognize →
//! deliver, run as one sequential async task per invocation.
//!
//! Each stage waits for the previous stage's success. Every failure is
//! terminal for the invocation and nothing is retried. Cancelling the
//! invocation abandons it at the next suspension point, releases the camera
//! and skips delivery.

pub mod console;
pub mod delivery;
pub mod error;
pub mod permission;
pub mod state;
pub mod trigger;

use std::future::Future;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, info_span, Instrument};
use uuid::Uuid;

use crate::capture::{CameraError, CameraProvider, CaptureConfig, SessionGuard};
use crate::vision::{load_for_recognition, TextRecognizer};

pub use console::ConsoleInput;
pub use delivery::{
    CaptureResultPayload, ChannelDelivery, ConsoleNotifier, JsonStdoutDelivery, ResultDelivery,
    UserNotifier,
};
pub use error::CaptureError;
pub use permission::{
    ensure_camera_permission, prompt_for_policy, PermissionOutcome, PermissionPrompt,
    PermissionState,
};
pub use state::{StateMachine, WorkflowEvent, WorkflowState};
pub use trigger::{capture_button, CaptureTrigger, EnterKeyTrigger, ImmediateTrigger};

/// Outcome of one workflow invocation
#[derive(Debug)]
pub struct WorkflowReport {
    /// Identifier used in this invocation's log span
    pub invocation: Uuid,
    /// Delivered text, or the reason nothing was delivered
    pub outcome: Result<String, CaptureError>,
    /// States visited, starting at `Idle`
    pub history: Vec<WorkflowState>,
}

impl WorkflowReport {
    pub fn final_state(&self) -> WorkflowState {
        self.history.last().copied().unwrap_or(WorkflowState::Idle)
    }
}

/// Orchestrates the capability providers for the capture flow.
///
/// The controller itself holds no per-invocation state, so it can be reused
/// for any number of sequential invocations.
pub struct CaptureWorkflow {
    permissions: Arc<dyn PermissionPrompt>,
    camera: Arc<dyn CameraProvider>,
    recognizer: Arc<dyn TextRecognizer>,
    notifier: Arc<dyn UserNotifier>,
    config: CaptureConfig,
}

impl CaptureWorkflow {
    pub fn new(
        permissions: Arc<dyn PermissionPrompt>,
        camera: Arc<dyn CameraProvider>,
        recognizer: Arc<dyn TextRecognizer>,
        notifier: Arc<dyn UserNotifier>,
        config: CaptureConfig,
    ) -> Self {
        Self {
            permissions,
            camera,
            recognizer,
            notifier,
            config,
        }
    }

    pub fn config(&self) -> &CaptureConfig {
        &self.config
    }

    /// Run one invocation of the workflow.
    ///
    /// `delivery` receives the normalized text only if the invocation
    /// completes; it is dropped untouched on failure or cancellation.
    pub async fn run<T, D>(&self, mut trigger: T, delivery: D, cancel: CancellationToken) -> WorkflowReport
    where
        T: CaptureTrigger,
        D: ResultDelivery,
    {
        let invocation = Uuid::new_v4();
        let span = info_span!("capture_workflow", %invocation);

        async move {
            let mut machine = StateMachine::new();
            let outcome = self.execute(&mut machine, &mut trigger, &cancel).await;

            match &outcome {
                Ok(text) => {
                    info!("Recognized {} characters", text.chars().count());
                    self.notifier.notify(&format!("Recognized text: {}", text));
                    delivery.deliver(CaptureResultPayload {
                        recognized_text: text.clone(),
                    });
                }
                Err(CaptureError::Cancelled) => {
                    // Terminal states cannot be cancelled; nothing to record then
                    let _ = machine.advance(WorkflowEvent::Cancel);
                    info!("Capture workflow abandoned");
                }
                Err(e) => {
                    error!("Capture workflow failed: {}", e);
                    if let Some(message) = e.user_message() {
                        self.notifier.notify(message);
                    }
                }
            }

            WorkflowReport {
                invocation,
                outcome,
                history: machine.into_history(),
            }
        }
        .instrument(span)
        .await
    }

    async fn execute(
        &self,
        machine: &mut StateMachine,
        trigger: &mut dyn CaptureTrigger,
        cancel: &CancellationToken,
    ) -> Result<String, CaptureError> {
        let granted = self.permissions.check() == PermissionState::Granted;
        machine.advance(WorkflowEvent::Start {
            permission_granted: granted,
        })?;

        if !granted {
            match until_cancelled(cancel, ensure_camera_permission(self.permissions.as_ref())).await? {
                PermissionOutcome::Granted => {
                    machine.advance(WorkflowEvent::PermissionGranted)?;
                }
                PermissionOutcome::Denied {
                    requires_user_prompt,
                } => {
                    machine.advance(WorkflowEvent::PermissionDenied)?;
                    return Err(CaptureError::PermissionDenied {
                        requires_user_prompt,
                    });
                }
            }
        }

        info!("Starting camera '{}'", self.camera.name());
        let mut session = match until_cancelled(cancel, self.camera.bind()).await? {
            Ok(session) => {
                let guard = SessionGuard::new(session);
                machine.advance(WorkflowEvent::CameraBound)?;
                guard
            }
            Err(e) => {
                machine.advance(WorkflowEvent::CameraBindFailed)?;
                return Err(CaptureError::CameraBindingFailed(e));
            }
        };

        if !until_cancelled(cancel, trigger.requested()).await? {
            return Err(CaptureError::Cancelled);
        }
        machine.advance(WorkflowEvent::CaptureRequested)?;

        let captured = match self.config.next_capture_path() {
            Ok(path) => until_cancelled(cancel, session.capture(path)).await?,
            Err(e) => Err(CameraError::Io(e)),
        };
        let captured = match captured {
            Ok(captured) => {
                machine.advance(WorkflowEvent::ImageSaved)?;
                captured
            }
            Err(e) => {
                machine.advance(WorkflowEvent::CaptureFailed)?;
                return Err(CaptureError::CaptureIoFailed(e));
            }
        };

        machine.advance(WorkflowEvent::RecognitionStarted)?;
        let recognition = async {
            let image =
                load_for_recognition(captured.path().to_path_buf(), self.config.crop_to_center).await?;
            debug!(
                "Submitting {}x{} image to '{}'",
                image.width(),
                image.height(),
                self.recognizer.name()
            );
            self.recognizer.recognize(image).await
        };

        match until_cancelled(cancel, recognition).await? {
            Ok(result) => {
                machine.advance(WorkflowEvent::TextRecognized)?;
                debug!(
                    "Recognition finished {:?} after capture, {} lines",
                    captured.age(),
                    result.lines.len()
                );
                Ok(result.single_line())
            }
            Err(e) => {
                machine.advance(WorkflowEvent::RecognitionFailed)?;
                Err(CaptureError::RecognitionFailed(e))
            }
        }
    }
}

/// Await `fut` unless `cancel` fires first
async fn until_cancelled<F: Future>(cancel: &CancellationToken, fut: F) -> Result<F::Output, CaptureError> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(CaptureError::Cancelled),
        output = fut => Ok(output),
    }
}
