//! Capture workflow state machine
//!
//! Every stage of the workflow is an explicit transition. Anything not in
//! the table below is rejected, which keeps the failure and cancellation
//! paths auditable through the recorded history.

use tracing::debug;

use super::error::CaptureError;

/// Workflow states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowState {
    Idle,
    PermissionPending,
    CameraStarting,
    Ready,
    Capturing,
    Captured,
    Recognizing,
    Completed,
    Failed,
    /// The caller went away before the workflow finished
    Cancelled,
}

/// Inputs that move the workflow between states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowEvent {
    Start { permission_granted: bool },
    PermissionGranted,
    PermissionDenied,
    CameraBound,
    CameraBindFailed,
    CaptureRequested,
    ImageSaved,
    CaptureFailed,
    RecognitionStarted,
    TextRecognized,
    RecognitionFailed,
    Cancel,
}

impl WorkflowState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            WorkflowState::Completed | WorkflowState::Failed | WorkflowState::Cancelled
        )
    }

    /// The state reached from `self` on `event`, if that transition exists
    pub fn on(self, event: WorkflowEvent) -> Option<WorkflowState> {
        use WorkflowEvent as E;
        use WorkflowState as S;

        let next = match (self, event) {
            (S::Idle, E::Start { permission_granted: false }) => S::PermissionPending,
            (S::Idle, E::Start { permission_granted: true }) => S::CameraStarting,
            (S::PermissionPending, E::PermissionGranted) => S::CameraStarting,
            (S::PermissionPending, E::PermissionDenied) => S::Failed,
            (S::CameraStarting, E::CameraBound) => S::Ready,
            (S::CameraStarting, E::CameraBindFailed) => S::Failed,
            (S::Ready, E::CaptureRequested) => S::Capturing,
            (S::Capturing, E::ImageSaved) => S::Captured,
            (S::Capturing, E::CaptureFailed) => S::Failed,
            (S::Captured, E::RecognitionStarted) => S::Recognizing,
            (S::Recognizing, E::TextRecognized) => S::Completed,
            (S::Recognizing, E::RecognitionFailed) => S::Failed,
            (state, E::Cancel) if !state.is_terminal() => S::Cancelled,
            _ => return None,
        };
        Some(next)
    }
}

/// Current state plus every state visited in this invocation
#[derive(Debug)]
pub struct StateMachine {
    state: WorkflowState,
    history: Vec<WorkflowState>,
}

impl Default for StateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl StateMachine {
    pub fn new() -> Self {
        Self {
            state: WorkflowState::Idle,
            history: vec![WorkflowState::Idle],
        }
    }

    pub fn state(&self) -> WorkflowState {
        self.state
    }

    pub fn history(&self) -> &[WorkflowState] {
        &self.history
    }

    pub fn into_history(self) -> Vec<WorkflowState> {
        self.history
    }

    /// Apply `event`, failing on transitions the workflow does not define
    pub fn advance(&mut self, event: WorkflowEvent) -> Result<WorkflowState, CaptureError> {
        let next = self.state.on(event).ok_or(CaptureError::InvalidTransition {
            from: self.state,
            event,
        })?;

        debug!("Workflow {:?} --{:?}--> {:?}", self.state, event, next);
        self.state = next;
        self.history.push(next);
        Ok(next)
    }
}
