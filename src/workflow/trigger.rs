//! User capture requests
//!
//! The workflow waits in `Ready` until its trigger fires. A trigger that can
//! never fire (its button was dropped, stdin closed) reports `false` and the
//! workflow is abandoned.

use async_trait::async_trait;
use tokio::sync::oneshot;
use tracing::warn;

use super::console::{show_prompt, ConsoleInput};

#[async_trait]
pub trait CaptureTrigger: Send {
    /// Resolves `true` when the user asks for a capture, `false` if they
    /// never will
    async fn requested(&mut self) -> bool;
}

/// Fires as soon as the camera is ready
pub struct ImmediateTrigger;

#[async_trait]
impl CaptureTrigger for ImmediateTrigger {
    async fn requested(&mut self) -> bool {
        true
    }
}

/// Pressing the [`CaptureButton`] fires the paired [`ButtonTrigger`]
pub struct CaptureButton(oneshot::Sender<()>);

impl CaptureButton {
    pub fn press(self) {
        let _ = self.0.send(());
    }
}

pub struct ButtonTrigger(oneshot::Receiver<()>);

/// A capture button and the trigger it fires
pub fn capture_button() -> (CaptureButton, ButtonTrigger) {
    let (tx, rx) = oneshot::channel();
    (CaptureButton(tx), ButtonTrigger(rx))
}

#[async_trait]
impl CaptureTrigger for ButtonTrigger {
    async fn requested(&mut self) -> bool {
        (&mut self.0).await.is_ok()
    }
}

/// Waits for Enter on the terminal
pub struct EnterKeyTrigger {
    input: ConsoleInput,
}

impl EnterKeyTrigger {
    pub fn new(input: ConsoleInput) -> Self {
        Self { input }
    }
}

#[async_trait]
impl CaptureTrigger for EnterKeyTrigger {
    async fn requested(&mut self) -> bool {
        show_prompt("Camera ready. Press Enter to capture...");
        let requested = self.input.next_line().await.is_some();
        if !requested {
            warn!("Terminal input closed before a capture was requested");
        }
        requested
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_button_press_fires() {
        let (button, mut trigger) = capture_button();
        button.press();
        assert!(trigger.requested().await);
    }

    #[tokio::test]
    async fn test_dropped_button_never_fires() {
        let (button, mut trigger) = capture_button();
        drop(button);
        assert!(!trigger.requested().await);
    }

    #[tokio::test]
    async fn test_enter_key_fires_on_any_line() {
        let input = ConsoleInput::from_reader(std::io::Cursor::new(b"\n".to_vec())).unwrap();
        let mut trigger = EnterKeyTrigger::new(input);

        assert!(trigger.requested().await);
        assert!(!trigger.requested().await);
    }

    #[tokio::test]
    async fn test_immediate_trigger() {
        assert!(ImmediateTrigger.requested().await);
    }
}
