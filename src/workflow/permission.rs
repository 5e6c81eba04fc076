//! Camera permission gate
//!
//! Permission is never persisted: it is checked on every workflow entry and,
//! when missing, requested through a [`PermissionPrompt`].

use async_trait::async_trait;
use tracing::{info, warn};

use super::console::{show_prompt, ConsoleInput};
use crate::config::PermissionPolicy;

/// Whether the camera may be used right now
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionState {
    Granted,
    NotGranted,
}

/// Result of [`ensure_camera_permission`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionOutcome {
    Granted,
    /// `requires_user_prompt` is true when the user declined a prompt, false
    /// when the provider refused without being able to ask.
    Denied { requires_user_prompt: bool },
}

/// Source of camera permission
#[async_trait]
pub trait PermissionPrompt: Send + Sync {
    /// Current permission state, without prompting
    fn check(&self) -> PermissionState;

    /// Whether [`request`](Self::request) can actually ask the user
    fn can_prompt(&self) -> bool {
        true
    }

    /// Ask the user; suspends until they answer
    async fn request(&self) -> PermissionState;
}

/// Check the camera permission and prompt for it when missing
pub async fn ensure_camera_permission(prompt: &dyn PermissionPrompt) -> PermissionOutcome {
    if prompt.check() == PermissionState::Granted {
        return PermissionOutcome::Granted;
    }

    if !prompt.can_prompt() {
        warn!("Camera permission not granted and cannot be requested");
        return PermissionOutcome::Denied {
            requires_user_prompt: false,
        };
    }

    info!("Requesting camera permission");
    match prompt.request().await {
        PermissionState::Granted => PermissionOutcome::Granted,
        PermissionState::NotGranted => PermissionOutcome::Denied {
            requires_user_prompt: true,
        },
    }
}

/// Fixed permission answer with no prompt
pub struct StaticPermission(pub PermissionState);

#[async_trait]
impl PermissionPrompt for StaticPermission {
    fn check(&self) -> PermissionState {
        self.0
    }

    fn can_prompt(&self) -> bool {
        false
    }

    async fn request(&self) -> PermissionState {
        self.0
    }
}

/// Asks for permission on the terminal
pub struct ConsolePrompt {
    input: ConsoleInput,
}

impl ConsolePrompt {
    pub fn new(input: ConsoleInput) -> Self {
        Self { input }
    }
}

#[async_trait]
impl PermissionPrompt for ConsolePrompt {
    fn check(&self) -> PermissionState {
        PermissionState::NotGranted
    }

    async fn request(&self) -> PermissionState {
        show_prompt("Allow access to the camera? [y/N]");

        match self.input.next_line().await {
            Some(answer) => parse_answer(&answer),
            None => {
                warn!("Terminal input closed before the permission answer");
                PermissionState::NotGranted
            }
        }
    }
}

fn parse_answer(answer: &str) -> PermissionState {
    match answer.trim().to_ascii_lowercase().as_str() {
        "y" | "yes" => PermissionState::Granted,
        _ => PermissionState::NotGranted,
    }
}

/// Build the permission source for a configured policy. Only the `prompt`
/// policy reads from `input`.
pub fn prompt_for_policy(policy: PermissionPolicy, input: &ConsoleInput) -> Box<dyn PermissionPrompt> {
    match policy {
        PermissionPolicy::Prompt => Box::new(ConsolePrompt::new(input.clone())),
        PermissionPolicy::Grant => Box::new(StaticPermission(PermissionState::Granted)),
        PermissionPolicy::Deny => Box::new(StaticPermission(PermissionState::NotGranted)),
    }
}
