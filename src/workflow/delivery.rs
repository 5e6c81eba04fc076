//! Result delivery and user notices
//!
//! A delivery target receives the recognized text exactly once. Targets are
//! consumed by [`ResultDelivery::deliver`], so a second delivery cannot be
//! written.

use std::io::Write;

use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;
use tracing::warn;

/// Payload handed back to the caller of the capture workflow
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureResultPayload {
    pub recognized_text: String,
}

/// Receives the workflow's single successful result
pub trait ResultDelivery: Send {
    fn deliver(self, payload: CaptureResultPayload);
}

/// Delivers over a oneshot channel to an in-process caller
pub struct ChannelDelivery(oneshot::Sender<CaptureResultPayload>);

impl ChannelDelivery {
    /// A delivery target and the receiver the caller awaits.
    ///
    /// The receiver resolves to an error if the workflow ends without
    /// delivering.
    pub fn channel() -> (Self, oneshot::Receiver<CaptureResultPayload>) {
        let (tx, rx) = oneshot::channel();
        (Self(tx), rx)
    }
}

impl ResultDelivery for ChannelDelivery {
    fn deliver(self, payload: CaptureResultPayload) {
        if self.0.send(payload).is_err() {
            warn!("Capture result dropped: caller is gone");
        }
    }
}

/// Prints the payload as a JSON line on stdout
pub struct JsonStdoutDelivery;

impl ResultDelivery for JsonStdoutDelivery {
    fn deliver(self, payload: CaptureResultPayload) {
        let written = serde_json::to_string(&payload)
            .map_err(std::io::Error::from)
            .and_then(|json| writeln!(std::io::stdout().lock(), "{}", json));
        if let Err(e) = written {
            warn!("Failed to write capture result: {}", e);
        }
    }
}

/// Short user-visible messages
pub trait UserNotifier: Send + Sync {
    fn notify(&self, message: &str);
}

/// Writes notices to stderr
pub struct ConsoleNotifier;

impl UserNotifier for ConsoleNotifier {
    fn notify(&self, message: &str) {
        eprintln!("{}", message);
    }
}
