//! Terminal line input
//!
//! Stdin is read on a dedicated thread that forwards whole lines over a
//! channel. The permission prompt and the capture trigger share one
//! [`ConsoleInput`], so each line goes to exactly one reader. A thread blocked
//! on stdin is never awaited, so it cannot hold up shutdown.

use std::io::{BufRead, Write};
use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};
use tracing::{debug, warn};

/// Lines typed on the terminal, shared between readers
#[derive(Clone)]
pub struct ConsoleInput {
    lines: Arc<Mutex<mpsc::UnboundedReceiver<String>>>,
}

impl ConsoleInput {
    /// Read lines from the process stdin
    pub fn stdin() -> std::io::Result<Self> {
        Self::from_reader(std::io::BufReader::new(std::io::stdin()))
    }

    /// Read lines from any buffered reader on a background thread
    pub fn from_reader<R: BufRead + Send + 'static>(reader: R) -> std::io::Result<Self> {
        let (tx, rx) = mpsc::unbounded_channel();

        std::thread::Builder::new()
            .name("console-input".to_string())
            .spawn(move || {
                for line in reader.lines() {
                    match line {
                        Ok(line) => {
                            if tx.send(line).is_err() {
                                break;
                            }
                        }
                        Err(e) => {
                            warn!("Failed to read terminal input: {}", e);
                            break;
                        }
                    }
                }
                debug!("Terminal input closed");
            })?;

        Ok(Self {
            lines: Arc::new(Mutex::new(rx)),
        })
    }

    /// Next line without its terminator, or `None` once input is closed
    pub async fn next_line(&self) -> Option<String> {
        self.lines.lock().await.recv().await
    }
}

/// Print a prompt on stderr without a trailing newline
pub(crate) fn show_prompt(message: &str) {
    let mut stderr = std::io::stderr().lock();
    if let Err(e) = write!(stderr, "{} ", message).and_then(|_| stderr.flush()) {
        debug!("Failed to show prompt: {}", e);
    }
}
