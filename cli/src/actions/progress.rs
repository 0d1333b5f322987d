//! Progress reporting for long-running actions.

use std::io::{self, IsTerminal, Write};

use tracing::info;

/// Receives operator-visible progress from an action.
pub trait ProgressSink: Send + Sync {
    /// Persistent progress line.
    fn save_progress(&self, message: &str);

    /// Transient progress; replaced by the next message.
    fn send_progress(&self, message: &str);
}

/// Writes progress to stderr so stdout stays reserved for the action result.
pub struct ConsoleProgress;

impl ProgressSink for ConsoleProgress {
    fn save_progress(&self, message: &str) {
        info!(target: "progress", "{message}");
        eprintln!("{message}");
    }

    fn send_progress(&self, message: &str) {
        let mut stderr = io::stderr().lock();
        let frame = transient_frame(message, stderr.is_terminal());
        if frame.is_empty() {
            return;
        }
        // Ignore write errors on a closed stderr.
        let _ = stderr.write_all(frame.as_bytes());
        let _ = stderr.flush();
    }
}

/// Bytes for one transient message. A terminal gets the line rewritten in
/// place; anything else gets plain lines and no control sequences.
fn transient_frame(message: &str, terminal: bool) -> String {
    if terminal {
        format!("\r\x1b[2K{message}")
    } else if message.is_empty() {
        String::new()
    } else {
        format!("{message}\n")
    }
}
