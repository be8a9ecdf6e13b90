// ─── UI Events ───
// Status strings, percentages and toasts pushed to whatever UI hosts the
// pipeline. The pipeline never reads anything back.

use serde::Serialize;
use tracing::info;

/// Payload for the progress window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgressUpdate {
    pub status: String,
    pub percent: u8,
}

impl ProgressUpdate {
    pub fn new(status: impl Into<String>, percent: u8) -> Self {
        Self {
            status: status.into(),
            percent: percent.min(100),
        }
    }
}

/// Receiver for everything the pipeline wants to show the user.
pub trait EventSink: Send + Sync {
    fn progress(&self, _update: ProgressUpdate) {}

    fn progress_close(&self) {}

    fn notify(&self, _message: &str) {}

    /// Rich-presence style activity for a chat companion integration.
    fn presence(&self, _details: &str, _state: &str) {}
}

/// Sink used by the headless binary: everything goes to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingEvents;

impl EventSink for TracingEvents {
    fn progress(&self, update: ProgressUpdate) {
        info!("[{:>3}%] {}", update.percent, update.status);
    }

    fn notify(&self, message: &str) {
        info!("notification: {}", message);
    }

    fn presence(&self, details: &str, state: &str) {
        info!("presence: {} ({})", details, state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_percent_is_capped() {
        assert_eq!(ProgressUpdate::new("Launching...", 150).percent, 100);
        assert_eq!(ProgressUpdate::new("Extracting...", 60).status, "Extracting...");
    }
}
