//! Destinations for user-facing progress messages.

/// Receives the progress lines of a run.
pub trait ProgressSink {
    fn report(&mut self, message: &str);
}

/// Prints progress to stderr.
#[derive(Debug, Default, Clone, Copy)]
pub struct StderrSink;

impl ProgressSink for StderrSink {
    fn report(&mut self, message: &str) {
        eprintln!("mockgen: {message}");
    }
}

/// Discards progress (`--quiet`).
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentSink;

impl ProgressSink for SilentSink {
    fn report(&mut self, _message: &str) {}
}

/// Keeps every message, in order.
#[derive(Debug, Default, Clone)]
pub struct CollectingSink {
    pub messages: Vec<String>,
}

impl ProgressSink for CollectingSink {
    fn report(&mut self, message: &str) {
        self.messages.push(message.to_string());
    }
}
