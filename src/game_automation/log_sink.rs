//! User-facing log sink handed to every core component at construction.

use std::sync::Arc;

/// Receives the human-readable messages produced by the matching core
pub trait LogSink: Send + Sync {
    fn log(&self, message: &str);
}

impl<F> LogSink for F
where
    F: Fn(&str) + Send + Sync,
{
    fn log(&self, message: &str) {
        self(message)
    }
}

pub type SharedLogSink = Arc<dyn LogSink>;

/// Forwards messages to the `log` facade at info level
#[derive(Debug, Clone)]
pub struct LogCrateSink {
    target: &'static str,
}

impl LogCrateSink {
    pub fn new(target: &'static str) -> Self {
        Self { target }
    }

    pub fn shared(target: &'static str) -> SharedLogSink {
        Arc::new(Self::new(target))
    }
}

impl Default for LogCrateSink {
    fn default() -> Self {
        Self::new("game_automation")
    }
}

impl LogSink for LogCrateSink {
    fn log(&self, message: &str) {
        log::info!(target: self.target, "{}", message);
    }
}
