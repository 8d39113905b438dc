//! Structured session logging utilities.

use tracing::{error, info, warn, Span};

/// Session logger with consistent contextual fields.
///
/// Tags every line with the session id and mode ("live" or "batch") so
/// interleaved sessions stay distinguishable.
#[derive(Debug, Clone)]
pub struct SessionLogger {
    session_id: String,
    mode: String,
}

impl SessionLogger {
    /// Create a logger for a session.
    pub fn new(session_id: impl Into<String>, mode: &str) -> Self {
        Self {
            session_id: session_id.into(),
            mode: mode.to_string(),
        }
    }

    /// Log session start.
    pub fn log_start(&self, message: &str) {
        info!(
            session_id = %self.session_id,
            mode = %self.mode,
            "Session started: {}", message
        );
    }

    /// Log a progress update.
    pub fn log_progress(&self, message: &str) {
        info!(
            session_id = %self.session_id,
            mode = %self.mode,
            "Session progress: {}", message
        );
    }

    /// Log a recoverable problem.
    pub fn log_warning(&self, message: &str) {
        warn!(
            session_id = %self.session_id,
            mode = %self.mode,
            "Session warning: {}", message
        );
    }

    /// Log a fatal problem.
    pub fn log_error(&self, message: &str) {
        error!(
            session_id = %self.session_id,
            mode = %self.mode,
            "Session error: {}", message
        );
    }

    /// Log session completion.
    pub fn log_completion(&self, message: &str) {
        info!(
            session_id = %self.session_id,
            mode = %self.mode,
            "Session completed: {}", message
        );
    }

    /// Get the session id.
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Create a tracing span for this session.
    pub fn create_span(&self) -> Span {
        tracing::info_span!(
            "session",
            session_id = %self.session_id,
            mode = %self.mode
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logger_fields() {
        let logger = SessionLogger::new("abc-123", "live");
        assert_eq!(logger.session_id(), "abc-123");
    }
}
