//! Session error types.

use thiserror::Error;

pub type SessionResult<T> = Result<T, SessionError>;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Device error: {0}")]
    Device(#[from] vcap_media::MediaError),

    #[error("Model call failed: {0}")]
    ModelCall(#[from] vcap_ml_client::MlError),

    #[error("Summary log write failed: {0}")]
    SummaryLog(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SessionError {
    pub fn summary_log(msg: impl Into<String>) -> Self {
        Self::SummaryLog(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Fatal errors terminate the session; everything else degrades to a
    /// neutral result and the loop continues.
    pub fn is_fatal(&self) -> bool {
        matches!(self, SessionError::Device(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_device_errors_are_fatal() {
        let device = SessionError::Device(vcap_media::MediaError::EndOfStream);
        assert!(device.is_fatal());

        let model =
            SessionError::ModelCall(vcap_ml_client::MlError::request_failed("timed out"));
        assert!(!model.is_fatal());
    }
}
