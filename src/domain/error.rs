//! Domain error types.

/// Top-level error type for stratbench.
#[derive(Debug, thiserror::Error)]
pub enum StratbenchError {
    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid parameter {key}: {reason}")]
    InvalidParameter { key: String, reason: String },

    #[error("invalid price series: {reason}")]
    InvalidSeries { reason: String },

    #[error("signal sequence does not match price series: {reason}")]
    SignalMismatch { reason: String },

    #[error("data error: {reason}")]
    Data { reason: String },

    #[error("insufficient data: have {bars} bars, need {minimum}")]
    InsufficientData { bars: usize, minimum: usize },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl StratbenchError {
    /// Shorthand for building an [`StratbenchError::InvalidParameter`].
    pub fn invalid(key: &str, reason: impl Into<String>) -> Self {
        StratbenchError::InvalidParameter {
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<&StratbenchError> for std::process::ExitCode {
    fn from(err: &StratbenchError) -> Self {
        let code: u8 = match err {
            StratbenchError::Io(_) => 1,
            StratbenchError::ConfigParse { .. } | StratbenchError::ConfigMissing { .. } => 2,
            StratbenchError::InvalidSeries { .. }
            | StratbenchError::Data { .. }
            | StratbenchError::SignalMismatch { .. } => 3,
            StratbenchError::InvalidParameter { .. } => 4,
            StratbenchError::InsufficientData { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}

pub type Result<T> = std::result::Result<T, StratbenchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_parameter_message() {
        let err = StratbenchError::invalid("fee_bps", "must be >= 0");
        assert_eq!(
            err.to_string(),
            "invalid parameter fee_bps: must be >= 0"
        );
    }

    #[test]
    fn insufficient_data_message() {
        let err = StratbenchError::InsufficientData {
            bars: 10,
            minimum: 30,
        };
        assert_eq!(err.to_string(), "insufficient data: have 10 bars, need 30");
    }

    #[test]
    fn io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: StratbenchError = io.into();
        assert!(matches!(err, StratbenchError::Io(_)));
    }
}
