use thiserror::Error;

/// Why a single call to the public embed API failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FailureReason {
    /// The widget token was rejected (HTTP 401).
    #[error("unauthorized")]
    Unauthorized,

    #[error("HTTP {status}: {detail}")]
    Status { status: u16, detail: String },

    #[error("network error: {0}")]
    Transport(String),

    #[error("invalid response: {0}")]
    Decode(String),
}

/// Errors from widget operations.
///
/// None of these are fatal to a widget instance: each one is local to a
/// single submission or poll and the operation can simply be retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WidgetError {
    #[error("token request failed: {0}")]
    TokenIssuance(FailureReason),

    #[error("ask failed: {0}")]
    Ask(FailureReason),

    #[error("update poll failed: {0}")]
    Updates(FailureReason),

    #[error("handoff request failed: {0}")]
    Handoff(FailureReason),

    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl WidgetError {
    /// Whether the server rejected the widget token.
    ///
    /// Token issuance failures are never classified as unauthorized: the
    /// single-retry policy only applies to calls that present a token.
    pub fn is_unauthorized(&self) -> bool {
        matches!(
            self,
            WidgetError::Ask(FailureReason::Unauthorized)
                | WidgetError::Updates(FailureReason::Unauthorized)
                | WidgetError::Handoff(FailureReason::Unauthorized)
        )
    }
}

/// Errors from the durable conversation store.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    #[error("storage io error: {0}")]
    Io(String),

    #[error("storage data corrupt: {0}")]
    Corrupt(String),
}

/// Errors in widget configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required setting '{0}'")]
    Missing(&'static str),

    #[error("setting '{field}' out of range: {value} (expected {min}..={max})")]
    OutOfRange {
        field: &'static str,
        value: i64,
        min: i64,
        max: i64,
    },

    #[error("invalid session id: {0}")]
    InvalidSessionId(String),

    #[error("failed to read config file: {0}")]
    Io(String),

    #[error("failed to parse config file: {0}")]
    Parse(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_widget_error_display() {
        let err = WidgetError::Ask(FailureReason::Status {
            status: 403,
            detail: "Origin not allowed".to_string(),
        });
        assert_eq!(err.to_string(), "ask failed: HTTP 403: Origin not allowed");
    }

    #[test]
    fn test_unauthorized_classification() {
        assert!(WidgetError::Ask(FailureReason::Unauthorized).is_unauthorized());
        assert!(WidgetError::Updates(FailureReason::Unauthorized).is_unauthorized());
        assert!(!WidgetError::TokenIssuance(FailureReason::Unauthorized).is_unauthorized());
        assert!(!WidgetError::Ask(FailureReason::Transport("reset".to_string())).is_unauthorized());
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::OutOfRange {
            field: "top_k",
            value: 0,
            min: 1,
            max: 20,
        };
        assert_eq!(
            err.to_string(),
            "setting 'top_k' out of range: 0 (expected 1..=20)"
        );
    }
}
