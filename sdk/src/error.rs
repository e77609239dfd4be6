//! SDK error types.
//!
//! Provides error types for decoding and validation in the SDK.

/// SDK errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SdkError {
    /// Unknown push channel name.
    #[error("unknown channel: {0}")]
    UnknownChannel(String),

    /// Payload was not valid JSON.
    #[error("invalid json: {0}")]
    InvalidJson(String),

    /// Payload was JSON but did not match the expected shape.
    #[error("deserialization error: {0}")]
    Deserialization(String),

    /// Binary frames carry no snapshot data.
    #[error("binary frame ({0} bytes)")]
    BinaryFrame(usize),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SdkError::UnknownChannel("orders".to_string());
        assert_eq!(err.to_string(), "unknown channel: orders");
    }

    #[test]
    fn test_error_binary_frame() {
        let err = SdkError::BinaryFrame(4);
        assert_eq!(err.to_string(), "binary frame (4 bytes)");
    }
}
