//! Error types for the session wire codec.

use std::fmt;

/// Error type for encoding or decoding wire messages. Per the protocol's
/// best-effort semantics these are logged and dropped, never fatal.
#[derive(Debug)]
pub enum WireError {
    /// A message or beacon failed to serialize
    Encode(serde_json::Error),
    /// A received line or datagram failed to parse
    Decode(serde_json::Error),
}

impl fmt::Display for WireError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WireError::Encode(err) => write!(f, "Failed to encode message: {err}"),
            WireError::Decode(err) => write!(f, "Failed to decode message: {err}"),
        }
    }
}

impl std::error::Error for WireError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            WireError::Encode(err) | WireError::Decode(err) => Some(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_error_display() {
        let inner = serde_json::from_str::<u32>("not json").unwrap_err();
        let err = WireError::Decode(inner);
        assert!(err.to_string().contains("decode"));
    }
}
