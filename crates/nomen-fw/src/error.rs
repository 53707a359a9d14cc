//! Forwarding-core error types.

use nomen_core::FaceId;

/// Errors from strategy instantiation. These are operator-visible
/// misconfigurations and fail construction.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum StrategyError {
    #[error("strategy does not accept parameters")]
    ParametersNotAccepted,

    #[error("unsupported strategy version {0}")]
    UnsupportedVersion(u64),

    #[error("strategy version is not a decimal number")]
    MalformedVersion,

    #[error("unknown strategy: {0}")]
    Unknown(String),
}

/// Errors from face registration.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum FaceTableError {
    #[error("face id {0} is reserved")]
    ReservedId(FaceId),

    #[error("face id {0} already registered")]
    DuplicateId(FaceId),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            StrategyError::Unknown("/x".to_string()).to_string(),
            "unknown strategy: /x"
        );
        assert_eq!(
            FaceTableError::ReservedId(FaceId(254)).to_string(),
            "face id 254 is reserved"
        );
    }
}
