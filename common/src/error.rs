use thiserror::Error;

/// Input validation failures.
///
/// These are raised synchronously by the call that received the bad input and
/// never surface in the middle of a running scan.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiscoveryError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("unsupported record type: {0}")]
    UnsupportedRecordType(String),
}

impl DiscoveryError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }
}
