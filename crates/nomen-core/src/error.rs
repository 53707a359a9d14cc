//! Core error types.

/// Errors from parsing a name URI.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum NameError {
    #[error("invalid percent-encoding at byte {0}")]
    InvalidPercentEncoding(usize),

    #[error("name URI must start with '/'")]
    MissingLeadingSlash,

    #[error("empty name component")]
    EmptyComponent,
}
