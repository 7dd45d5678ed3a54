use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Invalid top_n: {0} (must be non-negative)")]
    InvalidTopN(i64),

    #[error("Entity not found: {0}")]
    EntityNotFound(String),

    #[error("Entity position out of range: {index} (len {len})")]
    PositionOutOfRange { index: usize, len: usize },

    #[error("Similarity computation cancelled")]
    Cancelled,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Validate a caller-supplied result count.
///
/// Negative counts are a caller bug, not a data condition, so they fail
/// loudly instead of clamping to zero.
pub fn parse_top_n(top_n: i64) -> Result<usize> {
    usize::try_from(top_n).map_err(|_| Error::InvalidTopN(top_n))
}
