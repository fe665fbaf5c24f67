use thiserror::Error;

/// Errors produced while building a [`BinningScheme`](crate::BinningScheme) or querying it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BinningError {
    /// The scheme parameters do not describe a consistent bin hierarchy.
    #[error("Invalid binning scheme: {0}")]
    InvalidScheme(String),

    /// The query interval falls outside of the positions covered by the scheme.
    #[error("interval out of range: {start}-{stop} (maximum position is {max_position})")]
    OutOfRange {
        start: i64,
        stop: i64,
        max_position: i64,
    },

    /// The bin number does not exist in the scheme.
    #[error("not a valid bin number: {bin} (must be >= 0 and <= {max_bin})")]
    InvalidBin { bin: i64, max_bin: i64 },
}

pub type Result<T> = std::result::Result<T, BinningError>;
