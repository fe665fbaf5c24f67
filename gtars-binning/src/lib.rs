//! Hierarchical interval binning for genomic interval indexing in Rust.
//!
//! This crate implements the interval binning scheme used by the UCSC Genome Browser
//! (<https://genome.cshlp.org/content/12/6/996.full>). It is part of the
//! [gtars](https://github.com/databio/gtars) project, which provides tools for working with
//! genomic interval data in Rust, Python, and R.
//!
//! Every interval is assigned a single integer bin. Storing that bin next to the interval lets a
//! database answer overlap queries with plain integer comparisons, essentially mimicking an
//! R-tree index: only intervals in one of the bins returned by
//! [`BinningScheme::overlapping`] can overlap the query.
//!
//! All positions and ranges are zero-based and half-open. The largest position supported by the
//! standard scheme is `2^29 - 1`, which covers the longest human chromosome.
//!
//! ## Features
//!
//! - **Constant time assignment**: the smallest bin fitting an interval is found by shifting
//! - **Overlap and containment queries**: get the bins that can hold intervals overlapping,
//!   containing, or contained by a query
//! - **Custom schemes**: any number of levels and bin sizes, loaded from TOML with the `config`
//!   feature
//!
//! ## Quick Start
//!
//! ```rust
//! use gtars_binning::BinningScheme;
//!
//! // use the standard UCSC binning scheme
//! let scheme = BinningScheme::standard();
//!
//! // the bin to store with an interval
//! let bin = scheme.assign(74012, 173034).unwrap();
//! assert_eq!(bin, 73);
//!
//! // the bins to look in for intervals overlapping a query
//! let bins = scheme.overlapping(73192, 78018).unwrap();
//! assert_eq!(bins, vec![585, 73, 9, 1, 0]);
//!
//! // the interval covered by a bin
//! assert_eq!(scheme.covered(585).unwrap(), (0, 131072));
//! ```

/// Scheme configuration files.
///
/// See [`SchemeConfig`] for details.
#[cfg(feature = "config")]
pub mod config;

/// Error types.
pub mod errors;

/// Per-level bin ranges.
///
/// See [`LevelRanges`] for details.
pub mod ranges;

/// The binning scheme itself.
///
/// See [`BinningScheme`] for details.
pub mod scheme;

// re-exports
#[cfg(feature = "config")]
pub use self::config::{SchemeConfig, SchemeConfigError, SchemePreset};
pub use self::errors::{BinningError, Result};
pub use self::ranges::LevelRanges;
pub use self::scheme::BinningScheme;

/// Constants used throughout the crate.
pub mod consts {
    /// The single bin of the root level, covering every position.
    pub const ROOT_BIN: i64 = 0;

    /// Largest position of the standard UCSC scheme.
    pub const STANDARD_MAX_POSITION: i64 = (1 << 29) - 1;
    /// First bin per level of the standard UCSC scheme, smallest bins first.
    pub const STANDARD_LEVEL_OFFSETS: [i64; 5] = [512 + 64 + 8 + 1, 64 + 8 + 1, 8 + 1, 1, 0];
    pub const STANDARD_SHIFT_FIRST: u32 = 17;
    pub const STANDARD_SHIFT_NEXT: u32 = 3;

    /// Largest position of the BAI scheme.
    pub const BAM_MAX_POSITION: i64 = (1 << 29) - 1;
    /// First bin per level of the BAI scheme, smallest bins first.
    pub const BAM_LEVEL_OFFSETS: [i64; 6] = [
        4096 + 512 + 64 + 8 + 1,
        512 + 64 + 8 + 1,
        64 + 8 + 1,
        8 + 1,
        1,
        0,
    ];
    pub const BAM_SHIFT_FIRST: u32 = 14;
    pub const BAM_SHIFT_NEXT: u32 = 3;
}
