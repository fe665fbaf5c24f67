use std::fmt::{self, Display};

use log::debug;

use crate::consts::{
    BAM_LEVEL_OFFSETS, BAM_MAX_POSITION, BAM_SHIFT_FIRST, BAM_SHIFT_NEXT, ROOT_BIN,
    STANDARD_LEVEL_OFFSETS, STANDARD_MAX_POSITION, STANDARD_SHIFT_FIRST, STANDARD_SHIFT_NEXT,
};
use crate::errors::{BinningError, Result};
use crate::ranges::LevelRanges;

/// Largest cumulative shift allowed, keeps every bin boundary inside an `i64`.
const MAX_SHIFT: u32 = 62;

/// A hierarchical interval binning scheme.
///
/// The scheme splits the positions `0..=max_position` into levels of equally sized bins. The
/// finest level uses bins of `2^shift_first` positions, and every level above merges
/// `2^shift_next` neighbouring bins into one, up to the root level which is a single bin
/// covering everything. Bins are numbered level by level, starting at the level offset.
///
/// Finer levels always carry larger bin numbers than coarser levels, which is checked in
/// [`BinningScheme::new`]. [`BinningScheme::containing`] and [`BinningScheme::contained`]
/// compare raw bin numbers and are only correct under that ordering.
///
/// The scheme is immutable, so it can be shared between threads without any locking.
///
/// # Examples
///
/// ```
/// use gtars_binning::BinningScheme;
///
/// let scheme = BinningScheme::standard();
///
/// assert_eq!(scheme.assign(74012, 173034).unwrap(), 73);
/// assert_eq!(scheme.covered(73).unwrap(), (0, 1 << 20));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinningScheme {
    /// Largest position that can be binned
    max_position: i64,
    /// Largest valid bin number
    max_bin: i64,
    /// First bin number per level, finest level first
    level_offsets: Vec<i64>,
    /// Shift to get from a position to its bin on the finest level
    shift_first: u32,
    /// Shift to get from a bin to its parent bin on the next level
    shift_next: u32,
}

impl BinningScheme {
    /// Create a new binning scheme.
    ///
    /// # Arguments
    /// * `max_position` - the largest position that can be binned
    /// * `level_offsets` - the first bin number of every level, starting with the finest level
    ///   and ending with the root level at `0`
    /// * `shift_first` - how much to shift a position to get its bin on the finest level
    /// * `shift_next` - how much to shift a bin to get its parent on the next level
    ///
    /// # Errors
    /// Returns [`BinningError::InvalidScheme`] when the offsets are empty, not strictly
    /// decreasing, do not end in `0`, when levels would share bin numbers, or when the single
    /// root bin does not span exactly `0..=max_position`. The last rule keeps every bin
    /// boundary inside the scheme, so `max_position + 1` must be `2^(shift_first + shift_next *
    /// (levels - 1))`.
    ///
    /// ```
    /// use gtars_binning::BinningScheme;
    ///
    /// let scheme = BinningScheme::new((1 << 29) - 1, vec![585, 73, 9, 1, 0], 17, 3).unwrap();
    /// assert_eq!(scheme, BinningScheme::standard());
    ///
    /// assert!(BinningScheme::new((1 << 29) - 1, vec![585, 9, 73, 1, 0], 17, 3).is_err());
    /// ```
    pub fn new(
        max_position: i64,
        level_offsets: Vec<i64>,
        shift_first: u32,
        shift_next: u32,
    ) -> Result<Self> {
        if level_offsets.is_empty() {
            return Err(invalid("at least one level is required"));
        }
        if shift_first == 0 || shift_next == 0 {
            return Err(invalid(format!(
                "shifts must be positive (shift_first={shift_first}, shift_next={shift_next})"
            )));
        }
        if max_position < 0 {
            return Err(invalid(format!(
                "maximum position must not be negative: {max_position}"
            )));
        }

        let root_shift = cumulative_shift(shift_first, shift_next, level_offsets.len() - 1)
            .ok_or_else(|| {
                invalid(format!(
                    "{} levels with shift_first={shift_first} and shift_next={shift_next} exceed a shift of {MAX_SHIFT}",
                    level_offsets.len()
                ))
            })?;

        if let Some(pair) = level_offsets.windows(2).find(|pair| pair[0] <= pair[1]) {
            return Err(invalid(format!(
                "level offsets must be strictly decreasing, found {} followed by {}",
                pair[0], pair[1]
            )));
        }
        if let Some(&last) = level_offsets.last().filter(|&&last| last != ROOT_BIN) {
            return Err(invalid(format!(
                "the last level offset must be {ROOT_BIN}, found {last}"
            )));
        }
        // the root bin spans every position and ends right after the maximum position
        if max_position + 1 != 1i64 << root_shift {
            return Err(invalid(format!(
                "the root level covers positions 0-{} but the maximum position is {max_position}",
                (1i64 << root_shift) - 1
            )));
        }

        // every bin of a level must sort above all bins of the coarser level after it
        for level in 1..level_offsets.len() {
            let shift = shift_first + shift_next * level as u32;
            let last_bin = level_offsets[level].checked_add(max_position >> shift);
            if last_bin.is_none_or(|last_bin| last_bin >= level_offsets[level - 1]) {
                return Err(invalid(format!(
                    "bins of level {level} overlap with the offset {} of level {}",
                    level_offsets[level - 1],
                    level - 1
                )));
            }
        }

        let max_bin = level_offsets[0]
            .checked_add(max_position >> shift_first)
            .ok_or_else(|| invalid("largest bin number does not fit in 64 bits"))?;

        let scheme = BinningScheme {
            max_position,
            max_bin,
            level_offsets,
            shift_first,
            shift_next,
        };
        debug!("Created binning scheme: {scheme}");

        Ok(scheme)
    }

    /// The standard binning scheme used by the UCSC Genome Browser, covering positions
    /// `0..=2^29 - 1` with five levels.
    ///
    /// See <http://genomewiki.ucsc.edu/index.php/Bin_indexing_system>
    pub fn standard() -> Self {
        Self::from_trusted(
            STANDARD_MAX_POSITION,
            STANDARD_LEVEL_OFFSETS.to_vec(),
            STANDARD_SHIFT_FIRST,
            STANDARD_SHIFT_NEXT,
        )
    }

    /// The six level binning scheme used by BAI indexes in the SAM/BAM format, covering
    /// positions `0..=2^29 - 1` with 16kb bins on the finest level.
    pub fn bam() -> Self {
        Self::from_trusted(
            BAM_MAX_POSITION,
            BAM_LEVEL_OFFSETS.to_vec(),
            BAM_SHIFT_FIRST,
            BAM_SHIFT_NEXT,
        )
    }

    /// Create a scheme with `levels` levels where every level holds exactly
    /// `2^(shift_next * depth)` bins, `depth` counting from the root.
    ///
    /// The offset of a level is the number of bins on all coarser levels. This is how the
    /// standard and BAM offsets are derived, and generalizes to the CSI index layout. As with
    /// [`BinningScheme::new`], `max_position + 1` must equal the size of the root bin.
    ///
    /// ```
    /// use gtars_binning::BinningScheme;
    ///
    /// let scheme = BinningScheme::geometric((1 << 29) - 1, 17, 3, 5).unwrap();
    /// assert_eq!(scheme.level_offsets(), &[585, 73, 9, 1, 0]);
    /// ```
    pub fn geometric(
        max_position: i64,
        shift_first: u32,
        shift_next: u32,
        levels: usize,
    ) -> Result<Self> {
        if levels == 0 {
            return Err(invalid("at least one level is required"));
        }
        if shift_first == 0 || shift_next == 0 {
            return Err(invalid(format!(
                "shifts must be positive (shift_first={shift_first}, shift_next={shift_next})"
            )));
        }
        if cumulative_shift(shift_first, shift_next, levels - 1).is_none() {
            return Err(invalid(format!(
                "{levels} levels with shift_first={shift_first} and shift_next={shift_next} exceed a shift of {MAX_SHIFT}"
            )));
        }

        let mut level_offsets = Vec::with_capacity(levels);
        let mut offset = 0i64;
        for depth in 0..levels as u32 {
            level_offsets.push(offset);
            offset += 1i64 << (shift_next * depth);
        }
        level_offsets.reverse();

        Self::new(max_position, level_offsets, shift_first, shift_next)
    }

    /// Build a scheme from constants known to be valid.
    fn from_trusted(
        max_position: i64,
        level_offsets: Vec<i64>,
        shift_first: u32,
        shift_next: u32,
    ) -> Self {
        BinningScheme {
            max_position,
            max_bin: level_offsets[0] + (max_position >> shift_first),
            level_offsets,
            shift_first,
            shift_next,
        }
    }

    /// The largest position that can be binned. Intervals may end at `max_position + 1`.
    pub fn max_position(&self) -> i64 {
        self.max_position
    }

    /// The largest valid bin number.
    pub fn max_bin(&self) -> i64 {
        self.max_bin
    }

    /// The first bin number of every level, finest level first.
    pub fn level_offsets(&self) -> &[i64] {
        &self.level_offsets
    }

    pub fn shift_first(&self) -> u32 {
        self.shift_first
    }

    pub fn shift_next(&self) -> u32 {
        self.shift_next
    }

    /// Number of levels in the hierarchy, including the root level.
    pub fn levels(&self) -> usize {
        self.level_offsets.len()
    }

    /// Number of positions covered by a single bin on `level`, where level `0` is the finest.
    pub fn bin_size(&self, level: usize) -> Option<i64> {
        (level < self.levels()).then(|| 1i64 << self.level_shift(level))
    }

    /// Get the level of `bin`, where level `0` holds the smallest bins.
    ///
    /// # Errors
    /// Returns [`BinningError::InvalidBin`] when the bin number is not part of this scheme.
    pub fn level(&self, bin: i64) -> Result<usize> {
        let invalid_bin = BinningError::InvalidBin {
            bin,
            max_bin: self.max_bin,
        };
        if bin < 0 || bin > self.max_bin {
            return Err(invalid_bin);
        }

        // offsets strictly decrease, so the first one not above the bin is its own level
        let level = self
            .level_offsets
            .iter()
            .position(|&offset| offset <= bin)
            .ok_or_else(|| invalid_bin.clone())?;

        // bins between the last bin of a level and the offset of the next finer level
        if bin - self.level_offsets[level] > self.max_position >> self.level_shift(level) {
            return Err(invalid_bin);
        }

        Ok(level)
    }

    /// Iterate over the first and last bin overlapping the interval `start..stop` on every
    /// level, starting with the smallest bins.
    ///
    /// An empty or inverted interval (`stop <= start`) is treated as the single position
    /// `start..start + 1`.
    ///
    /// # Errors
    /// Returns [`BinningError::OutOfRange`] when the interval is not within
    /// `0..=max_position + 1`, or when an empty or inverted interval starts past
    /// `max_position`, since its single position would lie outside the scheme.
    pub fn ranges(&self, start: i64, stop: i64) -> Result<LevelRanges<'_>> {
        if start < 0 || stop > self.max_position + 1 || start > self.max_position {
            return Err(BinningError::OutOfRange {
                start,
                stop,
                max_position: self.max_position,
            });
        }
        let stop = if stop <= start { start + 1 } else { stop };

        Ok(LevelRanges::new(
            &self.level_offsets,
            self.shift_first,
            self.shift_next,
            start,
            stop,
        ))
    }

    /// Get the smallest bin fitting the interval `start..stop`.
    ///
    /// An empty or inverted interval (`stop <= start`) is treated as the single position
    /// `start..start + 1`. Such an interval starting past `max_position` is out of range, see
    /// [`BinningScheme::ranges`].
    ///
    /// ```
    /// use gtars_binning::BinningScheme;
    ///
    /// let scheme = BinningScheme::standard();
    /// assert_eq!(scheme.assign(0, 1).unwrap(), 585);
    /// assert_eq!(scheme.assign(0, 1 << 29).unwrap(), 0);
    /// assert!(scheme.assign(-1, 0).is_err());
    /// assert!(scheme.assign(1 << 29, 1 << 29).is_err());
    /// ```
    pub fn assign(&self, start: i64, stop: i64) -> Result<i64> {
        let bin = self
            .ranges(start, stop)?
            .find(|(first, last)| first == last)
            .map(|(bin, _)| bin)
            // the root level always is a single bin
            .unwrap_or(ROOT_BIN);

        Ok(bin)
    }

    /// Get the bins of all intervals overlapping the interval `start..stop` by at least one
    /// position.
    ///
    /// Bins are ordered by level, smallest bins first, and ascending within a level.
    ///
    /// ```
    /// use gtars_binning::BinningScheme;
    ///
    /// let scheme = BinningScheme::standard();
    /// let bins = scheme.overlapping(73192, 78018).unwrap();
    /// assert_eq!(bins, vec![585, 73, 9, 1, 0]);
    /// ```
    pub fn overlapping(&self, start: i64, stop: i64) -> Result<Vec<i64>> {
        let bins = self
            .ranges(start, stop)?
            .flat_map(|(first, last)| first..=last)
            .collect();

        Ok(bins)
    }

    /// Get the bins of all intervals completely containing the interval `start..stop`.
    ///
    /// These are the bin assigned to the interval and all of its ancestors. Bins on finer
    /// levels than the assigned bin always have larger numbers, so dropping every
    /// overlapping bin above the assigned one leaves exactly this set.
    pub fn containing(&self, start: i64, stop: i64) -> Result<Vec<i64>> {
        let max_bin = self.assign(start, stop)?;
        let mut bins = self.overlapping(start, stop)?;
        bins.retain(|&bin| bin <= max_bin);

        Ok(bins)
    }

    /// Get the bins of all intervals completely contained by the interval `start..stop`.
    ///
    /// These are the bin assigned to the interval and all overlapping bins on finer levels.
    pub fn contained(&self, start: i64, stop: i64) -> Result<Vec<i64>> {
        let min_bin = self.assign(start, stop)?;
        let mut bins = self.overlapping(start, stop)?;
        bins.retain(|&bin| bin >= min_bin);

        Ok(bins)
    }

    /// Get the interval `start..stop` covered by `bin`.
    ///
    /// ```
    /// use gtars_binning::BinningScheme;
    ///
    /// let scheme = BinningScheme::standard();
    /// assert_eq!(scheme.covered(585).unwrap(), (0, 1 << 17));
    /// assert_eq!(scheme.covered(0).unwrap(), (0, 1 << 29));
    /// assert!(scheme.covered(4681).is_err());
    /// ```
    pub fn covered(&self, bin: i64) -> Result<(i64, i64)> {
        let level = self.level(bin)?;
        let offset = self.level_offsets[level];
        let shift = self.level_shift(level);

        Ok(((bin - offset) << shift, (bin + 1 - offset) << shift))
    }

    /// Assign bins to many intervals in parallel, keeping the input order.
    ///
    /// Fails as a whole if any of the intervals is out of range.
    #[cfg(feature = "parallel")]
    pub fn assign_all(&self, intervals: &[(i64, i64)]) -> Result<Vec<i64>> {
        use rayon::prelude::*;

        intervals
            .par_iter()
            .map(|&(start, stop)| self.assign(start, stop))
            .collect()
    }

    /// Shift from a position to its bin on `level`.
    fn level_shift(&self, level: usize) -> u32 {
        self.shift_first + self.shift_next * level as u32
    }
}

impl Default for BinningScheme {
    fn default() -> Self {
        Self::standard()
    }
}

impl Display for BinningScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} levels over positions 0-{} (shift_first={}, shift_next={}, bins 0-{})",
            self.levels(),
            self.max_position,
            self.shift_first,
            self.shift_next,
            self.max_bin
        )
    }
}

/// Shift from a position to its bin on `level`, or `None` when it grows past [`MAX_SHIFT`].
fn cumulative_shift(shift_first: u32, shift_next: u32, level: usize) -> Option<u32> {
    u32::try_from(level)
        .ok()
        .and_then(|level| shift_next.checked_mul(level))
        .and_then(|shift| shift.checked_add(shift_first))
        .filter(|&shift| shift <= MAX_SHIFT)
}

fn invalid(message: impl Into<String>) -> BinningError {
    BinningError::InvalidScheme(message.into())
}
