use std::iter::FusedIterator;

/// An iterator over the first and last bin overlapping an interval on every level of a
/// [`BinningScheme`](crate::BinningScheme), starting with the smallest bins.
///
/// This is created by [`BinningScheme::ranges`](crate::BinningScheme::ranges). Each item is a
/// `(first_bin, last_bin)` pair, both inclusive. The last item is always `(0, 0)`, the single
/// bin of the root level.
///
/// Algorithm by Jim Kent: <http://genomewiki.ucsc.edu/index.php/Bin_indexing_system>
///
/// # Examples
///
/// ```
/// use gtars_binning::BinningScheme;
///
/// let scheme = BinningScheme::standard();
/// let ranges: Vec<(i64, i64)> = scheme.ranges(1_200_000, 2_000_000).unwrap().collect();
///
/// assert_eq!(ranges, vec![(594, 600), (74, 74), (9, 9), (1, 1), (0, 0)]);
/// ```
#[derive(Debug, Clone)]
pub struct LevelRanges<'a> {
    offsets: &'a [i64],
    shift_next: u32,
    start_bin: i64,
    stop_bin: i64,
    level: usize,
}

impl<'a> LevelRanges<'a> {
    /// `start` and `stop` must already be validated and normalized to a non-empty interval.
    pub(crate) fn new(
        offsets: &'a [i64],
        shift_first: u32,
        shift_next: u32,
        start: i64,
        stop: i64,
    ) -> Self {
        LevelRanges {
            offsets,
            shift_next,
            start_bin: start >> shift_first,
            stop_bin: (stop - 1) >> shift_first,
            level: 0,
        }
    }
}

impl Iterator for LevelRanges<'_> {
    type Item = (i64, i64);

    fn next(&mut self) -> Option<Self::Item> {
        let offset = *self.offsets.get(self.level)?;

        // merge sibling bins into their parent on every level above the first
        if self.level > 0 {
            self.start_bin >>= self.shift_next;
            self.stop_bin >>= self.shift_next;
        }
        self.level += 1;

        Some((offset + self.start_bin, offset + self.stop_bin))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.offsets.len().saturating_sub(self.level);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for LevelRanges<'_> {}

impl FusedIterator for LevelRanges<'_> {}
