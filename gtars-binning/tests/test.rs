#[cfg(feature = "config")]
use std::io::Write;
#[cfg(feature = "config")]
use std::path::{Path, PathBuf};

use gtars_binning::{BinningError, BinningScheme};
#[cfg(feature = "config")]
use gtars_binning::{SchemeConfig, SchemeConfigError};

use pretty_assertions::assert_eq;
use rstest::*;

#[fixture]
fn scheme() -> BinningScheme {
    BinningScheme::standard()
}

#[cfg(feature = "config")]
#[fixture]
fn path_to_data() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/data")
}

/// Bins `start..stop`.
fn rng(start: i64, stop: i64) -> Vec<i64> {
    (start..stop).collect()
}

fn conc(parts: &[Vec<i64>]) -> Vec<i64> {
    parts.concat()
}

// Example intervals with pre-calculated bin numbers from
// http://genomewiki.ucsc.edu/index.php/Bin_indexing_system
#[rstest]
#[case(0, 1, 585)]
#[case((1 << 29) - 1, 1 << 29, 4680)]
#[case(0, 1 << 29, 0)]
#[case(0, 1 << 17, 585)]
#[case(1, 1 << 17, 585)]
#[case(0, (1 << 17) - 1, 585)]
#[case(0, (1 << 17) + 1, 73)]
#[case(340, 74012, 585)]
#[case(0, 1 << 18, 73)]
#[case(74012, 173034, 73)]
#[case(423427, 423428, 588)]
#[case(100000, 200000, 73)]
#[case(1000000, 2000000, 9)]
#[case(10000000, 20000000, 1)]
#[case(100000000, 200000000, 0)]
#[case(200000, 1000000, 73)]
#[case(2000000, 10000000, 1)]
#[case(20000000, 100000000, 0)]
#[case(300000000, 300000015, 2873)]
#[case(300000000, 300100015, 359)]
#[case(300000000, 300200015, 359)]
#[case(300000000, 301000015, 44)]
#[case(300000000, 311000015, 5)]
#[case(300000000, 321000015, 5)]
#[case(300000000, 381000015, 0)]
#[case(300000000, 511000015, 0)]
#[case(1200000, 2000000, 74)]
fn test_assign(scheme: BinningScheme, #[case] start: i64, #[case] stop: i64, #[case] bin: i64) {
    assert_eq!(scheme.assign(start, stop).unwrap(), bin);

    // the assigned bin covers the whole interval
    let (covered_start, covered_stop) = scheme.covered(bin).unwrap();
    assert_eq!(covered_start <= start, true);
    assert_eq!(stop <= covered_stop, true);

    // and so do all bins containing it
    for containing in scheme.containing(start, stop).unwrap() {
        let (covered_start, covered_stop) = scheme.covered(containing).unwrap();
        assert_eq!(covered_start <= start && stop <= covered_stop, true);
    }
}

#[rstest]
#[case(-23442, -334)]
#[case(-23442, 334)]
#[case(-23442, 0)]
#[case(-1, -1)]
#[case(-1, 0)]
#[case(5656, (1 << 29) + 1)]
#[case(-34234, (1 << 29) + 3431)]
fn test_invalid_intervals(scheme: BinningScheme, #[case] start: i64, #[case] stop: i64) {
    let expected = BinningError::OutOfRange {
        start,
        stop,
        max_position: (1 << 29) - 1,
    };
    assert_eq!(scheme.ranges(start, stop).unwrap_err(), expected);
    assert_eq!(scheme.assign(start, stop).unwrap_err(), expected);
    assert_eq!(scheme.overlapping(start, stop).unwrap_err(), expected);
    assert_eq!(scheme.containing(start, stop).unwrap_err(), expected);
    assert_eq!(scheme.contained(start, stop).unwrap_err(), expected);
}

#[rstest]
#[case(0, 0, vec![(585, 585), (73, 73), (9, 9), (1, 1), (0, 0)])]
#[case(0, 1, vec![(585, 585), (73, 73), (9, 9), (1, 1), (0, 0)])]
#[case((1 << 29) - 1, (1 << 29) - 1, vec![(4680, 4680), (584, 584), (72, 72), (8, 8), (0, 0)])]
#[case((1 << 29) - 1, 1 << 29, vec![(4680, 4680), (584, 584), (72, 72), (8, 8), (0, 0)])]
#[case(0, 1 << 29, vec![(585, 4680), (73, 584), (9, 72), (1, 8), (0, 0)])]
#[case(0, (1 << 17) + 1, vec![(585, 586), (73, 73), (9, 9), (1, 1), (0, 0)])]
#[case(1200000, 2000000, vec![(594, 600), (74, 74), (9, 9), (1, 1), (0, 0)])]
#[case(0, 1 << 18, vec![(585, 586), (73, 73), (9, 9), (1, 1), (0, 0)])]
#[case(300000000, 300200015, vec![(2873, 2875), (359, 359), (44, 44), (5, 5), (0, 0)])]
#[case(300000000, 301000015, vec![(2873, 2881), (359, 360), (44, 44), (5, 5), (0, 0)])]
fn test_ranges(
    scheme: BinningScheme,
    #[case] start: i64,
    #[case] stop: i64,
    #[case] expected: Vec<(i64, i64)>,
) {
    let mut ranges = scheme.ranges(start, stop).unwrap();
    assert_eq!(ranges.by_ref().collect::<Vec<_>>(), expected);
    assert_eq!(ranges.next(), None);
}

#[rstest]
#[case(0, 1, vec![585, 73, 9, 1, 0])]
#[case((1 << 29) - 1, 1 << 29, vec![4680, 584, 72, 8, 0])]
#[case(0, 1 << 29, conc(&[rng(585, 4681), rng(73, 585), rng(9, 73), rng(1, 9), vec![0]]))]
#[case(0, (1 << 17) + 1, vec![585, 586, 73, 9, 1, 0])]
#[case(1200000, 2000000, conc(&[rng(594, 601), vec![74, 9, 1, 0]]))]
#[case(0, 1 << 18, vec![585, 586, 73, 9, 1, 0])]
#[case(300000000, 300200015, vec![2873, 2874, 2875, 359, 44, 5, 0])]
#[case(300000000, 301000015, conc(&[rng(2873, 2882), vec![359, 360, 44, 5, 0]]))]
fn test_overlapping(
    scheme: BinningScheme,
    #[case] start: i64,
    #[case] stop: i64,
    #[case] expected: Vec<i64>,
) {
    assert_eq!(scheme.overlapping(start, stop).unwrap(), expected);
}

#[rstest]
#[case(0, 1, vec![585, 73, 9, 1, 0])]
#[case((1 << 29) - 1, 1 << 29, vec![4680, 584, 72, 8, 0])]
#[case(0, 1 << 29, vec![0])]
#[case(0, (1 << 17) + 1, vec![73, 9, 1, 0])]
#[case(1200000, 2000000, vec![74, 9, 1, 0])]
#[case(0, 1 << 18, vec![73, 9, 1, 0])]
#[case(300000000, 300200015, vec![359, 44, 5, 0])]
#[case(300000000, 301000015, vec![44, 5, 0])]
fn test_containing(
    scheme: BinningScheme,
    #[case] start: i64,
    #[case] stop: i64,
    #[case] expected: Vec<i64>,
) {
    assert_eq!(scheme.containing(start, stop).unwrap(), expected);
}

#[rstest]
#[case(0, 1, vec![585])]
#[case((1 << 29) - 1, 1 << 29, vec![4680])]
#[case(0, 1 << 29, conc(&[rng(585, 4681), rng(73, 585), rng(9, 73), rng(1, 9), vec![0]]))]
#[case(0, (1 << 17) + 1, vec![585, 586, 73])]
#[case(1200000, 2000000, conc(&[rng(594, 601), vec![74]]))]
#[case(0, 1 << 18, vec![585, 586, 73])]
#[case(300000000, 300200015, vec![2873, 2874, 2875, 359])]
#[case(300000000, 301000015, conc(&[rng(2873, 2882), vec![359, 360, 44]]))]
fn test_contained(
    scheme: BinningScheme,
    #[case] start: i64,
    #[case] stop: i64,
    #[case] expected: Vec<i64>,
) {
    assert_eq!(scheme.contained(start, stop).unwrap(), expected);
}

// Containing and contained split the overlapping bins at the assigned bin. This holds only
// because bins on finer levels are numbered above all bins on coarser levels.
#[rstest]
#[case(0, 1)]
#[case(0, 1 << 29)]
#[case(1200000, 2000000)]
#[case(300000000, 301000015)]
#[case(74012, 173034)]
#[case(5000, 5000)]
fn test_containing_and_contained_split_overlapping(
    scheme: BinningScheme,
    #[case] start: i64,
    #[case] stop: i64,
) {
    let bin = scheme.assign(start, stop).unwrap();
    let overlapping = scheme.overlapping(start, stop).unwrap();
    let containing = scheme.containing(start, stop).unwrap();
    let contained = scheme.contained(start, stop).unwrap();

    assert_eq!(overlapping.contains(&bin), true);

    let mut union: Vec<i64> = containing.iter().chain(contained.iter()).copied().collect();
    union.sort_unstable();
    union.dedup();
    let mut expected = overlapping.clone();
    expected.sort_unstable();
    assert_eq!(union, expected);

    let shared: Vec<i64> = containing
        .iter()
        .filter(|bin| contained.contains(bin))
        .copied()
        .collect();
    assert_eq!(shared, vec![bin]);
}

#[rstest]
#[case(BinningScheme::standard())]
#[case(BinningScheme::bam())]
#[case(BinningScheme::geometric(1023, 2, 2, 5).unwrap())]
#[case(BinningScheme::geometric(8191, 3, 2, 6).unwrap())]
fn test_covered_then_assign_returns_the_bin(#[case] scheme: BinningScheme) {
    for bin in 0..=scheme.max_bin() {
        let (start, stop) = scheme.covered(bin).unwrap();
        assert_eq!(stop <= scheme.max_position() + 1, true);
        assert_eq!(scheme.assign(start, stop).unwrap(), bin);
    }
}

// A root bin reaching past the maximum position would make covered return intervals that
// can not be assigned again.
#[rstest]
#[case(4095, 3, 2, 6)]
#[case(1000, 2, 2, 5)]
fn test_scheme_must_end_at_the_root_bin(
    #[case] max_position: i64,
    #[case] shift_first: u32,
    #[case] shift_next: u32,
    #[case] levels: usize,
) {
    let result = BinningScheme::geometric(max_position, shift_first, shift_next, levels);
    assert_eq!(matches!(result, Err(BinningError::InvalidScheme(_))), true);
}

#[rstest]
fn test_covered_past_max_bin(scheme: BinningScheme) {
    assert_eq!(
        scheme.covered(4681).unwrap_err(),
        BinningError::InvalidBin {
            bin: 4681,
            max_bin: 4680
        }
    );
}

#[rstest]
fn test_bam_scheme_bins() {
    let scheme = BinningScheme::bam();
    assert_eq!(scheme.assign(0, 1).unwrap(), 4681);
    assert_eq!(scheme.assign(0, 1 << 14).unwrap(), 4681);
    assert_eq!(scheme.assign(0, (1 << 14) + 1).unwrap(), 585);
    assert_eq!(scheme.assign((1 << 29) - 1, 1 << 29).unwrap(), 37448);
    assert_eq!(scheme.covered(37448).unwrap(), ((1 << 29) - (1 << 14), 1 << 29));
}

#[rstest]
fn test_scheme_is_shared_across_threads(scheme: BinningScheme) {
    std::thread::scope(|s| {
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let scheme = &scheme;
                s.spawn(move || scheme.assign(i << 17, (i << 17) + 1).unwrap())
            })
            .collect();
        let bins: Vec<i64> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(bins, vec![585, 586, 587, 588]);
    });
}

#[cfg(feature = "config")]
#[rstest]
fn test_load_preset_from_file(path_to_data: PathBuf) {
    let scheme = BinningScheme::from_config_file(&path_to_data.join("ucsc.toml")).unwrap();
    assert_eq!(scheme, BinningScheme::standard());
}

#[cfg(feature = "config")]
#[rstest]
fn test_load_explicit_scheme_from_file(path_to_data: PathBuf) {
    let scheme = BinningScheme::from_config_file(&path_to_data.join("bai.toml")).unwrap();
    assert_eq!(scheme, BinningScheme::bam());
}

#[cfg(feature = "config")]
#[rstest]
fn test_load_invalid_scheme_from_file(path_to_data: PathBuf) {
    let result = BinningScheme::from_config_file(&path_to_data.join("no_root.toml"));
    assert_eq!(
        matches!(
            result,
            Err(SchemeConfigError::Scheme(BinningError::InvalidScheme(_)))
        ),
        true
    );
}

#[cfg(feature = "config")]
#[rstest]
fn test_load_missing_file(path_to_data: PathBuf) {
    let result = BinningScheme::from_config_file(&path_to_data.join("missing.toml"));
    assert_eq!(matches!(result, Err(SchemeConfigError::Io(_))), true);
}

#[cfg(feature = "config")]
#[rstest]
fn test_write_and_reload_config() {
    let scheme = BinningScheme::geometric(8191, 3, 2, 6).unwrap();
    let toml_str = SchemeConfig::from(&scheme).to_toml_string().unwrap();

    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(toml_str.as_bytes()).unwrap();

    let reloaded = BinningScheme::from_config_file(file.path()).unwrap();
    assert_eq!(reloaded, scheme);
}
