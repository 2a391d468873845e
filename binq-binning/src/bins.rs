use fxhash::FxHashSet;

use crate::consts::{
    BIN_FIRST_SHIFT, BIN_NEXT_SHIFT, BIN_OFFSET_OLD_TO_EXTENDED, BIN_OFFSETS_EXTENDED,
    BINRANGE_MAXEND_4G, BINRANGE_MAXEND_512M, SMALLEST_BIN_SIZE,
};
use crate::errors::BinError;

///
/// Compute the bin of the smallest bucket that fully contains `[start, end)`.
///
/// Intervals ending past 512 Mb are numbered with the extended scheme, which adds
/// one coarser level and shifts every id by [`BIN_OFFSET_OLD_TO_EXTENDED`].
///
/// # Arguments
/// - start: 0-based start, inclusive
/// - end: end, exclusive
///
/// # Errors
/// [`BinError::InvariantViolation`] for negative coordinates or an interval that
/// ends past the extended range (4 Gb).
///
pub fn bin_from_range(start: i64, end: i64) -> Result<u32, BinError> {
    if start < 0 || end < 0 {
        return Err(BinError::InvariantViolation(format!(
            "start {}, end {} must be >= 0",
            start, end
        )));
    }

    let extended = end > BINRANGE_MAXEND_512M;
    let offsets = match extended {
        true => &BIN_OFFSETS_EXTENDED[..],
        false => &BIN_OFFSETS_EXTENDED[1..],
    };

    let mut start_bin = start >> BIN_FIRST_SHIFT;
    // [0, 0) has no last base; treat it as the point at 0
    let mut end_bin = (end - 1).max(0) >> BIN_FIRST_SHIFT;

    for &offset in offsets {
        if start_bin == end_bin {
            // start_bin is below 8^level here, so it always fits
            let bin = offset + start_bin as u32;
            return Ok(match extended {
                true => bin + BIN_OFFSET_OLD_TO_EXTENDED,
                false => bin,
            });
        }
        start_bin >>= BIN_NEXT_SHIFT;
        end_bin >>= BIN_NEXT_SHIFT;
    }

    Err(BinError::InvariantViolation(format!(
        "start {}, end {} out of range for bin indexing",
        start, end
    )))
}

///
/// Collect every bin that could hold a feature overlapping `[start, end)`.
///
/// A feature's bin depends on its own span, not on the query's, so for every
/// window size from 128 kb up to 512 Mb a window of that size is swept across the
/// query. Sweeps start half a window to the left of `start` so that features
/// beginning before the query but reaching into it are not missed.
///
/// The result always contains `bin_from_range(start, end)`.
///
pub fn calculate_bins(start: i64, end: i64) -> Result<FxHashSet<u32>, BinError> {
    let length = end.saturating_sub(start).max(0);
    let mut bins: FxHashSet<u32> = FxHashSet::default();
    bins.reserve((length / SMALLEST_BIN_SIZE).saturating_mul(2).min(4096) as usize);

    let mut sweep_length = SMALLEST_BIN_SIZE;
    while sweep_length < BINRANGE_MAXEND_512M {
        let mut window_start = start.saturating_sub(sweep_length / 2).max(0);
        while window_start < end {
            if window_start >= BINRANGE_MAXEND_4G {
                return Err(BinError::InvariantViolation(format!(
                    "overflow while calculating bins for {}-{}",
                    start, end
                )));
            }
            // nothing can be placed past 4 Gb, so the last window is cut short there
            let window_end = window_start
                .checked_add(sweep_length)
                .ok_or_else(|| {
                    BinError::InvariantViolation(format!(
                        "overflow while calculating bins for {}-{}",
                        start, end
                    ))
                })?
                .min(BINRANGE_MAXEND_4G);
            bins.insert(bin_from_range(window_start, window_end)?);
            window_start = window_end;
        }
        sweep_length *= 2;
    }
    bins.insert(bin_from_range(start, end)?);

    Ok(bins)
}

///
/// Every bin, in both numberings, whose bucket intersects `[start, end)`.
///
/// [`calculate_bins`] samples the range with sliding windows and can skip
/// buckets the range touches. This walks every level and lists each bucket
/// between `start` and the last base, so any feature sharing a base with the
/// range has its bin in the result. An empty range counts as the base at `start`.
///
/// # Errors
/// [`BinError::InvariantViolation`] for negative coordinates or a range reaching
/// past 4 Gb.
///
pub fn overlapping_bins(start: i64, end: i64) -> Result<FxHashSet<u32>, BinError> {
    if start < 0 || end < 0 {
        return Err(BinError::InvariantViolation(format!(
            "start {}, end {} must be >= 0",
            start, end
        )));
    }

    let last = (end - 1).max(start);
    if last >= BINRANGE_MAXEND_4G {
        return Err(BinError::InvariantViolation(format!(
            "start {}, end {} out of range for bin indexing",
            start, end
        )));
    }

    let mut bins: FxHashSet<u32> = FxHashSet::default();

    // standard ids only describe features ending at or before 512 Mb
    if start < BINRANGE_MAXEND_512M {
        let standard_last = last.min(BINRANGE_MAXEND_512M - 1);
        insert_level_bins(&mut bins, start, standard_last, &BIN_OFFSETS_EXTENDED[1..], 0);
    }
    insert_level_bins(
        &mut bins,
        start,
        last,
        &BIN_OFFSETS_EXTENDED,
        BIN_OFFSET_OLD_TO_EXTENDED,
    );

    Ok(bins)
}

fn insert_level_bins(
    bins: &mut FxHashSet<u32>,
    first: i64,
    last: i64,
    offsets: &[u32],
    numbering_offset: u32,
) {
    let mut shift = BIN_FIRST_SHIFT;
    for &offset in offsets {
        for index in (first >> shift)..=(last >> shift) {
            bins.insert(offset + index as u32 + numbering_offset);
        }
        shift += BIN_NEXT_SHIFT;
    }
}

///
/// Resolution level of a bin: 0 for the finest (128 kb) buckets, each level up
/// is eight times wider. Works for both the standard and extended numbering.
///
pub fn bin_level(bin: u32) -> usize {
    let (local, offsets) = match bin >= BIN_OFFSET_OLD_TO_EXTENDED {
        true => (bin - BIN_OFFSET_OLD_TO_EXTENDED, &BIN_OFFSETS_EXTENDED[..]),
        false => (bin, &BIN_OFFSETS_EXTENDED[1..]),
    };

    offsets
        .iter()
        .position(|&offset| local >= offset)
        .unwrap_or(offsets.len() - 1)
}
