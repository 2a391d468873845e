//! UCSC hierarchical bin indexing for genomic intervals.
//!
//! Coordinate space is split into nested, fixed-size buckets. The finest level uses
//! 128 kb buckets and every coarser level groups eight buckets of the level below it.
//! Each level owns a disjoint range of ids, so a single integer column in a table is
//! enough to record the smallest bucket that fully contains a feature.
//!
//! Tables carrying such a column can be queried with a short `IN (...)` list of
//! candidate bins instead of a range scan. See
//! <http://genomewiki.ucsc.edu/index.php/Bin_indexing_system> and
//! Kent et al., Genome Res. 2002. 12: 996-1006.
//!
//! ## Quick Start
//!
//! ```rust
//! use binq_binning::{bin_from_range, calculate_bins};
//!
//! // a feature that fits inside the first 128 kb bucket
//! assert_eq!(bin_from_range(1_000, 2_000).unwrap(), 585);
//!
//! // all bins that could hold a feature overlapping chr:1000-2000
//! let bins = calculate_bins(1_000, 2_000).unwrap();
//! assert!(bins.contains(&585));
//! assert!(bins.contains(&0));
//! ```

/// Bin id computation and candidate bin sweeps.
pub mod bins;

/// Errors raised by bin computation.
pub mod errors;

// re-exports
pub use self::bins::{bin_from_range, bin_level, calculate_bins, overlapping_bins};
pub use self::errors::BinError;

/// Constants of the bin numbering scheme.
pub mod consts {
    /// How much to shift to get to the finest bin.
    pub const BIN_FIRST_SHIFT: u32 = 17;

    /// How much to shift to get to the next larger bin.
    pub const BIN_NEXT_SHIFT: u32 = 3;

    /// Width of a finest-level bin (128 kb).
    pub const SMALLEST_BIN_SIZE: i64 = 1 << BIN_FIRST_SHIFT;

    /// Largest end coordinate covered by the standard numbering (512 Mb).
    pub const BINRANGE_MAXEND_512M: i64 = 512 * 1024 * 1024;

    /// Largest end coordinate the extended numbering can place (4 Gb).
    pub const BINRANGE_MAXEND_4G: i64 = 1 << 32;

    /// Added to every id of the extended numbering so it never collides with a
    /// standard id.
    pub const BIN_OFFSET_OLD_TO_EXTENDED: u32 = 4681;

    /// First id of every level, finest first. The standard numbering skips the
    /// first entry.
    pub const BIN_OFFSETS_EXTENDED: [u32; 6] = [
        4096 + 512 + 64 + 8 + 1,
        512 + 64 + 8 + 1,
        64 + 8 + 1,
        8 + 1,
        1,
        0,
    ];

    pub const BINS_CMD: &str = "bins";
}
