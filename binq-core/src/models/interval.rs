use std::fmt::{self, Display};
use std::str::FromStr;

use crate::errors::IntervalError;

/// A query window on one chromosome, half-open `[start, end)`.
///
/// Coordinates are signed so that bad input can be reported instead of
/// silently wrapping; [`GenomicInterval::new`] enforces `0 <= start <= end`.
#[derive(Eq, PartialEq, Hash, Debug, Clone)]
pub struct GenomicInterval {
    pub chr: String,
    pub start: i64,
    pub end: i64,
}

impl GenomicInterval {
    pub fn new(chr: impl Into<String>, start: i64, end: i64) -> Result<Self, IntervalError> {
        if start < 0 || start > end {
            return Err(IntervalError::InvalidCoordinates { start, end });
        }
        Ok(GenomicInterval {
            chr: chr.into(),
            start,
            end,
        })
    }

    pub fn width(&self) -> i64 {
        self.end - self.start
    }
}

impl FromStr for GenomicInterval {
    type Err = IntervalError;

    ///
    /// Parse `chr:start-end`. Thousands separators (`,`) in the coordinates are accepted.
    ///
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (chr, range) = s
            .rsplit_once(':')
            .ok_or_else(|| IntervalError::RegionParseError(s.to_string()))?;
        let (start, end) = range
            .split_once('-')
            .ok_or_else(|| IntervalError::RegionParseError(s.to_string()))?;

        if chr.is_empty() {
            return Err(IntervalError::RegionParseError(s.to_string()));
        }

        let parse = |v: &str| {
            v.trim()
                .replace(',', "")
                .parse::<i64>()
                .map_err(|_| IntervalError::RegionParseError(s.to_string()))
        };

        GenomicInterval::new(chr, parse(start)?, parse(end)?)
    }
}

impl Display for GenomicInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}-{}", self.chr, self.start, self.end)
    }
}
