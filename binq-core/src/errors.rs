use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum IntervalError {
    #[error("Error parsing region: {0}")]
    RegionParseError(String),

    #[error("Invalid coordinates: start {start}, end {end} (need 0 <= start <= end)")]
    InvalidCoordinates { start: i64, end: i64 },
}
