use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BinError {
    /// Negative coordinates, coordinates past the extended range, or an
    /// arithmetic overflow while sweeping. Callers that validate their
    /// intervals never see this.
    #[error("Bin invariant violated: {0}")]
    InvariantViolation(String),
}
