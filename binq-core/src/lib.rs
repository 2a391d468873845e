//! Shared models for binq.
//!
//! [`models::Region`] is the feature type produced by the bundled codecs, and
//! [`models::GenomicInterval`] is the half-open `[start, end)` window that overlap
//! queries are issued against.
pub mod errors;
pub mod models;
