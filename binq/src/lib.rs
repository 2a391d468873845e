#[cfg(feature = "core")]
#[doc(inline)]
pub use binq_core as core;

#[cfg(feature = "binning")]
#[doc(inline)]
pub use binq_binning as binning;

#[cfg(feature = "query")]
#[doc(inline)]
pub use binq_query as query;
