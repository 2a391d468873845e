//! Bin-indexed overlap queries over SQL feature tables.
//!
//! Genomic features stored one per row in a SQLite table are fetched by window
//! (`chr`, `start`, `end`) without scanning the whole table. When the table carries a
//! UCSC `bin` column, the candidate bins of the window (see [`binq_binning`]) are
//! added to the query as an `IN (...)` filter; otherwise, or when the window needs
//! too many bins, a plain overlap predicate is used. Both plans return the same rows.
//!
//! Rows are projected into tab-separated lines and decoded by a [`FeatureCodec`],
//! picked from the table's format name with [`codec_for_format`].
//!
//! ## Quick Start
//!
//! ```rust
//! use binq_query::{ConnectionManager, DbProfile, OverlapQueryEngine};
//!
//! let profile = DbProfile::from_toml(r#"
//! [[table]]
//! name = "peaks"
//! locator = ":memory:"
//! format = "bed"
//! chromosome_column = "chrom"
//! start_column = "chromStart"
//! end_column = "chromEnd"
//! "#).unwrap();
//! let entry = profile.table("peaks").unwrap();
//!
//! let mut connections = ConnectionManager::new();
//! let conn = connections.get_connection(entry.table().locator()).unwrap();
//! conn.execute_batch(
//!     "CREATE TABLE peaks (chrom TEXT, chromStart INTEGER, chromEnd INTEGER);
//!      INSERT INTO peaks VALUES ('chr1', 10, 20);",
//! ).unwrap();
//!
//! let mut engine = OverlapQueryEngine::from_entry(conn, entry, None).unwrap();
//! for region in engine.query("chr1", 0, 100).unwrap() {
//!     println!("{}", region.unwrap());
//! }
//! ```

/// Row-to-feature codecs and codec selection.
pub mod codec;

/// Connections keyed by locator.
pub mod connection;

/// Row projection and decoding.
pub mod decoder;

/// The overlap query engine and its result iterator.
///
/// See [`OverlapQueryEngine`] for details.
pub mod engine;

pub mod errors;

/// SQL generation and prepared query plans.
pub mod planner;

/// TOML table profiles.
pub mod profile;

/// Backing table descriptors.
pub mod table;

pub mod traits;

// re-exports
pub use self::codec::{AnyCodec, ChromAliases, DecodeError, FeatureCodec, codec_for_format};
pub use self::connection::ConnectionManager;
pub use self::engine::{DEFAULT_FEATURE_WINDOW_SIZE, EngineState, FeatureIter, OverlapQueryEngine};
pub use self::errors::{QueryError, Result};
pub use self::planner::{MAX_BINS, PlanKind};
pub use self::profile::{DbProfile, TableEntry};
pub use self::table::{BackingTable, ColumnMap};
pub use self::traits::FeatureSource;

/// Constants used throughout the crate.
pub mod consts {
    /// The command name for feature queries.
    pub const QUERY_CMD: &str = "query";
}
