use std::iter::FusedIterator;

use log::{debug, info};
use rusqlite::{Connection, Rows, params_from_iter};

use binq_binning::overlapping_bins;

use crate::codec::{AnyCodec, ChromAliases, FeatureCodec, codec_for_format};
use crate::decoder::{RowDecoder, value_to_token};
use crate::errors::{QueryError, Result, StorageContext};
use crate::planner::{PlanKind, QueryPlanner, QueryPlans};
use crate::profile::TableEntry;
use crate::table::BackingTable;

/// Largest window, in bp, that a query is allowed to span. Also caps [`OverlapQueryEngine::iterator`].
pub const DEFAULT_FEATURE_WINDOW_SIZE: i64 = 1_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    /// No statement has been prepared yet.
    Uninitialized,
    /// Query plans are prepared and reusable.
    Planned,
    /// Plans and connection are released; every further query fails.
    Closed,
}

///
/// Overlap queries against one backing table.
///
/// The engine borrows a connection and owns the statements it prepares on it.
/// Plans are prepared on the first query and reused until [`close`](Self::close).
/// Results stream through [`FeatureIter`], which borrows the engine mutably, so at
/// most one cursor is open per engine.
///
/// # Examples
///
/// ```
/// use binq_query::{BackingTable, OverlapQueryEngine, codec_for_format};
/// use rusqlite::Connection;
///
/// let conn = Connection::open_in_memory().unwrap();
/// conn.execute_batch(
///     "CREATE TABLE peaks (chrom TEXT, chromStart INTEGER, chromEnd INTEGER, name TEXT);
///      INSERT INTO peaks VALUES ('chr1', 100, 200, 'a'), ('chr1', 5000, 6000, 'b');",
/// ).unwrap();
///
/// let table = BackingTable::new(":memory:", "peaks")
///     .with_position_columns("chrom", "chromStart", "chromEnd");
/// let codec = codec_for_format("bed", None).unwrap();
/// let mut engine = OverlapQueryEngine::new(&conn, table, codec).unwrap();
///
/// let hits: Vec<_> = engine
///     .query("chr1", 150, 300)
///     .unwrap()
///     .collect::<Result<_, _>>()
///     .unwrap();
/// assert_eq!(hits.len(), 1);
/// assert_eq!(hits[0].rest.as_deref(), Some("a"));
/// ```
pub struct OverlapQueryEngine<'conn, C: FeatureCodec> {
    conn: Option<&'conn Connection>,
    table: BackingTable,
    planner: QueryPlanner,
    decoder: RowDecoder<C>,
    plans: Option<QueryPlans<'conn>>,
    feature_window_size: i64,
}

impl<'conn> OverlapQueryEngine<'conn, AnyCodec> {
    ///
    /// Build an engine for a profile entry, picking the codec from the entry's format.
    ///
    /// # Arguments
    /// - conn: connection to the entry's locator
    /// - entry: table descriptor, format and window size
    /// - aliases: chromosome aliases of the active reference genome
    ///
    pub fn from_entry(
        conn: &'conn Connection,
        entry: &TableEntry,
        aliases: Option<&ChromAliases>,
    ) -> Result<Self> {
        let codec = codec_for_format(entry.format(), aliases)?;
        let mut engine = OverlapQueryEngine::new(conn, entry.table().clone(), codec)?;
        if let Some(size) = entry.feature_window_size() {
            engine.set_feature_window_size(size);
        }
        Ok(engine)
    }
}

impl<'conn, C: FeatureCodec> OverlapQueryEngine<'conn, C> {
    pub fn new(conn: &'conn Connection, table: BackingTable, codec: C) -> Result<Self> {
        table.validate()?;

        Ok(OverlapQueryEngine {
            conn: Some(conn),
            planner: QueryPlanner::new(&table),
            decoder: RowDecoder::new(codec, &table),
            table,
            plans: None,
            feature_window_size: DEFAULT_FEATURE_WINDOW_SIZE,
        })
    }

    pub fn table(&self) -> &BackingTable {
        &self.table
    }

    pub fn planner(&self) -> &QueryPlanner {
        &self.planner
    }

    pub fn state(&self) -> EngineState {
        match (self.conn, &self.plans) {
            (None, _) => EngineState::Closed,
            (Some(_), None) => EngineState::Uninitialized,
            (Some(_), Some(_)) => EngineState::Planned,
        }
    }

    pub fn feature_window_size(&self) -> i64 {
        self.feature_window_size
    }

    pub fn set_feature_window_size(&mut self, size: i64) {
        self.feature_window_size = size;
    }

    /// Prepare the query plans. Idempotent.
    fn init_plans(&mut self) -> Result<()> {
        let conn = self.conn.ok_or(QueryError::Closed)?;
        if self.plans.is_none() {
            self.plans = Some(QueryPlans::prepare(conn, &self.planner)?);
            debug!("Prepared query plans for {}", self.table.table_name());
        }
        Ok(())
    }

    ///
    /// Stream every feature of `chr` overlapping `[start, end)`, ordered by start.
    ///
    /// Returns an empty iterator, without touching storage, when `start - end`
    /// exceeds the feature window size.
    ///
    pub fn query(&mut self, chr: &str, start: i64, end: i64) -> Result<FeatureIter<'_, C>> {
        if self.conn.is_none() {
            return Err(QueryError::Closed);
        }

        if start.saturating_sub(end) > self.feature_window_size {
            debug!(
                "Skipping query {}:{}-{} wider than window {}",
                chr, start, end, self.feature_window_size
            );
            return Ok(FeatureIter::empty(&self.decoder));
        }

        // the predicate also admits features ending exactly at `start`, whose last
        // base is start - 1
        let reach = match start > 0 {
            true => start - 1,
            false => start,
        };
        let bins = overlapping_bins(reach, end)?;
        self.init_plans()?;

        let kind = self.planner.choose(&bins);
        let values = self.planner.bind_values(kind, chr, start, end, &bins);
        debug!(
            "Querying {}:{}-{} on {} with {} candidate bins ({:?})",
            chr,
            start,
            end,
            self.table.table_name(),
            bins.len(),
            kind
        );

        let OverlapQueryEngine { plans, decoder, .. } = self;
        let plans = plans.as_mut().ok_or(QueryError::Closed)?;
        let rows = plans
            .statement(kind)
            .query(params_from_iter(values))
            .storage("executing overlap query")?;

        Ok(FeatureIter::new(rows, decoder, Some(kind)))
    }

    ///
    /// Stream the first `feature_window_size` features of the whole table, ordered
    /// by start. Meant for sniffing a table's contents, not for range queries.
    ///
    pub fn iterator(&mut self) -> Result<FeatureIter<'_, C>> {
        self.init_plans()?;

        let limit = self.feature_window_size;
        let OverlapQueryEngine { plans, decoder, .. } = self;
        let plans = plans.as_mut().ok_or(QueryError::Closed)?;
        let rows = plans
            .scan()
            .query([limit])
            .storage("executing table scan")?;

        Ok(FeatureIter::new(rows, decoder, None))
    }

    ///
    /// Distinct chromosome names present in the table, in no particular order.
    ///
    pub fn sequence_names(&self) -> Result<Vec<String>> {
        let conn = self.conn.ok_or(QueryError::Closed)?;

        let mut statement = conn
            .prepare(self.planner.sequence_names_sql())
            .storage("preparing sequence name query")?;
        let mut rows = statement
            .query([])
            .storage("executing sequence name query")?;

        let mut names = Vec::new();
        while let Some(row) = rows.next().storage("reading sequence names")? {
            let value = row.get_ref(0).storage("reading sequence names")?;
            if value != rusqlite::types::ValueRef::Null {
                names.push(value_to_token(value));
            }
        }
        Ok(names)
    }

    ///
    /// Release the prepared statements and the connection. Safe to call more than
    /// once, and before any query.
    ///
    pub fn close(&mut self) {
        self.plans = None;
        if self.conn.take().is_some() {
            info!("Closed query engine for {}", self.table.table_name());
        }
    }
}

///
/// Lazy, forward-only sequence of decoded features.
///
/// Yields `Err` at most once: the first storage or decode failure ends the
/// sequence.
///
pub struct FeatureIter<'a, C: FeatureCodec> {
    rows: Option<Rows<'a>>,
    decoder: &'a RowDecoder<C>,
    columns: Option<Vec<usize>>,
    plan: Option<PlanKind>,
}

impl<'a, C: FeatureCodec> FeatureIter<'a, C> {
    fn new(rows: Rows<'a>, decoder: &'a RowDecoder<C>, plan: Option<PlanKind>) -> Self {
        FeatureIter {
            rows: Some(rows),
            decoder,
            columns: None,
            plan,
        }
    }

    fn empty(decoder: &'a RowDecoder<C>) -> Self {
        FeatureIter {
            rows: None,
            decoder,
            columns: None,
            plan: None,
        }
    }

    /// The plan that produced these rows; `None` for table scans and skipped queries.
    pub fn plan(&self) -> Option<PlanKind> {
        self.plan
    }
}

impl<C: FeatureCodec> Iterator for FeatureIter<'_, C> {
    type Item = Result<C::Feature>;

    fn next(&mut self) -> Option<Self::Item> {
        let rows = self.rows.as_mut()?;

        let outcome = match rows.next().storage("fetching row") {
            Ok(Some(row)) => Some(self.decoder.decode(row, &mut self.columns)),
            Ok(None) => None,
            Err(e) => Some(Err(e)),
        };

        // drop the cursor once drained or broken
        if !matches!(outcome, Some(Ok(_))) {
            self.rows = None;
        }
        outcome
    }
}

impl<C: FeatureCodec> FusedIterator for FeatureIter<'_, C> {}
