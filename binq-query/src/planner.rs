use fxhash::FxHashSet;
use log::debug;
use rusqlite::types::Value;
use rusqlite::{Connection, Statement};

use crate::errors::{Result, StorageContext};
use crate::table::BackingTable;

/// Capacity of the `IN (...)` list of the binned query.
pub const MAX_BINS: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanKind {
    /// Overlap predicate plus `bin IN (...)`.
    Binned,
    /// Overlap predicate only.
    Unbinned,
}

///
/// SQL for every query issued against one table. Built once per table so the
/// number of distinct statements stays constant no matter how many windows are
/// queried.
///
#[derive(Debug, Clone)]
pub struct QueryPlanner {
    unbinned_sql: String,
    binned_sql: Option<String>,
    scan_sql: String,
    sequence_names_sql: String,
}

impl QueryPlanner {
    pub fn new(table: &BackingTable) -> Self {
        let base = table.base_query();
        let start = table.start_column();

        // Include feature iff (feature.start >= start AND feature.start < end)
        // OR (feature.start < start AND feature.end >= start)
        let query = format!(
            "{} WHERE {} = ? AND ( ({} >= ? AND {} < ?) OR ({} < ? AND {} >= ?) )",
            base,
            table.chromosome_column(),
            start,
            start,
            start,
            table.end_column()
        );
        let order = format!("ORDER BY {}", start);

        let binned_sql = table.bin_column().map(|bin_column| {
            let slots = vec!["?"; MAX_BINS].join(",");
            format!("{} AND {} IN ({}) {}", query, bin_column, slots, order)
        });

        QueryPlanner {
            unbinned_sql: format!("{} {}", query, order),
            binned_sql,
            scan_sql: format!("{} {} LIMIT ?", base, order),
            sequence_names_sql: format!(
                "SELECT DISTINCT {} FROM {}",
                table.chromosome_column(),
                table.table_name()
            ),
        }
    }

    pub fn unbinned_sql(&self) -> &str {
        &self.unbinned_sql
    }

    pub fn binned_sql(&self) -> Option<&str> {
        self.binned_sql.as_deref()
    }

    pub fn scan_sql(&self) -> &str {
        &self.scan_sql
    }

    pub fn sequence_names_sql(&self) -> &str {
        &self.sequence_names_sql
    }

    ///
    /// Use the binned plan when the table has one and every candidate bin fits in
    /// its `IN` list; fall back to the plain overlap predicate otherwise.
    ///
    pub fn choose(&self, bins: &FxHashSet<u32>) -> PlanKind {
        match self.binned_sql.is_some() && bins.len() < MAX_BINS {
            true => PlanKind::Binned,
            false => PlanKind::Unbinned,
        }
    }

    ///
    /// Positional parameters for a plan. Unused `IN` slots are bound to `NULL`,
    /// which never compares equal, so padding cannot admit extra rows.
    ///
    pub fn bind_values(
        &self,
        kind: PlanKind,
        chr: &str,
        start: i64,
        end: i64,
        bins: &FxHashSet<u32>,
    ) -> Vec<Value> {
        let mut values = vec![
            Value::Text(chr.to_string()),
            Value::Integer(start),
            Value::Integer(end),
            Value::Integer(start),
            Value::Integer(start),
        ];

        if kind == PlanKind::Binned {
            values.extend(bins.iter().map(|&bin| Value::Integer(bin as i64)));
            values.resize(5 + MAX_BINS, Value::Null);
        }

        values
    }
}

///
/// Prepared statements of one table, bound to the connection they were prepared on.
///
pub struct QueryPlans<'conn> {
    unbinned: Statement<'conn>,
    binned: Option<Statement<'conn>>,
    scan: Statement<'conn>,
}

impl<'conn> QueryPlans<'conn> {
    pub fn prepare(conn: &'conn Connection, planner: &QueryPlanner) -> Result<Self> {
        debug!("Preparing overlap query: {}", planner.unbinned_sql());
        let unbinned = conn
            .prepare(planner.unbinned_sql())
            .storage("preparing overlap query")?;

        let binned = match planner.binned_sql() {
            Some(sql) => {
                debug!("Preparing binned overlap query: {}", sql);
                Some(conn.prepare(sql).storage("preparing binned overlap query")?)
            }
            None => None,
        };

        let scan = conn
            .prepare(planner.scan_sql())
            .storage("preparing table scan")?;

        Ok(QueryPlans {
            unbinned,
            binned,
            scan,
        })
    }

    pub fn statement(&mut self, kind: PlanKind) -> &mut Statement<'conn> {
        match (kind, self.binned.as_mut()) {
            (PlanKind::Binned, Some(binned)) => binned,
            _ => &mut self.unbinned,
        }
    }

    pub fn scan(&mut self) -> &mut Statement<'conn> {
        &mut self.scan
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::*;

    #[fixture]
    fn planner() -> QueryPlanner {
        QueryPlanner::new(&BackingTable::new(":memory:", "refGene").with_bin_column("bin"))
    }

    #[rstest]
    fn test_planner_sql(planner: QueryPlanner) {
        assert_eq!(
            planner.unbinned_sql(),
            "SELECT * FROM refGene WHERE chrom = ? AND ( (txStart >= ? AND txStart < ?) OR (txStart < ? AND txEnd >= ?) ) ORDER BY txStart"
        );
        assert_eq!(
            planner.binned_sql().unwrap(),
            "SELECT * FROM refGene WHERE chrom = ? AND ( (txStart >= ? AND txStart < ?) OR (txStart < ? AND txEnd >= ?) ) AND bin IN (?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?) ORDER BY txStart"
        );
        assert_eq!(
            planner.scan_sql(),
            "SELECT * FROM refGene ORDER BY txStart LIMIT ?"
        );
        assert_eq!(
            planner.sequence_names_sql(),
            "SELECT DISTINCT chrom FROM refGene"
        );
    }

    #[rstest]
    fn test_planner_without_bin_column() {
        let planner = QueryPlanner::new(
            &BackingTable::new(":memory:", "peaks")
                .with_position_columns("chrom", "chromStart", "chromEnd")
                .with_base_query("SELECT chrom, chromStart, chromEnd FROM peaks"),
        );
        assert_eq!(planner.binned_sql(), None);
        assert!(planner.unbinned_sql().starts_with(
            "SELECT chrom, chromStart, chromEnd FROM peaks WHERE chrom = ?"
        ));

        let bins: FxHashSet<u32> = [585].into_iter().collect();
        assert_eq!(planner.choose(&bins), PlanKind::Unbinned);
    }

    #[rstest]
    fn test_planner_choose(planner: QueryPlanner) {
        let few: FxHashSet<u32> = (0..(MAX_BINS as u32 - 1)).collect();
        let exactly: FxHashSet<u32> = (0..MAX_BINS as u32).collect();
        assert_eq!(planner.choose(&few), PlanKind::Binned);
        assert_eq!(planner.choose(&exactly), PlanKind::Unbinned);
    }

    #[rstest]
    fn test_bind_values_pads_with_null(planner: QueryPlanner) {
        let bins: FxHashSet<u32> = [585, 73, 9].into_iter().collect();
        let values = planner.bind_values(PlanKind::Binned, "chr1", 1000, 2000, &bins);

        assert_eq!(values.len(), 5 + MAX_BINS);
        assert_eq!(values[0], Value::Text("chr1".to_string()));
        assert_eq!(
            &values[1..5],
            &[
                Value::Integer(1000),
                Value::Integer(2000),
                Value::Integer(1000),
                Value::Integer(1000)
            ]
        );

        let mut bound: Vec<i64> = values[5..8]
            .iter()
            .map(|v| match v {
                Value::Integer(bin) => *bin,
                other => panic!("expected a bin, got {:?}", other),
            })
            .collect();
        bound.sort();
        assert_eq!(bound, vec![9, 73, 585]);
        assert!(values[8..].iter().all(|v| *v == Value::Null));
    }

    #[rstest]
    fn test_bind_values_unbinned(planner: QueryPlanner) {
        let bins: FxHashSet<u32> = [585].into_iter().collect();
        let values = planner.bind_values(PlanKind::Unbinned, "chr2", 5, 10, &bins);
        assert_eq!(values.len(), 5);
    }

    #[rstest]
    fn test_query_plans_prepare_reports_storage_errors(planner: QueryPlanner) {
        let conn = Connection::open_in_memory().unwrap();
        assert!(matches!(
            QueryPlans::prepare(&conn, &planner),
            Err(crate::errors::QueryError::StorageError { .. })
        ));
    }
}
