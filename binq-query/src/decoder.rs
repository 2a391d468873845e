use rusqlite::types::ValueRef;
use rusqlite::{Row, Statement};

use crate::codec::FeatureCodec;
use crate::errors::{Result, StorageContext};
use crate::table::{BackingTable, ColumnMap};

///
/// Projects fetched rows into a tab-separated line and decodes it with a codec.
///
/// The projection is either the table's [`ColumnMap`] or its contiguous
/// `start_col_index..=end_col_index` range.
///
#[derive(Debug, Clone)]
pub struct RowDecoder<C> {
    codec: C,
    column_map: Option<ColumnMap>,
    start_col_index: u32,
    end_col_index: u32,
}

impl<C: FeatureCodec> RowDecoder<C> {
    pub fn new(codec: C, table: &BackingTable) -> Self {
        RowDecoder {
            codec,
            column_map: table.column_map().cloned(),
            start_col_index: table.start_col_index(),
            end_col_index: table.end_col_index(),
        }
    }

    pub fn codec(&self) -> &C {
        &self.codec
    }

    ///
    /// 0-based indexes of the columns to extract from rows of `statement`, in
    /// output order.
    ///
    pub fn resolve_columns(&self, statement: &Statement<'_>) -> Result<Vec<usize>> {
        if let Some(column_map) = &self.column_map {
            return column_map.resolve(statement);
        }

        let count = statement.column_count();
        let first = self.start_col_index as usize;
        let last = (self.end_col_index as usize).min(count);
        Ok((first..=last).map(|index| index - 1).collect())
    }

    pub fn tokens(&self, row: &Row<'_>, columns: &[usize]) -> Result<Vec<String>> {
        columns
            .iter()
            .map(|&index| {
                row.get_ref(index)
                    .map(value_to_token)
                    .storage("reading row")
            })
            .collect()
    }

    ///
    /// Decode one row. `columns` caches the resolved projection for the cursor the
    /// row came from, and is filled on the first call.
    ///
    pub fn decode(&self, row: &Row<'_>, columns: &mut Option<Vec<usize>>) -> Result<C::Feature> {
        if columns.is_none() {
            *columns = Some(self.resolve_columns(row.as_ref())?);
        }
        let columns = columns.as_deref().unwrap_or_default();

        let line = self.tokens(row, columns)?.join("\t");
        self.decode_line(&line)
    }

    pub fn decode_line(&self, line: &str) -> Result<C::Feature> {
        Ok(self.codec.decode(line)?)
    }
}

/// Render a column value as the text a flat file would carry. NULL becomes empty.
pub fn value_to_token(value: ValueRef<'_>) -> String {
    match value {
        ValueRef::Null => String::new(),
        ValueRef::Integer(v) => v.to_string(),
        ValueRef::Real(v) => v.to_string(),
        ValueRef::Text(bytes) | ValueRef::Blob(bytes) => String::from_utf8_lossy(bytes).into_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::*;
    use rusqlite::Connection;

    use crate::codec::{BedCodec, ChromAliases, GenePredCodec, GenePredFlavor};

    #[fixture]
    fn conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE peaks (id INTEGER, chromEnd INTEGER, name TEXT, chrom TEXT, chromStart INTEGER, score REAL, extra BLOB);
             INSERT INTO peaks VALUES (7, 2500, 'peak_7', 'chr3', 1200, 4.5, NULL);",
        )
        .unwrap();
        conn
    }

    #[rstest]
    #[case(ValueRef::Null, "")]
    #[case(ValueRef::Integer(-42), "-42")]
    #[case(ValueRef::Real(2.5), "2.5")]
    #[case(ValueRef::Text(b"chr1"), "chr1")]
    #[case(ValueRef::Blob(b"abc"), "abc")]
    fn test_value_to_token(#[case] value: ValueRef<'static>, #[case] token: &str) {
        assert_eq!(value_to_token(value), token);
    }

    #[rstest]
    fn test_decode_with_column_map(conn: Connection) {
        let table = BackingTable::new(":memory:", "peaks").with_column_map(ColumnMap::new([
            "chrom",
            "chromStart",
            "chromEnd",
            "name",
            "score",
        ]));
        let decoder = RowDecoder::new(BedCodec::default(), &table);

        let mut statement = conn.prepare("SELECT * FROM peaks").unwrap();
        let mut rows = statement.query([]).unwrap();
        let row = rows.next().unwrap().unwrap();

        let mut columns = None;
        let region = decoder.decode(row, &mut columns).unwrap();
        assert_eq!(columns, Some(vec![3, 4, 1, 2, 5]));
        assert_eq!(region.chr, "chr3");
        assert_eq!(region.start, 1200);
        assert_eq!(region.end, 2500);
        assert_eq!(region.rest.as_deref(), Some("peak_7\t4.5"));
    }

    #[rstest]
    fn test_decode_with_column_range(conn: Connection) {
        // skip the leading id column, stop before score
        let table = BackingTable::new(":memory:", "peaks").with_column_range(2, 5);
        let decoder = RowDecoder::new(BedCodec::default(), &table);

        let mut statement = conn
            .prepare("SELECT id, chrom, chromStart, chromEnd, name, score FROM peaks")
            .unwrap();
        let mut rows = statement.query([]).unwrap();
        let row = rows.next().unwrap().unwrap();

        let mut columns = None;
        let region = decoder.decode(row, &mut columns).unwrap();
        assert_eq!(columns, Some(vec![1, 2, 3, 4]));
        assert_eq!(region.as_string(), "chr3\t1200\t2500\tpeak_7");
    }

    #[rstest]
    fn test_column_range_is_clamped_to_result_width(conn: Connection) {
        let table = BackingTable::new(":memory:", "peaks").with_column_range(2, 400);
        let decoder = RowDecoder::new(
            GenePredCodec::new(GenePredFlavor::GenePred, ChromAliases::default()),
            &table,
        );
        let statement = conn.prepare("SELECT * FROM peaks").unwrap();
        assert_eq!(decoder.resolve_columns(&statement).unwrap(), vec![1, 2, 3, 4, 5, 6]);
    }
}
