use rusqlite::Statement;
use serde::Deserialize;

use crate::errors::{QueryError, Result};

/// Column names of the UCSC gene tables (refGene, knownGene, ...), used when a
/// descriptor does not name its own.
pub const UCSC_CHROMO_COL: &str = "chrom";
pub const UCSC_START_COL: &str = "txStart";
pub const UCSC_END_COL: &str = "txEnd";

fn default_chromosome_column() -> String {
    UCSC_CHROMO_COL.to_string()
}

fn default_start_column() -> String {
    UCSC_START_COL.to_string()
}

fn default_end_column() -> String {
    UCSC_END_COL.to_string()
}

fn default_start_col_index() -> u32 {
    1
}

fn default_end_col_index() -> u32 {
    u32::MAX
}

///
/// Ordered list of result-column labels. Rows are projected onto these labels,
/// in this order, before being handed to a codec.
///
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct ColumnMap {
    labels: Vec<String>,
}

impl ColumnMap {
    pub fn new<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ColumnMap {
            labels: labels.into_iter().map(Into::into).collect(),
        }
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    ///
    /// Resolve every label to its 0-based column index in the statement's result.
    ///
    pub fn resolve(&self, statement: &Statement<'_>) -> Result<Vec<usize>> {
        self.labels
            .iter()
            .map(|label| {
                statement.column_index(label).map_err(|_| {
                    QueryError::ConfigurationError(format!(
                        "Column {:?} not found in query result (columns: {:?})",
                        label,
                        statement.column_names()
                    ))
                })
            })
            .collect()
    }
}

///
/// Describes where features live in the backing store and how to project them.
///
/// Built once, then owned by the engine; nothing is changed after construction.
/// Defaults match the UCSC gene tables.
///
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BackingTable {
    pub(crate) locator: String,

    #[serde(rename = "name")]
    pub(crate) table_name: String,

    #[serde(default = "default_chromosome_column")]
    pub(crate) chromosome_column: String,

    #[serde(default = "default_start_column")]
    pub(crate) start_column: String,

    #[serde(default = "default_end_column")]
    pub(crate) end_column: String,

    /// Some tables carry a precomputed UCSC bin, which lets queries prune with `IN (...)`.
    #[serde(default)]
    pub(crate) bin_column: Option<String>,

    /// First column handed to the codec, 1-based like SQL.
    #[serde(default = "default_start_col_index")]
    pub(crate) start_col_index: u32,

    /// Last column handed to the codec, inclusive. Clamped to the result width.
    #[serde(default = "default_end_col_index")]
    pub(crate) end_col_index: u32,

    #[serde(default, rename = "columns")]
    pub(crate) column_map: Option<ColumnMap>,

    #[serde(default)]
    pub(crate) base_query: Option<String>,
}

impl BackingTable {
    pub fn new(locator: impl Into<String>, table_name: impl Into<String>) -> Self {
        BackingTable {
            locator: locator.into(),
            table_name: table_name.into(),
            chromosome_column: default_chromosome_column(),
            start_column: default_start_column(),
            end_column: default_end_column(),
            bin_column: None,
            start_col_index: default_start_col_index(),
            end_col_index: default_end_col_index(),
            column_map: None,
            base_query: None,
        }
    }

    pub fn with_position_columns(
        mut self,
        chromosome: impl Into<String>,
        start: impl Into<String>,
        end: impl Into<String>,
    ) -> Self {
        self.chromosome_column = chromosome.into();
        self.start_column = start.into();
        self.end_column = end.into();
        self
    }

    pub fn with_bin_column(mut self, bin_column: impl Into<String>) -> Self {
        self.bin_column = Some(bin_column.into());
        self
    }

    pub fn with_column_range(mut self, start_col_index: u32, end_col_index: u32) -> Self {
        self.start_col_index = start_col_index;
        self.end_col_index = end_col_index;
        self
    }

    pub fn with_column_map(mut self, column_map: ColumnMap) -> Self {
        self.column_map = Some(column_map);
        self
    }

    pub fn with_base_query(mut self, base_query: impl Into<String>) -> Self {
        self.base_query = Some(base_query.into());
        self
    }

    pub fn locator(&self) -> &str {
        &self.locator
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    pub fn chromosome_column(&self) -> &str {
        &self.chromosome_column
    }

    pub fn start_column(&self) -> &str {
        &self.start_column
    }

    pub fn end_column(&self) -> &str {
        &self.end_column
    }

    pub fn bin_column(&self) -> Option<&str> {
        self.bin_column.as_deref()
    }

    pub fn start_col_index(&self) -> u32 {
        self.start_col_index
    }

    pub fn end_col_index(&self) -> u32 {
        self.end_col_index
    }

    pub fn column_map(&self) -> Option<&ColumnMap> {
        self.column_map.as_ref()
    }

    ///
    /// The `SELECT` every row query is built on; `SELECT * FROM <table>` unless overridden.
    ///
    pub fn base_query(&self) -> String {
        match &self.base_query {
            Some(query) => query.trim().to_string(),
            None => format!("SELECT * FROM {}", self.table_name),
        }
    }

    ///
    /// Reject descriptors that cannot produce valid SQL or a valid projection.
    ///
    /// Table and column names are spliced into SQL text, so they are limited to
    /// plain identifiers.
    ///
    pub fn validate(&self) -> Result<()> {
        let mut identifiers = vec![
            ("table name", self.table_name.as_str()),
            ("chromosome column", self.chromosome_column.as_str()),
            ("start column", self.start_column.as_str()),
            ("end column", self.end_column.as_str()),
        ];
        if let Some(bin_column) = &self.bin_column {
            identifiers.push(("bin column", bin_column.as_str()));
        }

        for (what, value) in identifiers {
            if !is_identifier(value) {
                return Err(QueryError::ConfigurationError(format!(
                    "Invalid {} {:?} for table {:?}",
                    what, value, self.table_name
                )));
            }
        }

        if self.start_col_index == 0 {
            return Err(QueryError::ConfigurationError(format!(
                "start_col_index of table {:?} is 1-based and must be at least 1",
                self.table_name
            )));
        }

        if self.end_col_index < self.start_col_index {
            return Err(QueryError::ConfigurationError(format!(
                "end_col_index {} is before start_col_index {} for table {:?}",
                self.end_col_index, self.start_col_index, self.table_name
            )));
        }

        if self.column_map.as_ref().is_some_and(ColumnMap::is_empty) {
            return Err(QueryError::ConfigurationError(format!(
                "Column map of table {:?} is empty",
                self.table_name
            )));
        }

        if self.base_query.as_deref().is_some_and(|q| q.trim().is_empty()) {
            return Err(QueryError::ConfigurationError(format!(
                "Base query of table {:?} is empty",
                self.table_name
            )));
        }

        Ok(())
    }
}

fn is_identifier(value: &str) -> bool {
    !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
}
