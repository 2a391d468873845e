use std::collections::HashMap;
use std::path::{Path, PathBuf};

use log::debug;
use serde::Deserialize;

use crate::codec::ChromAliases;
use crate::connection::IN_MEMORY_LOCATOR;
use crate::errors::{QueryError, Result};
use crate::table::BackingTable;

///
/// One `[[table]]` entry of a profile: where the rows are, how to project them,
/// and which format they decode as.
///
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TableEntry {
    #[serde(flatten)]
    table: BackingTable,

    format: String,

    #[serde(default)]
    feature_window_size: Option<i64>,
}

impl TableEntry {
    pub fn new(table: BackingTable, format: impl Into<String>) -> Self {
        TableEntry {
            table,
            format: format.into(),
            feature_window_size: None,
        }
    }

    pub fn with_feature_window_size(mut self, size: i64) -> Self {
        self.feature_window_size = Some(size);
        self
    }

    pub fn table(&self) -> &BackingTable {
        &self.table
    }

    pub fn name(&self) -> &str {
        self.table.table_name()
    }

    pub fn format(&self) -> &str {
        &self.format
    }

    pub fn feature_window_size(&self) -> Option<i64> {
        self.feature_window_size
    }
}

///
/// A TOML profile listing the tables of one or more databases.
///
/// ```toml
/// [aliases]
/// "1" = "chr1"
///
/// [[table]]
/// name = "refGene"
/// locator = "hg19.sqlite"
/// format = "refgene"
/// bin_column = "bin"
/// start_col_index = 2
/// ```
///
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DbProfile {
    #[serde(default)]
    aliases: HashMap<String, String>,

    #[serde(default, rename = "table")]
    tables: Vec<TableEntry>,
}

impl DbProfile {
    ///
    /// Read a profile from disk. Relative locators are resolved against the
    /// profile's directory.
    ///
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let mut profile = DbProfile::from_toml(&text)?;

        if let Some(base) = path.parent() {
            for entry in profile.tables.iter_mut() {
                let locator = &mut entry.table.locator;
                if locator.as_str() != IN_MEMORY_LOCATOR && Path::new(locator.as_str()).is_relative() {
                    let resolved: PathBuf = base.join(locator.as_str());
                    *locator = resolved.to_string_lossy().into_owned();
                }
            }
        }

        debug!("Loaded {} table(s) from {}", profile.tables.len(), path.display());
        Ok(profile)
    }

    pub fn from_toml(text: &str) -> Result<Self> {
        let profile: DbProfile = toml::from_str(text)
            .map_err(|e| QueryError::ConfigurationError(format!("Invalid profile: {}", e)))?;

        for entry in &profile.tables {
            entry.table.validate()?;
        }
        Ok(profile)
    }

    pub fn tables(&self) -> &[TableEntry] {
        &self.tables
    }

    ///
    /// Look up a table by name.
    ///
    pub fn table(&self, name: &str) -> Result<&TableEntry> {
        self.tables
            .iter()
            .find(|entry| entry.name() == name)
            .ok_or_else(|| {
                QueryError::ConfigurationError(format!("Table {:?} not found in profile", name))
            })
    }

    pub fn aliases(&self) -> ChromAliases {
        ChromAliases::new(self.aliases.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::*;
    use std::io::Write;

    use crate::table::ColumnMap;

    const PROFILE: &str = r#"
[aliases]
"1" = "chr1"

[[table]]
name = "refGene"
locator = "hg19.sqlite"
format = "refgene"
bin_column = "bin"
start_col_index = 2
feature_window_size = 5000000

[[table]]
name = "peaks"
locator = ":memory:"
format = "bed"
chromosome_column = "chrom"
start_column = "chromStart"
end_column = "chromEnd"
columns = ["chrom", "chromStart", "chromEnd", "name"]
"#;

    #[rstest]
    fn test_profile_from_toml() {
        let profile = DbProfile::from_toml(PROFILE).unwrap();
        assert_eq!(profile.tables().len(), 2);

        let ref_gene = profile.table("refGene").unwrap();
        assert_eq!(ref_gene.format(), "refgene");
        assert_eq!(ref_gene.feature_window_size(), Some(5_000_000));
        assert_eq!(
            ref_gene.table(),
            &BackingTable::new("hg19.sqlite", "refGene")
                .with_bin_column("bin")
                .with_column_range(2, u32::MAX)
        );

        let peaks = profile.table("peaks").unwrap();
        assert_eq!(peaks.feature_window_size(), None);
        assert_eq!(
            peaks.table(),
            &BackingTable::new(":memory:", "peaks")
                .with_position_columns("chrom", "chromStart", "chromEnd")
                .with_column_map(ColumnMap::new(["chrom", "chromStart", "chromEnd", "name"]))
        );

        assert_eq!(profile.aliases().canonical("1"), "chr1");
    }

    #[rstest]
    fn test_profile_unknown_table() {
        let profile = DbProfile::from_toml(PROFILE).unwrap();
        assert!(matches!(
            profile.table("knownGene"),
            Err(QueryError::ConfigurationError(_))
        ));
    }

    #[rstest]
    #[case("[[table]]\nname = \"refGene\"\nformat = \"bed\"\n")]
    #[case("[[table]]\nname = \"ref Gene\"\nlocator = \"x\"\nformat = \"bed\"\n")]
    #[case("[[table]]\nname = \"refGene\"\nlocator = \"x\"\nformat = \"bed\"\nstart_col_index = 0\n")]
    #[case("this is not toml")]
    fn test_profile_invalid(#[case] text: &str) {
        assert!(matches!(
            DbProfile::from_toml(text),
            Err(QueryError::ConfigurationError(_))
        ));
    }

    #[rstest]
    fn test_profile_from_path_resolves_locators() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(PROFILE.as_bytes()).unwrap();

        let profile = DbProfile::from_path(file.path()).unwrap();
        let expected = file.path().parent().unwrap().join("hg19.sqlite");
        assert_eq!(
            profile.table("refGene").unwrap().table().locator(),
            expected.to_string_lossy()
        );
        assert_eq!(profile.table("peaks").unwrap().table().locator(), ":memory:");
    }

    #[rstest]
    fn test_profile_from_missing_path() {
        assert!(matches!(
            DbProfile::from_path("/definitely/not/here.toml"),
            Err(QueryError::Io(_))
        ));
    }
}
