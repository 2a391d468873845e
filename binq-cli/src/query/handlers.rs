use std::io::{self, BufWriter, Write};

use anyhow::Result;
use clap::ArgMatches;
use log::info;

use binq_core::models::{GenomicInterval, Region};
use binq_query::{ConnectionManager, DbProfile, FeatureSource, OverlapQueryEngine};

pub fn run_query(matches: &ArgMatches) -> Result<()> {
    let profile_path = matches
        .get_one::<String>("profile")
        .expect("A path to a profile is required.");

    let table_name = matches
        .get_one::<String>("table")
        .expect("A table name is required.");

    let region = matches.get_one::<String>("region");
    let names = matches.get_flag("names");
    let scan = matches.get_flag("scan");

    let profile = DbProfile::from_path(profile_path)?;
    let entry = profile.table(table_name)?;
    let aliases = profile.aliases();
    let locator = entry.table().locator().to_string();

    let mut connections = ConnectionManager::new();
    {
        let conn = connections.get_connection(&locator)?;
        let mut engine = OverlapQueryEngine::from_entry(conn, entry, Some(&aliases))?;

        let stdout = io::stdout();
        let mut writer = BufWriter::new(stdout.lock());

        if names {
            write_sequence_names(&engine, &mut writer)?;
        } else if scan {
            let written = write_features(engine.iterator()?, &mut writer)?;
            info!("Wrote {} features from {}", written, table_name);
        } else {
            let region = region.ok_or_else(|| {
                anyhow::anyhow!("A region (-r chr:start-end) is required unless --names or --scan is given")
            })?;
            let interval: GenomicInterval = region.parse()?;
            let written = write_region(&mut engine, &interval, &mut writer)?;
            info!("Wrote {} features overlapping {}", written, interval);
        }

        writer.flush()?;
        engine.close();
    }
    connections.close_connection(&locator)?;

    Ok(())
}

///
/// Write every feature of `source` overlapping `interval`, one line each.
///
pub fn write_region<W: Write>(
    source: &mut dyn FeatureSource<Feature = Region>,
    interval: &GenomicInterval,
    writer: &mut W,
) -> Result<usize> {
    let features = source.features(&interval.chr, interval.start, interval.end)?;
    write_features(features, writer)
}

pub fn write_features<I, W>(features: I, writer: &mut W) -> Result<usize>
where
    I: Iterator<Item = binq_query::Result<Region>>,
    W: Write,
{
    let mut written = 0;
    for feature in features {
        writeln!(writer, "{}", feature?)?;
        written += 1;
    }
    Ok(written)
}

pub fn write_sequence_names<W: Write>(
    source: &dyn FeatureSource<Feature = Region>,
    writer: &mut W,
) -> Result<()> {
    let mut names = source.sequence_names()?;
    names.sort();
    for name in names {
        writeln!(writer, "{}", name)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::*;
    use rusqlite::Connection;

    use binq_query::{BackingTable, codec_for_format};

    #[fixture]
    fn conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE peaks (chrom TEXT, chromStart INTEGER, chromEnd INTEGER, name TEXT);
             INSERT INTO peaks VALUES ('chr1', 100, 200, 'a');
             INSERT INTO peaks VALUES ('chr1', 150, 400, 'b');
             INSERT INTO peaks VALUES ('chr2', 100, 200, 'c');",
        )
        .unwrap();
        conn
    }

    fn peaks() -> BackingTable {
        BackingTable::new(":memory:", "peaks").with_position_columns("chrom", "chromStart", "chromEnd")
    }

    #[rstest]
    fn test_write_region(conn: Connection) {
        let mut engine =
            OverlapQueryEngine::new(&conn, peaks(), codec_for_format("bed", None).unwrap()).unwrap();
        let interval: GenomicInterval = "chr1:120-160".parse().unwrap();

        let mut out = Vec::new();
        let written = write_region(&mut engine, &interval, &mut out).unwrap();

        assert_eq!(written, 2);
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "chr1\t100\t200\ta\nchr1\t150\t400\tb\n"
        );
    }

    #[rstest]
    fn test_write_sequence_names(conn: Connection) {
        let engine =
            OverlapQueryEngine::new(&conn, peaks(), codec_for_format("bed", None).unwrap()).unwrap();

        let mut out = Vec::new();
        write_sequence_names(&engine, &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "chr1\nchr2\n");
    }

    #[rstest]
    fn test_write_scan(conn: Connection) {
        let mut engine =
            OverlapQueryEngine::new(&conn, peaks(), codec_for_format("bed", None).unwrap()).unwrap();
        engine.set_feature_window_size(2);

        let mut out = Vec::new();
        let written = write_features(engine.iterator().unwrap(), &mut out).unwrap();
        assert_eq!(written, 2);
    }
}
