use std::io::{self, BufWriter, Write};

use anyhow::Result;
use clap::ArgMatches;

use binq_binning::{bin_from_range, bin_level, calculate_bins, overlapping_bins};
use binq_core::models::GenomicInterval;

pub fn run_bins(matches: &ArgMatches) -> Result<()> {
    let region = matches
        .get_one::<String>("region")
        .expect("A region is required.");
    let selection = match (matches.get_flag("single"), matches.get_flag("sweep")) {
        (true, _) => BinSelection::Single,
        (false, true) => BinSelection::Sweep,
        (false, false) => BinSelection::Overlapping,
    };

    let interval: GenomicInterval = region.parse()?;

    let stdout = io::stdout();
    let mut writer = BufWriter::new(stdout.lock());
    write_bins(&interval, selection, &mut writer)?;
    writer.flush()?;

    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinSelection {
    /// Every bin whose bucket overlaps the region.
    Overlapping,
    /// The bins of the sliding-window sweep.
    Sweep,
    /// The one bin of the region itself.
    Single,
}

///
/// Write `bin\tlevel` lines for an interval, finest level first.
///
pub fn write_bins<W: Write>(
    interval: &GenomicInterval,
    selection: BinSelection,
    writer: &mut W,
) -> Result<()> {
    let (start, end) = (interval.start, interval.end);
    let mut bins: Vec<u32> = match selection {
        BinSelection::Overlapping => overlapping_bins(start, end)?.into_iter().collect(),
        BinSelection::Sweep => calculate_bins(start, end)?.into_iter().collect(),
        BinSelection::Single => vec![bin_from_range(start, end)?],
    };
    bins.sort_by(|a, b| bin_level(*a).cmp(&bin_level(*b)).then(a.cmp(b)));

    for bin in bins {
        writeln!(writer, "{}\t{}", bin, bin_level(bin))?;
    }
    Ok(())
}
