use clap::{Command, arg};

pub use binq_binning::consts::BINS_CMD;

pub fn create_bins_cli() -> Command {
    Command::new(BINS_CMD)
        .author("Databio")
        .about("Print the UCSC bins whose buckets overlap a region")
        .arg_required_else_help(true)
        .arg(arg!(-r --region <region> "Region, e.g. chr1:10,000-20,000").required(true))
        .arg(arg!(--single "Only print the smallest bin fully containing the region"))
        .arg(arg!(--sweep "Print the bins found by the sliding-window sweep instead"))
}
