mod bins;
mod query;

use anyhow::Result;
use clap::Command;
use env_logger::Env;

pub mod consts {
    pub const VERSION: &str = env!("CARGO_PKG_VERSION");
    pub const PKG_NAME: &str = "binq";
    pub const BIN_NAME: &str = "binq";
}

fn build_parser() -> Command {
    Command::new(consts::BIN_NAME)
        .bin_name(consts::BIN_NAME)
        .version(consts::VERSION)
        .author("Databio")
        .about("Fetch genomic features from SQL tables by window, using UCSC bin indexing to avoid full-table scans.")
        .subcommand_required(true)
        .subcommand(query::cli::create_query_cli())
        .subcommand(bins::cli::create_bins_cli())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let app = build_parser();
    let matches = app.get_matches();

    match matches.subcommand() {
        //
        // QUERY
        //
        Some((query::cli::QUERY_CMD, matches)) => {
            query::handlers::run_query(matches)?;
        }

        //
        // BINS
        //
        Some((bins::cli::BINS_CMD, matches)) => {
            bins::handlers::run_bins(matches)?;
        }

        _ => unreachable!("Subcommand not found"),
    };

    Ok(())
}
