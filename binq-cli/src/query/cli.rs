use clap::{Command, arg};

pub use binq_query::consts::QUERY_CMD;

pub fn create_query_cli() -> Command {
    Command::new(QUERY_CMD)
        .author("Databio")
        .about("Print the features of a table that overlap a region")
        .arg_required_else_help(true)
        .arg(arg!(-p --profile <profile> "TOML profile describing the tables").required(true))
        .arg(arg!(-t --table <table> "Name of the table in the profile").required(true))
        .arg(arg!(-r --region <region> "Region to query, e.g. chr1:10,000-20,000"))
        .arg(arg!(--names "List the sequence names present in the table instead"))
        .arg(arg!(--scan "Print the first features of the table, up to the window size"))
}
