use crate::CLAP_STYLING;
use crate::config::DEFAULT_CONFIG_PATH;
use clap::arg;
use std::path::PathBuf;

pub fn command_argument_builder() -> clap::Command {
    clap::Command::new("scangraph")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("scangraph")
        .about("Loads httpx-style JSON Lines scan results into a Neo4j graph")
        .styles(CLAP_STYLING)
        .arg(
            arg!(-f --"file" <PATH>)
                .required(true)
                .help("Path to the JSON file (JSON Lines format expected)")
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            arg!(-c --"config" <PATH>)
                .required(false)
                .help("Location of the Neo4j connection config; created on first run")
                .default_value(DEFAULT_CONFIG_PATH),
        )
        .arg(
            arg!(--"dry-run")
                .required(false)
                .help("Map records into an in-memory graph and print counts instead of writing to Neo4j")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(arg!(-q --"quiet" "Suppress the per-record success lines").required(false))
        .arg(arg!(-v --"verbose" "Enable debug logging").required(false))
}
