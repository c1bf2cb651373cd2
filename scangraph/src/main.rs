use colored::Colorize;
use scangraph::commands::command_argument_builder;
use scangraph::{RunOptions, handle_ingest, init_tracing};

#[tokio::main]
async fn main() {
    let matches = command_argument_builder().get_matches();
    let options = RunOptions::from_matches(&matches);
    init_tracing(options.verbose);

    if let Err(e) = handle_ingest(&options).await {
        eprintln!("{} {:#}", "✗".red().bold(), e);
        std::process::exit(1);
    }
}
