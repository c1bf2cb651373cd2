use crate::config::{self, ConfigSource};
use anyhow::{Context, Result};
use clap::ArgMatches;
use colored::Colorize;
use scangraph_core::store::GraphSummary;
use scangraph_core::{
    ConnectionConfig, GraphStore, IngestError, IngestEvent, IngestStats, MemoryGraph, Neo4jStore,
    ingest,
};
use std::fs::File;
use std::io::{self, BufReader, Write};
use std::path::{Path, PathBuf};
use tracing::{Level, info};

/// Everything the run needs, pulled out of the parsed arguments.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub file: PathBuf,
    pub config_path: PathBuf,
    pub dry_run: bool,
    pub quiet: bool,
    pub verbose: bool,
}

impl RunOptions {
    pub fn from_matches(matches: &ArgMatches) -> Self {
        // Both have defaults or are required, so clap guarantees presence.
        let file = matches
            .get_one::<PathBuf>("file")
            .cloned()
            .unwrap_or_default();
        let config_path = matches
            .get_one::<String>("config")
            .map(|raw| config::expand_path(raw))
            .unwrap_or_else(|| config::expand_path(config::DEFAULT_CONFIG_PATH));

        Self {
            file,
            config_path,
            dry_run: matches.get_flag("dry-run"),
            quiet: matches.get_flag("quiet"),
            verbose: matches.get_flag("verbose"),
        }
    }
}

pub fn init_tracing(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .init();
}

fn print_prompt(msg: &str) -> io::Result<String> {
    print!("{} ", msg.bright_cyan().bold());
    io::stdout().flush()?;
    let mut response = String::new();
    io::stdin().read_line(&mut response)?;
    Ok(response)
}

/// Load the connection config, prompting on stdin the first time.
pub fn resolve_connection(path: &Path) -> Result<ConnectionConfig> {
    let (config, source) = config::load_or_create(path, print_prompt)
        .context("Error loading Neo4j configuration")?;
    if source == ConfigSource::Created {
        println!(
            "{} Configuration file created at {}",
            "✓".green().bold(),
            path.display().to_string().bright_white()
        );
    }
    Ok(config)
}

pub fn open_input(path: &Path) -> Result<BufReader<File>> {
    let file = File::open(path)
        .with_context(|| format!("Error opening JSON file {}", path.display()))?;
    Ok(BufReader::new(file))
}

fn print_event(event: &IngestEvent<'_>, quiet: bool, target: &str) {
    // Failures are already logged by the ingest loop.
    if let IngestEvent::Upserted { url, .. } = event {
        if !quiet {
            println!("{} Added to {}: {}", "✓".green().bold(), target, url);
        }
    }
}

/// Human-readable completion summary.
pub fn format_summary(stats: &IngestStats, graph: Option<&GraphSummary>) -> String {
    let mut report = String::new();
    report.push_str(&format!("  Lines read: {}\n", stats.lines_read));
    report.push_str(&format!("  Records upserted: {}\n", stats.upserted));
    report.push_str(&format!("  Decode failures: {}\n", stats.decode_failures));
    report.push_str(&format!("  Upsert failures: {}\n", stats.upsert_failures));
    if stats.blank > 0 {
        report.push_str(&format!("  Blank lines skipped: {}\n", stats.blank));
    }
    if let Some(graph) = graph {
        report.push_str(&format!(
            "  Nodes: {} (Host {}, IP {}, Tech {}, ASN {})\n",
            graph.nodes(),
            graph.hosts,
            graph.ips,
            graph.techs,
            graph.asns
        ));
        report.push_str(&format!(
            "  Relationships: {} (RESOLVES_TO {}, USES {}, BELONGS_TO {})\n",
            graph.relationships(),
            graph.resolves_to,
            graph.uses,
            graph.belongs_to
        ));
    }
    report
}

async fn run_ingest<S: GraphStore>(
    reader: BufReader<File>,
    store: &mut S,
    quiet: bool,
    target: &str,
) -> Result<IngestStats> {
    match ingest(reader, store, |event| print_event(&event, quiet, target)).await {
        Ok(stats) => Ok(stats),
        Err(e) => {
            let IngestError::Read { processed, .. } = &e;
            eprint!("{}", format_summary(processed, None));
            Err(e).context("Error reading file")
        }
    }
}

/// Run one ingest pass as described by `options`.
pub async fn handle_ingest(options: &RunOptions) -> Result<IngestStats> {
    if options.dry_run {
        let reader = open_input(&options.file)?;
        let mut graph = MemoryGraph::new();
        let stats = run_ingest(reader, &mut graph, options.quiet, "graph").await?;

        println!("\n{} Dry run complete, nothing written to Neo4j\n", "✓".green().bold());
        print!("{}", format_summary(&stats, Some(&graph.summary())));
        return Ok(stats);
    }

    let connection = resolve_connection(&options.config_path)?;
    let reader = open_input(&options.file)?;
    let mut store = Neo4jStore::connect(&connection)
        .await
        .with_context(|| format!("Error connecting to Neo4j at {}", connection.uri))?;

    info!(file = %options.file.display(), "loading scan results");
    let stats = run_ingest(reader, &mut store, options.quiet, "Neo4j").await?;

    println!("\n{} JSON data successfully processed into Neo4j!\n", "✓".green().bold());
    print!("{}", format_summary(&stats, None));
    Ok(stats)
}
