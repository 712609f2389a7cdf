use std::path::PathBuf;
use std::process;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use wiki2rdf::config::Config;
use wiki2rdf::crawl::driver::Crawler;
use wiki2rdf::crawl::fetcher::HttpFetcher;
use wiki2rdf::error::CrawlError;
use wiki2rdf::graph::{GraphStore, SnapshotFormat, StoreOptions};

/// Crawl a Fandom-style wiki into a typed RDF entity graph.
#[derive(Parser)]
#[command(name = "wiki2rdf", version, about)]
struct Cli {
    /// TOML config file overriding the built-in defaults.
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Snapshot output path.
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Snapshot format: turtle, ntriples.
    #[arg(short, long, value_name = "FORMAT", default_value = "turtle")]
    format: String,

    /// Base IRI for minted identifiers.
    #[arg(short, long, value_name = "URI")]
    base_iri: Option<String>,

    /// Resume from an existing snapshot instead of starting fresh.
    #[arg(long)]
    resume: bool,

    /// Mutations between automatic checkpoints.
    #[arg(long, value_name = "N")]
    checkpoint_every: Option<u64>,

    /// Minimum delay between requests, in milliseconds.
    #[arg(long, value_name = "MS")]
    delay_ms: Option<u64>,

    /// Member cap for person categories.
    #[arg(long, value_name = "N")]
    category_cap: Option<usize>,

    /// Page budget for the link-following crawl (0 disables it).
    #[arg(long, value_name = "N")]
    page_budget: Option<usize>,

    /// Only assert the fixed-type seeds; no network traffic.
    #[arg(long)]
    dry_run: bool,

    /// Verbose output.
    #[arg(short, long)]
    verbose: bool,

    /// Quiet output.
    #[arg(short, long)]
    quiet: bool,
}

fn run(cli: Cli) -> Result<(), CrawlError> {
    let mut config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    if let Some(output) = cli.output {
        config.output = output;
    }
    if let Some(base_iri) = cli.base_iri {
        config.base_iri = base_iri;
    }
    if let Some(n) = cli.checkpoint_every {
        config.checkpoint_every = n;
    }
    if let Some(ms) = cli.delay_ms {
        config.request_delay_ms = ms;
    }
    if let Some(n) = cli.category_cap {
        config.category_cap = n;
    }
    if let Some(n) = cli.page_budget {
        config.page_budget = n;
    }
    let format = SnapshotFormat::from_name(&cli.format).ok_or_else(|| {
        CrawlError::Config(format!(
            "unknown format: {}. Use 'turtle' or 'ntriples'.",
            cli.format
        ))
    })?;

    let store_opts = StoreOptions {
        base_iri: config.base_iri.clone(),
        language: config.language.clone(),
        output: config.output.clone(),
        format,
        checkpoint_every: config.checkpoint_every,
    };
    let mut store = if cli.resume && config.output.exists() {
        let loaded = GraphStore::load(&config.output, store_opts)?;
        tracing::info!(
            "resumed {} ({} nodes, {} edges)",
            config.output.display(),
            loaded.node_count(),
            loaded.edge_count()
        );
        loaded
    } else {
        GraphStore::new(store_opts)
    };

    let mut fetcher = HttpFetcher::new(&config)?;
    let summary = {
        let mut crawler = Crawler::new(&config, &mut fetcher, &mut store)?;
        if cli.dry_run {
            crawler.run_offline()?
        } else {
            crawler.run()?
        }
    };

    // The final flush is unconditional: losing accumulated work silently is
    // not acceptable, so any failure here is fatal.
    let triples = store
        .checkpoint(true)?
        .unwrap_or_default();

    if !cli.quiet {
        eprintln!(
            "Wrote {triples} triples ({} nodes, {} edges) to {}",
            summary.nodes,
            summary.edges,
            config.output.display()
        );
    }
    Ok(())
}

fn main() {
    let cli = Cli::parse();
    let default_filter = if cli.verbose {
        "wiki2rdf=debug"
    } else if cli.quiet {
        "error"
    } else {
        "wiki2rdf=info"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(cli) {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}
