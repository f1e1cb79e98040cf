use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use docsearch_indexer::{CoordinatorConfig, FileDocumentSource, FileWatcher, ReindexCoordinator};
use docsearch_search::{HybridSearch, SearchConfig, SearchResponse};
use docsearch_sections::{build_toc, extract_sections};
use docsearch_vector_store::{HashingEmbedder, IndexStore, VectorizerConfig};
use output::{format_results, format_toc, print_stdout};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

mod output;

#[derive(Parser)]
#[command(name = "docsearch")]
#[command(about = "Hybrid section search for structured documents", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode: log only warnings/errors (stdout is reserved for results)
    #[arg(long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the heading tree of a document
    Toc(TocArgs),

    /// Run one query against a freshly indexed document
    Search(SearchArgs),

    /// Index a document, follow its changes and answer queries read from stdin
    Watch(WatchArgs),
}

#[derive(Args)]
struct TocArgs {
    /// Document to read
    file: PathBuf,

    /// Output JSON
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct SearchArgs {
    /// Document to search
    file: PathBuf,

    /// Free-text query
    query: String,

    /// Maximum number of results (1-100, default from config)
    #[arg(short, long)]
    limit: Option<usize>,

    #[command(flatten)]
    config: ConfigArgs,

    /// Output JSON
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct WatchArgs {
    /// Document to index and follow
    file: PathBuf,

    /// Maximum number of results per query
    #[arg(short, long)]
    limit: Option<usize>,

    #[command(flatten)]
    config: ConfigArgs,

    /// Output one JSON response per query
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct ConfigArgs {
    /// Search configuration file (TOML)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Disable vector similarity scoring
    #[arg(long)]
    no_vector: bool,

    /// Disable keyword scoring
    #[arg(long)]
    no_keyword: bool,
}

pub async fn main_entry() -> Result<()> {
    let mut cli = Cli::parse();

    let json_output = match &cli.command {
        Commands::Toc(args) => args.json,
        Commands::Search(args) => args.json,
        Commands::Watch(args) => args.json,
    };
    if json_output {
        cli.quiet = true;
    }

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();

    match cli.command {
        Commands::Toc(args) => run_toc(&args)?,
        Commands::Search(args) => run_search(&args)?,
        Commands::Watch(args) => run_watch(args).await?,
    }
    Ok(())
}

fn run_toc(args: &TocArgs) -> Result<()> {
    let text = read_document(&args.file)?;
    let toc = build_toc(&extract_sections(&text));

    if args.json {
        print_stdout(&serde_json::to_string_pretty(&toc)?)?;
    } else if toc.is_empty() {
        print_stdout("(no headings)")?;
    } else {
        print_stdout(&format_toc(&toc))?;
    }
    Ok(())
}

fn run_search(args: &SearchArgs) -> Result<()> {
    let config = load_search_config(&args.config)?;
    let text = read_document(&args.file)?;

    let store = build_store()?;
    let stats = store.rebuild(extract_sections(&text))?;
    log::info!(
        "Indexed {} sections from {}",
        stats.sections,
        args.file.display()
    );

    let engine = HybridSearch::new(store, config)?;
    let response = engine.search(&args.query, args.limit)?;
    print_response(&response, args.json)
}

async fn run_watch(args: WatchArgs) -> Result<()> {
    let config = load_search_config(&args.config)?;
    let store = build_store()?;

    let source = Arc::new(FileDocumentSource::new(&args.file));
    let coordinator =
        ReindexCoordinator::start(source, Arc::clone(&store), CoordinatorConfig::default())?;
    let initial = coordinator.refresh().await?;
    if !initial.success {
        bail!(
            "Initial index of {} failed: {}",
            args.file.display(),
            initial.error.unwrap_or_default()
        );
    }
    log::info!(
        "Indexed {} sections from {}; reading queries from stdin",
        initial.sections,
        args.file.display()
    );

    let _watcher = FileWatcher::start(&args.file, coordinator.clone())
        .with_context(|| format!("Failed to watch {}", args.file.display()))?;
    let engine = HybridSearch::new(store, config)?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let query = line.trim();
        if query.is_empty() {
            continue;
        }
        match engine.search(query, args.limit) {
            Ok(response) => print_response(&response, args.json)?,
            Err(err) if err.is_input_error() => eprintln!("Error: {err}"),
            Err(err) => return Err(err.into()),
        }
    }

    coordinator.shutdown().await?;
    Ok(())
}

fn print_response(response: &SearchResponse, json: bool) -> Result<()> {
    if json {
        print_stdout(&serde_json::to_string(response)?)
    } else {
        print_stdout(&format_results(response))
    }
}

fn read_document(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn load_search_config(args: &ConfigArgs) -> Result<SearchConfig> {
    let mut config = match &args.config {
        Some(path) => SearchConfig::from_file(path)
            .with_context(|| format!("Invalid search config {}", path.display()))?,
        None => SearchConfig::default(),
    };
    if args.no_vector {
        config.vector_enabled = false;
    }
    if args.no_keyword {
        config.keyword_enabled = false;
    }
    Ok(config)
}

fn build_store() -> Result<Arc<IndexStore>> {
    let embedder = HashingEmbedder::ready(VectorizerConfig::default())?;
    Ok(Arc::new(IndexStore::new(Arc::new(embedder))))
}
