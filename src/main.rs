use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use cartograph::{ExtractorRegistry, GraphStore, Indexer, Navigator, DB_FILE_NAME};

#[derive(Debug, Parser)]
#[command(
    name = "cartograph",
    version = "0.1.0",
    author = "cartograph developers",
    about = "Navigable structural graph of your codebase"
)]
struct Cli {
    /// Project directory (default: current directory)
    #[arg(short, long, global = true, value_name = "DIR")]
    project: Option<PathBuf>,

    /// Log filter, e.g. "info" or "cartograph=debug"
    #[arg(long, global = true, value_name = "FILTER", default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Build or update the index
    Index {
        /// Only re-extract files whose content hash changed
        #[arg(short, long)]
        incremental: bool,
    },
    /// Show aggregate counts for the project or a subtree
    Map {
        /// Node path (default: project root)
        path: Option<String>,
    },
    /// List the immediate children of a node
    Expand { path: String },
    /// Show entity detail with calls and called_by
    Inspect { id: String },
    /// Keyword search over names, signatures, and docstrings
    Search {
        query: String,
        #[arg(short, long, default_value_t = 10)]
        limit: usize,
    },
    /// Direct subclasses of a class name
    Hierarchy { class_name: String },
    /// Print file contents, optionally a line range
    Read {
        file: String,
        #[arg(long)]
        start: Option<usize>,
        #[arg(long)]
        end: Option<usize>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);
    run(cli)
}

fn init_tracing(level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.to_string()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let project = match cli.project {
        Some(path) => path,
        None => std::env::current_dir()?,
    };
    let project = project.canonicalize()?;
    if !project.is_dir() {
        bail!("{} is not a directory", project.display());
    }
    let db_path = project.join(DB_FILE_NAME);

    match cli.command {
        Command::Index { incremental } => {
            let store = GraphStore::open(&db_path)?;
            let indexer = Indexer::new(project.clone(), ExtractorRegistry::with_defaults());
            println!("Indexing {}...", project.display());
            let report = indexer.run(&store, incremental)?;
            for warning in &report.warnings {
                eprintln!("warning: {warning}");
            }
            println!(
                "Indexed {} files ({} unchanged, {} removed, {} skipped) in {}ms",
                report.files_indexed,
                report.files_unchanged,
                report.files_removed,
                report.files_skipped,
                report.elapsed_ms
            );
            println!(
                "Entities: {}  Edges: {} resolved / {} ambiguous / {} unresolved",
                report.entities,
                report.edges_resolved,
                report.edges_ambiguous,
                report.edges_unresolved
            );
            println!("Database: {}", db_path.display());
        }
        command => {
            if !db_path.exists() {
                bail!(
                    "no index found at {}. Run `cartograph index` first.",
                    db_path.display()
                );
            }
            let store = GraphStore::open(&db_path)?;
            let navigator = Navigator::new(project, store)?;
            match command {
                Command::Index { .. } => unreachable!(),
                Command::Map { path } => {
                    let view = navigator.map(path.as_deref())?;
                    println!("{}", serde_json::to_string_pretty(&view)?);
                }
                Command::Expand { path } => {
                    let view = navigator.expand(&path)?;
                    println!("{}", serde_json::to_string_pretty(&view)?);
                }
                Command::Inspect { id } => {
                    let view = navigator.inspect(&id)?;
                    println!("{}", serde_json::to_string_pretty(&view)?);
                }
                Command::Search { query, limit } => {
                    let hits = navigator.search(&query, limit)?;
                    println!("{}", serde_json::to_string_pretty(&hits)?);
                }
                Command::Hierarchy { class_name } => {
                    let view = navigator.hierarchy(&class_name)?;
                    println!("{}", serde_json::to_string_pretty(&view)?);
                }
                Command::Read { file, start, end } => {
                    let text = navigator.read(&file, start, end)?;
                    println!("{text}");
                }
            }
        }
    }
    Ok(())
}
