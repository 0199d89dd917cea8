use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::error;

use pdsp::cli::{classify_command, inspect_command, process_command};
use pdsp::logging::init_logging;
use pdsp::{Pipeline, PipelineConfig};

#[derive(Parser)]
#[command(name = "pdsp")]
#[command(about = "Turn vendor datasheets into canonical product and spec records")]
#[command(version)]
struct Cli {
    /// TOML configuration file (defaults plus PDSP_* environment otherwise)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log level for the pdsp target
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract products from every datasheet in a directory
    Process {
        /// Directory of .pdf / .txt datasheets
        dir: PathBuf,

        /// Write JSON Lines here instead of stdout
        #[arg(long)]
        jsonl: Option<PathBuf>,

        /// Also write a pretty JSON array
        #[arg(long)]
        json: Option<PathBuf>,

        /// Skip table-grid reconstruction
        #[arg(long)]
        no_tables: bool,

        /// Emit nothing for unrecognized documents
        #[arg(long)]
        strict: bool,

        /// Parallel document workers
        #[arg(short, long)]
        workers: Option<usize>,
    },
    /// Show the document kind and score breakdown
    Classify {
        file: PathBuf,
    },
    /// Dump variant rows, matrix and products for one page
    Inspect {
        file: PathBuf,

        /// 1-based page number
        #[arg(short, long, default_value_t = 1)]
        page: u32,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => {
            let mut config = PipelineConfig::load_from_file(path)?;
            config.apply_env();
            config
        }
        None => PipelineConfig::load_from_env(),
    };
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }

    if let Commands::Process {
        no_tables,
        strict,
        workers,
        ..
    } = &cli.command
    {
        if *no_tables {
            config.extraction.enable_table_grid = false;
        }
        if *strict {
            config.extraction.strict = true;
        }
        if let Some(workers) = workers {
            config.processing.parallel_workers = (*workers).max(1);
        }
    }

    let _log_guard = init_logging(&config.logging)?;
    let pipeline = Pipeline::new(config)?;

    let result = match cli.command {
        Commands::Process { dir, jsonl, json, .. } => process_command(&pipeline, dir, jsonl, json),
        Commands::Classify { file } => classify_command(&pipeline, file),
        Commands::Inspect { file, page } => inspect_command(&pipeline, file, page),
    };

    if let Err(e) = &result {
        error!("{:#}", e);
    }
    result
}
