//! # readmegen CLI
//!
//! Prepares the file context a README generator works from.
//!
//! ## Usage
//!
//! ```bash
//! readmegen --config ./config/readmegen.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `readmegen collect <path>` | Walk a project and list the collected documents |
//! | `readmegen select <path>` | Collect, score, and select; print the report |
//! | `readmegen context <path>` | Print the context block for the selected documents |
//!
//! ## Examples
//!
//! ```bash
//! # What would be read, and what was skipped or truncated
//! readmegen collect ./my-project
//!
//! # Full report as JSON, stricter threshold
//! readmegen select ./my-project --relevance 4 --json
//!
//! # Score with a model instead of the offline heuristic
//! OPENAI_API_KEY=... readmegen context ./my-project --config ./config/readmegen.toml
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};
use readmegen::collector::Collector;
use readmegen::config::{self, Config};
use readmegen::context::format_context;
use readmegen::pipeline::{collect_root, Pipeline, PipelineOutput, PipelineRequest};
use readmegen::progress::{ProgressMode, ProgressReporter};
use readmegen::scorer::create_scorer;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// readmegen: collect, score, and select project files for README generation.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/readmegen.example.toml` for a full example. Without
/// one, the built-in defaults and the offline heuristic scorer are used.
#[derive(Parser)]
#[command(
    name = "readmegen",
    about = "Collect, score, and select project files for README generation",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Progress on stderr: off, human, or json.
    ///
    /// Defaults to human when stderr is a terminal, otherwise off.
    #[arg(long, global = true, value_parser = parse_progress)]
    progress: Option<ProgressMode>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Walk a project directory and list the collected documents.
    ///
    /// Prints the collection log (skipped directories, truncations, the
    /// size cutoff) followed by one line per document.
    Collect {
        /// Project root directory.
        path: String,

        /// Print the full collection result (documents included) as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Collect, score, and select documents; print the report.
    Select {
        /// Project root directory.
        path: String,

        /// Relevance threshold 0-5. Invalid values fall back to the
        /// configured default (3).
        #[arg(long, allow_hyphen_values = true)]
        relevance: Option<String>,

        /// Print the report as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Print the context block for the selected documents.
    Context {
        /// Project root directory.
        path: String,

        /// Relevance threshold 0-5. Invalid values fall back to the
        /// configured default (3).
        #[arg(long, allow_hyphen_values = true)]
        relevance: Option<String>,
    },
}

fn parse_progress(s: &str) -> Result<ProgressMode, String> {
    ProgressMode::parse(s).ok_or_else(|| format!("invalid progress mode '{}': use off, human, or json", s))
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .try_init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let cfg = config::load_or_default(cli.config.as_deref())?;
    let progress = cli
        .progress
        .unwrap_or_else(ProgressMode::default_for_tty)
        .reporter();

    match cli.command {
        Commands::Collect { path, json } => {
            run_collect(&cfg, &path, json, progress.as_ref())?;
        }
        Commands::Select {
            path,
            relevance,
            json,
        } => {
            let output = run_pipeline(&cfg, path, relevance, progress.as_ref()).await?;
            print_report(&output, json)?;
        }
        Commands::Context { path, relevance } => {
            let output = run_pipeline(&cfg, path, relevance, progress.as_ref()).await?;
            print!("{}", format_context(&output.selection.selected));
        }
    }

    Ok(())
}

fn run_collect(cfg: &Config, path: &str, json: bool, progress: &dyn ProgressReporter) -> Result<()> {
    let collector = Collector::from_config(cfg)?;
    let (_, collection) = collect_root(&collector, path, progress)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&collection)?);
        return Ok(());
    }

    for line in &collection.log {
        println!("{}", line);
    }
    println!();
    for doc in &collection.documents {
        let marker = if doc.truncated { "  (truncated)" } else { "" };
        println!("{:<8} {:>9}  {}{}", doc.kind.as_str(), doc.byte_size, doc.path, marker);
    }
    Ok(())
}

async fn run_pipeline(
    cfg: &Config,
    path: String,
    relevance: Option<String>,
    progress: &dyn ProgressReporter,
) -> Result<PipelineOutput> {
    let scorer = create_scorer(&cfg.scorer)?;
    let pipeline = Pipeline::from_config(cfg, scorer)?;

    let request = PipelineRequest {
        root_path: path,
        relevance_threshold: relevance,
    };
    Ok(pipeline.run(&request, progress).await?)
}

fn print_report(output: &PipelineOutput, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(&output.report)?);
        return Ok(());
    }

    let report = &output.report;
    for line in &report.logs {
        println!("{}", line);
    }
    println!();
    println!(
        "{} collected ({} bytes), {} selected at threshold {}{}",
        report.count_collected,
        report.total_bytes,
        report.count_selected,
        output.threshold,
        if report.used_fallback { " (fallback)" } else { "" }
    );
    for scored in &output.scored {
        let mark = if report.selected_paths.iter().any(|p| p == scored.path()) {
            "*"
        } else {
            " "
        };
        println!("{} {}  {}", mark, scored.score, scored.path());
    }
    Ok(())
}
