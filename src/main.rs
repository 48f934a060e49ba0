//! CLI entry point for postrev

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use postrev::commands::scan::Overrides;
use postrev::detect::Metric;

#[derive(Parser)]
#[command(name = "postrev")]
#[command(version)]
#[command(about = "Find duplicate and near-duplicate blog post revisions", long_about = None)]
struct Cli {
    /// Set the base directory (defaults to current directory)
    #[arg(short, long, global = true)]
    cwd: Option<PathBuf>,

    /// Enable debug output
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Group post revisions and print the JSON report
    #[command(alias = "s")]
    Scan {
        /// Write the report to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Similarity threshold in [0, 1]
        #[arg(short, long)]
        threshold: Option<f64>,

        /// Similarity metric
        #[arg(short, long, value_enum)]
        metric: Option<Metric>,

        /// Score pairs on a single thread
        #[arg(long)]
        sequential: bool,

        /// Rescan on file changes
        #[arg(short, long)]
        watch: bool,
    },

    /// List site information
    List {
        /// What to list (classes, documents, failures)
        #[arg(default_value = "classes")]
        r#type: String,
    },

    /// Show similarity scores for two posts
    Compare { a: PathBuf, b: PathBuf },

    /// Show a line diff of two posts' bodies
    Diff {
        a: PathBuf,
        b: PathBuf,

        /// Only count changed lines
        #[arg(long)]
        stat: bool,
    },

    /// Display version information
    Version,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.debug {
        "postrev=debug,info"
    } else {
        "postrev=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Determine base directory
    let base_dir = match cli.cwd {
        Some(dir) => dir,
        None => std::env::current_dir()?,
    };

    match cli.command {
        Commands::Scan {
            output,
            threshold,
            metric,
            sequential,
            watch,
        } => {
            let overrides = Overrides {
                threshold,
                metric,
                sequential,
            };
            let mut site = postrev::Site::new(&base_dir)?;
            overrides.apply(&mut site.config);
            site.config.validate()?;

            tracing::info!("Scanning {:?}", site.source_dir);
            postrev::commands::scan::run(&site, output.as_deref())?;

            if watch {
                postrev::commands::scan::watch(&site, overrides, output.as_deref())?;
            }
        }

        Commands::List { r#type } => {
            let site = postrev::Site::new(&base_dir)?;
            postrev::commands::list::run(&site, &r#type)?;
        }

        Commands::Compare { a, b } => {
            let site = postrev::Site::new(&base_dir)?;
            postrev::commands::compare::run(&site, &a, &b)?;
        }

        Commands::Diff { a, b, stat } => {
            postrev::commands::compare::diff(&a, &b, stat)?;
        }

        Commands::Version => {
            println!("postrev version {}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
