//! pytutor CLI: the user-facing command-line interface.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;
mod session;

use commands::Globals;

#[derive(Parser)]
#[command(
    name = "pytutor",
    version,
    about = "Interactive Python tutor with behavioural grading"
)]
struct Cli {
    /// Progress file (overrides the config file and PYTUTOR_PROGRESS)
    #[arg(long, global = true)]
    progress: Option<PathBuf>,

    /// Config file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start an interactive session (the default)
    Play,

    /// Grade a source file against one challenge
    Grade {
        /// Challenge ID, e.g. beginner_challenge_1
        #[arg(long)]
        challenge: String,

        /// Python source file to grade
        #[arg(long)]
        file: PathBuf,

        /// Grade without recording points or completion
        #[arg(long)]
        dry_run: bool,

        /// Output format: text, json
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Show progress statistics
    Stats {
        /// Output format: text, json, markdown
        #[arg(long, default_value = "text")]
        format: String,

        /// Write the report to a file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// List challenges and lessons with completion marks
    List {
        /// Only show one stage (beginner, intermediate, advanced)
        #[arg(long)]
        stage: Option<String>,
    },

    /// Validate catalog TOML files
    Validate {
        /// Catalog file or directory (default: configured or built-in)
        #[arg(long)]
        catalog: Option<PathBuf>,
    },

    /// Run every reference solution and check it earns full credit
    Verify {
        /// Catalog file or directory (default: configured or built-in)
        #[arg(long)]
        catalog: Option<PathBuf>,

        /// Max concurrent evaluations
        #[arg(long)]
        parallelism: Option<usize>,

        /// Save the verification report as JSON
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Create starter config and example catalog
    Init,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("pytutor=info".parse().unwrap()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let globals = Globals {
        config: cli.config,
        progress: cli.progress,
    };

    let result = match cli.command.unwrap_or(Commands::Play) {
        Commands::Play => commands::play::execute(&globals).await,
        Commands::Grade {
            challenge,
            file,
            dry_run,
            format,
        } => commands::grade::execute(&globals, challenge, file, dry_run, format).await,
        Commands::Stats { format, output } => commands::stats::execute(&globals, format, output),
        Commands::List { stage } => commands::list::execute(&globals, stage),
        Commands::Validate { catalog } => commands::validate::execute(&globals, catalog),
        Commands::Verify {
            catalog,
            parallelism,
            output,
        } => commands::verify::execute(&globals, catalog, parallelism, output).await,
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
