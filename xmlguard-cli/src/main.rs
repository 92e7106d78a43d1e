use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::process::ExitCode;

mod check;
mod decide;

use check::run_check;
use decide::run_decide;

#[derive(Parser, Debug)]
#[command(name = "xmlguard", version)]
#[command(about = "xmlguard CLI - XML external entity resolution checks")]
struct Cli {
    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Json, global = true)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Decide a single entity reference
    Decide {
        /// System identifier reported by the parser (omit to test an absent one)
        #[arg(long)]
        system_id: Option<String>,
        /// Public identifier reported by the parser
        #[arg(long)]
        public_id: Option<String>,
    },
    /// Scan XML files and reject those with disallowed external references
    Check {
        /// Files to scan
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Print one JSON report per file
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum LogFormat {
    Json,
    Pretty,
}

fn init_logging(format: LogFormat) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr);
    let _ = match format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
    };
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.log_format);

    let success = match cli.command {
        Commands::Decide {
            system_id,
            public_id,
        } => run_decide(public_id.as_deref(), system_id.as_deref()),
        Commands::Check { files, json } => run_check(&files, json),
    };

    if success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
