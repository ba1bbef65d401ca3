//! carprice CLI: runs the Clean, Train, Evaluate and Predict stages and the
//! prediction server.

mod commands;

use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// carprice: used-car resale price prediction
#[derive(Parser, Debug)]
#[command(name = "carprice", version, about, long_about = None)]
struct Cli {
    /// Workspace directory; relative data and model paths resolve against it
    #[arg(short, long, default_value = ".")]
    workspace: PathBuf,

    /// Additional configuration file merged over the workspace config
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Model artifact path (overrides paths.artifact)
    #[arg(long)]
    artifact: Option<PathBuf>,

    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Validate raw listings and write the cleaned dataset
    Clean {
        /// Raw CSV (defaults to paths.raw_data)
        #[arg(short, long)]
        input: Option<PathBuf>,
        /// Cleaned CSV (defaults to paths.cleaned_data)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Fit the transformer and regressor and persist the model artifact
    Train {
        /// Cleaned CSV (defaults to paths.cleaned_data)
        #[arg(short, long)]
        input: Option<PathBuf>,
    },
    /// Report MAE, RMSE and R² of the persisted artifact
    Evaluate {
        /// Labelled CSV (defaults to the held-out set written by train)
        #[arg(short, long)]
        input: Option<PathBuf>,
        /// Print metrics as JSON
        #[arg(long)]
        json: bool,
    },
    /// Price unlabelled listings from a CSV file
    Predict {
        /// Input CSV (defaults to the latest file in paths.new_data_dir)
        #[arg(short, long)]
        input: Option<PathBuf>,
        /// Output CSV (defaults to paths.predictions_dir/paths.predictions_file)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Run clean, train and evaluate in order
    Run,
    /// Start the HTTP prediction server
    Serve {
        #[arg(long)]
        host: Option<String>,
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(clap::Subcommand, Debug)]
enum ConfigAction {
    /// Create a default workspace configuration file
    Init,
    /// Show the effective configuration
    Show,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 if cli.quiet => "error",
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::new(filter));

    let log_dir = directories::ProjectDirs::from("dev", "carprice", "carprice")
        .map(|d| d.data_dir().join("logs"))
        .unwrap_or_else(|| PathBuf::from("."));
    let _ = std::fs::create_dir_all(&log_dir);
    let file_appender = tracing_appender::rolling::daily(&log_dir, "carprice.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let json_layer = tracing_subscriber::fmt::layer()
        .json()
        .with_writer(non_blocking)
        .with_filter(EnvFilter::new("debug"));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let workspace = cli
        .workspace
        .canonicalize()
        .unwrap_or_else(|_| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));

    let context = commands::Context {
        workspace,
        config_file: cli.config,
        artifact: cli.artifact,
    };
    commands::handle_command(cli.command, &context).await
}
