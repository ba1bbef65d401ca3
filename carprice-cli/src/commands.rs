//! Subcommand handlers.

use crate::{Commands, ConfigAction};
use anyhow::Context as _;
use carprice_core::config::{CarPriceConfig, config_exists, load_config};
use carprice_core::pipeline::Pipeline;
use carprice_core::server::{self, PriceServer};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Global options shared by every subcommand.
#[derive(Debug, Clone)]
pub struct Context {
    pub workspace: PathBuf,
    pub config_file: Option<PathBuf>,
    pub artifact: Option<PathBuf>,
}

impl Context {
    /// Effective configuration with CLI overrides applied.
    pub fn config(&self) -> anyhow::Result<CarPriceConfig> {
        if self.config_file.is_none() && !config_exists(Some(&self.workspace)) {
            tracing::debug!(
                workspace = %self.workspace.display(),
                "No configuration file found; using defaults (see `carprice config init`)"
            );
        }
        let mut config = load_config(Some(&self.workspace), self.config_file.as_deref(), None)
            .map_err(|e| anyhow::anyhow!("Configuration error: {}", e))?;
        if let Some(artifact) = &self.artifact {
            config.paths.artifact = artifact.clone();
        }
        Ok(config)
    }

    fn pipeline(&self) -> anyhow::Result<Pipeline> {
        Ok(Pipeline::new(self.config()?, &self.workspace))
    }
}

pub async fn handle_command(command: Commands, ctx: &Context) -> anyhow::Result<()> {
    match command {
        Commands::Clean { input, output } => {
            let report = ctx
                .pipeline()?
                .clean(input.as_deref(), output.as_deref())
                .context("clean failed")?;
            println!(
                "Cleaned {} of {} rows ({} dropped) -> {}",
                report.kept,
                report.input_rows,
                report.dropped,
                report.output.display()
            );
            Ok(())
        }
        Commands::Train { input } => {
            let report = ctx
                .pipeline()?
                .train(input.as_deref())
                .context("train failed")?;
            println!(
                "Trained on {} rows ({} features), held out {} -> {}",
                report.train_rows,
                report.width,
                report.holdout_rows,
                report.artifact.display()
            );
            if let Some(metrics) = report.holdout_metrics {
                println!("{metrics}");
            }
            Ok(())
        }
        Commands::Evaluate { input, json } => {
            let metrics = ctx
                .pipeline()?
                .evaluate(input.as_deref())
                .context("evaluate failed")?;
            if json {
                println!("{}", serde_json::to_string_pretty(&metrics)?);
            } else {
                println!("{metrics}");
            }
            Ok(())
        }
        Commands::Predict { input, output } => {
            let report = ctx
                .pipeline()?
                .predict(input.as_deref(), output.as_deref())
                .context("predict failed")?;
            println!(
                "Priced {} rows from {} -> {}",
                report.rows,
                report.input.display(),
                report.output.display()
            );
            Ok(())
        }
        Commands::Run => {
            let report = ctx.pipeline()?.run_all().context("pipeline run failed")?;
            println!(
                "Cleaned {} rows, trained on {}, artifact at {}",
                report.clean.kept,
                report.train.train_rows,
                report.train.artifact.display()
            );
            match report.metrics {
                Some(metrics) => println!("{metrics}"),
                None => println!("No rows were held out; evaluate skipped"),
            }
            Ok(())
        }
        Commands::Serve { host, port } => handle_serve(ctx, host, port).await,
        Commands::Config { action } => handle_config(action, ctx),
    }
}

async fn handle_serve(ctx: &Context, host: Option<String>, port: Option<u16>) -> anyhow::Result<()> {
    let mut config = ctx.config()?;
    if let Some(host) = host {
        config.serve.host = host;
    }
    if let Some(port) = port {
        config.serve.port = port;
    }
    let paths = config.paths.resolved(&ctx.workspace);
    let server = Arc::new(PriceServer::new(&paths.artifact, &config.serve));
    println!(
        "Serving predictions on http://{}:{} (artifact: {})",
        config.serve.host,
        config.serve.port,
        paths.artifact.display()
    );
    server::run(server, &config.serve)
        .await
        .context("prediction server failed")
}

fn handle_config(action: ConfigAction, ctx: &Context) -> anyhow::Result<()> {
    match action {
        ConfigAction::Init => {
            let path = init_config(&ctx.workspace)?;
            println!("Configuration at: {}", path.display());
            Ok(())
        }
        ConfigAction::Show => {
            let config = ctx.config()?;
            println!("{}", toml::to_string_pretty(&config)?);
            Ok(())
        }
    }
}

/// Write the default configuration to `<workspace>/.carprice/config.toml`
/// unless a file is already there.
fn init_config(workspace: &Path) -> anyhow::Result<PathBuf> {
    let config_dir = workspace.join(".carprice");
    std::fs::create_dir_all(&config_dir)?;

    let config_path = config_dir.join("config.toml");
    if config_path.exists() {
        tracing::info!(path = %config_path.display(), "Configuration file already exists");
        return Ok(config_path);
    }

    let toml_str = toml::to_string_pretty(&CarPriceConfig::default())?;
    std::fs::write(&config_path, toml_str)?;
    tracing::info!(path = %config_path.display(), "Created default configuration");
    Ok(config_path)
}
