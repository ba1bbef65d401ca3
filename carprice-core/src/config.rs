//! Configuration for the carprice pipeline and server.
//!
//! Layered with figment: defaults, then the user config file, then the
//! workspace `.carprice/config.toml`, then `CARPRICE_*` environment
//! variables, then explicit overrides.

use crate::features::{RareCategoryPolicy, TransformerConfig, ZeroVariancePolicy};
use crate::record::CategoricalColumn;
use crate::regressor::GbdtParams;
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CarPriceConfig {
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub features: FeaturesConfig,
    #[serde(default)]
    pub training: TrainingConfig,
    #[serde(default)]
    pub serve: ServeConfig,
}

/// File locations. Relative paths resolve against the workspace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub raw_data: PathBuf,
    pub cleaned_data: PathBuf,
    pub holdout_data: PathBuf,
    pub artifact: PathBuf,
    pub new_data_dir: PathBuf,
    pub predictions_dir: PathBuf,
    pub predictions_file: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            raw_data: PathBuf::from("data/raw/cars24_raw.csv"),
            cleaned_data: PathBuf::from("data/processed/cars24_clean.csv"),
            holdout_data: PathBuf::from("data/processed/cars24_holdout.csv"),
            artifact: PathBuf::from("models/car_price_model.json"),
            new_data_dir: PathBuf::from("data/new_data"),
            predictions_dir: PathBuf::from("data/predictions"),
            predictions_file: "predicted_output.csv".to_string(),
        }
    }
}

impl PathsConfig {
    /// Return a copy with every relative path joined onto `workspace`.
    pub fn resolved(&self, workspace: &Path) -> Self {
        let join = |p: &Path| {
            if p.is_absolute() {
                p.to_path_buf()
            } else {
                workspace.join(p)
            }
        };
        Self {
            raw_data: join(&self.raw_data),
            cleaned_data: join(&self.cleaned_data),
            holdout_data: join(&self.holdout_data),
            artifact: join(&self.artifact),
            new_data_dir: join(&self.new_data_dir),
            predictions_dir: join(&self.predictions_dir),
            predictions_file: self.predictions_file.clone(),
        }
    }

    pub fn predictions_output(&self) -> PathBuf {
        self.predictions_dir.join(&self.predictions_file)
    }
}

/// Feature transformer options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeaturesConfig {
    /// Values seen fewer times than this are collapsed to `Other`.
    pub rare_threshold: usize,
    pub rare_columns: Vec<CategoricalColumn>,
    pub zero_variance: ZeroVariancePolicy,
}

impl Default for FeaturesConfig {
    fn default() -> Self {
        let rare = RareCategoryPolicy::default();
        Self {
            rare_threshold: rare.threshold,
            rare_columns: rare.columns,
            zero_variance: ZeroVariancePolicy::default(),
        }
    }
}

impl FeaturesConfig {
    pub fn rare_policy(&self) -> RareCategoryPolicy {
        RareCategoryPolicy::new(self.rare_threshold, self.rare_columns.clone())
    }

    pub fn transformer_config(&self) -> TransformerConfig {
        TransformerConfig {
            rare: self.rare_policy(),
            zero_variance: self.zero_variance,
        }
    }
}

/// Split and regressor settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    /// Fraction of cleaned rows held out from training.
    pub test_fraction: f64,
    pub seed: u64,
    pub n_trees: u32,
    pub max_depth: u32,
    pub learning_rate: f64,
    pub reg_lambda: f64,
    pub min_child_weight: f64,
    pub min_split_gain: f64,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        let gbdt = GbdtParams::default();
        Self {
            test_fraction: 0.2,
            seed: 42,
            n_trees: gbdt.n_trees,
            max_depth: gbdt.max_depth,
            learning_rate: gbdt.learning_rate,
            reg_lambda: gbdt.reg_lambda,
            min_child_weight: gbdt.min_child_weight,
            min_split_gain: gbdt.min_split_gain,
        }
    }
}

impl TrainingConfig {
    pub fn gbdt_params(&self) -> GbdtParams {
        GbdtParams {
            n_trees: self.n_trees,
            max_depth: self.max_depth,
            learning_rate: self.learning_rate,
            reg_lambda: self.reg_lambda,
            min_child_weight: self.min_child_weight,
            min_split_gain: self.min_split_gain,
        }
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServeConfig {
    pub host: String,
    pub port: u16,
    /// Largest accepted `/predict` batch.
    pub max_batch: usize,
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            max_batch: 1000,
        }
    }
}

impl ServeConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.host, self.port).parse()
    }
}

fn user_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("dev", "carprice", "carprice")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}

fn workspace_config_path(workspace: &Path) -> PathBuf {
    workspace.join(".carprice").join("config.toml")
}

/// Load configuration from all layers.
///
/// `extra` is an additional TOML file (the CLI's `--config`) merged after
/// the workspace file.
pub fn load_config(
    workspace: Option<&Path>,
    extra: Option<&Path>,
    overrides: Option<&CarPriceConfig>,
) -> Result<CarPriceConfig, Box<figment::Error>> {
    let mut figment = Figment::from(Serialized::defaults(CarPriceConfig::default()));

    if let Some(user_config) = user_config_path() {
        if user_config.exists() {
            figment = figment.merge(Toml::file(&user_config));
        }
    }

    if let Some(ws) = workspace {
        let ws_config = workspace_config_path(ws);
        if ws_config.exists() {
            figment = figment.merge(Toml::file(&ws_config));
        }
    }

    if let Some(extra) = extra {
        figment = figment.merge(Toml::file(extra));
    }

    // CARPRICE_TRAINING__N_TREES, CARPRICE_SERVE__PORT, ...
    figment = figment.merge(Env::prefixed("CARPRICE_").split("__"));

    if let Some(overrides) = overrides {
        figment = figment.merge(Serialized::defaults(overrides));
    }

    figment.extract().map_err(Box::new)
}

/// Whether a user-level or workspace-level config file exists.
pub fn config_exists(workspace: Option<&Path>) -> bool {
    if user_config_path().is_some_and(|p| p.exists()) {
        return true;
    }
    workspace.is_some_and(|ws| workspace_config_path(ws).exists())
}
