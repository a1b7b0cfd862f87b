use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::PathBuf;

use crate::error::Result;

/// Default config file stem; `xray.toml` next to the working directory.
const DEFAULT_CONFIG_FILE: &str = "xray";

/// Top-level configuration shared by the trainer, the server and the
/// dataset summary tool.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub dataset: DatasetConfig,
    pub model: ModelConfig,
    pub server: ServerConfig,
    pub training: TrainingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatasetConfig {
    /// Directory holding `train/`, `test/` and `val/`.
    pub root: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModelConfig {
    /// Where the trainer writes the artifact and the server reads it.
    pub path: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub bind_addr: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TrainingConfig {
    pub epochs: usize,
    pub batch_size: usize,
    pub learning_rate: f64,
    #[serde(default)]
    pub seed: Option<u64>,
}

impl AppConfig {
    /// Loads configuration from defaults, then an optional config file, then
    /// `XRAY__*` environment variables.
    ///
    /// The file is `xray.toml` unless `XRAY_CONFIG` names another one.
    pub fn load() -> Result<Self> {
        let file = std::env::var("XRAY_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
        Self::load_from(&file)
    }

    /// Same as [`AppConfig::load`] with an explicit config file name.
    pub fn load_from(file: &str) -> Result<Self> {
        let builder = Config::builder()
            .set_default("dataset.root", "data/chest_xray")?
            .set_default("model.path", "model/xray_model.json")?
            .set_default("server.bind_addr", "127.0.0.1:5000")?
            .set_default("training.epochs", 10)?
            .set_default("training.batch_size", 32)?
            .set_default("training.learning_rate", 0.001)?
            .add_source(File::with_name(file).required(false))
            .add_source(
                Environment::with_prefix("XRAY")
                    .separator("__")
                    .try_parsing(true),
            );

        Ok(builder.build()?.try_deserialize()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_without_file() {
        let cfg = AppConfig::load_from("does-not-exist-xray-config").unwrap();
        assert_eq!(cfg.training.epochs, 10);
        assert_eq!(cfg.training.batch_size, 32);
        assert!((cfg.training.learning_rate - 0.001).abs() < 1e-12);
        assert_eq!(cfg.dataset.root, PathBuf::from("data/chest_xray"));
        assert_eq!(cfg.model.path, PathBuf::from("model/xray_model.json"));
        assert!(cfg.training.seed.is_none());
    }

    #[test]
    fn file_values_override_defaults() {
        let path = std::env::temp_dir().join(format!("xray-config-{}.toml", std::process::id()));
        std::fs::write(
            &path,
            "[training]\nepochs = 3\nseed = 42\n\n[server]\nbind_addr = \"0.0.0.0:8080\"\n",
        )
        .unwrap();

        let cfg = AppConfig::load_from(path.to_str().unwrap()).unwrap();
        assert_eq!(cfg.training.epochs, 3);
        assert_eq!(cfg.training.seed, Some(42));
        assert_eq!(cfg.training.batch_size, 32);
        assert_eq!(cfg.server.bind_addr, "0.0.0.0:8080");

        let _ = std::fs::remove_file(&path);
    }
}
