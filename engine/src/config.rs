use crate::error::AppError;
use serde::Deserialize;
use std::path::{Path, PathBuf};

const CONFIG_FILE: &str = "phishing-detector";
const ENV_PREFIX: &str = "PHISHING_DETECTOR";

const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8501";
const DEFAULT_MODEL_PATH: &str = "engine/models/phishing_model.json";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub bind_addr: String,
    pub model_path: PathBuf,
}

impl Config {
    /// Defaults, then `phishing-detector.{toml,json,yaml}` if present, then
    /// `PHISHING_DETECTOR_*` environment variables.
    pub fn load() -> Result<Self, AppError> {
        Self::load_from(Path::new(CONFIG_FILE))
    }

    pub fn load_from(file: &Path) -> Result<Self, AppError> {
        let settings = ::config::Config::builder()
            .set_default("bind_addr", DEFAULT_BIND_ADDR)?
            .set_default("model_path", DEFAULT_MODEL_PATH)?
            .add_source(::config::File::from(file).required(false))
            .add_source(::config::Environment::with_prefix(ENV_PREFIX))
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}
