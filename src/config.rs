//! Simulator configuration
//! A JSON file with every key optional; the engine subprocess paths can be
//! overridden through `CHARTSTEP_PYTHON` and `CHARTSTEP_BRIDGE`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::bridge::ExchangeFormat;
use crate::engine::{default_bridge_script, default_python, EngineKind};
use crate::translator::TranslationOptions;

pub const DEFAULT_MAX_STEPS: usize = 20;

pub const PYTHON_ENV: &str = "CHARTSTEP_PYTHON";
pub const BRIDGE_ENV: &str = "CHARTSTEP_BRIDGE";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("Invalid config: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Unknown {key} '{value}'")]
    UnknownTag { key: &'static str, value: String },
    #[error("Missing config value '{0}'")]
    Missing(&'static str),
    #[error("Invalid config value '{key}': {message}")]
    Invalid { key: &'static str, message: String },
}

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimConfig {
    pub engine: EngineKind,
    pub format: ExchangeFormat,
    /// Step budget handed to the engine per statechart
    pub max_steps: usize,
    pub python: Option<PathBuf>,
    pub bridge_script: Option<PathBuf>,
    /// Trace file for the `recorded` engine
    pub recording: Option<PathBuf>,
    pub synthesis: TranslationOptions,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            engine: EngineKind::default(),
            format: ExchangeFormat::default(),
            max_steps: DEFAULT_MAX_STEPS,
            python: None,
            bridge_script: None,
            recording: None,
            synthesis: TranslationOptions::default(),
        }
    }
}

impl SimConfig {
    pub fn from_json(json: &str) -> ConfigResult<Self> {
        let config: SimConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::from_json(&content)?;
        log::info!("loaded config from {}", path.display());
        Ok(config)
    }

    /// Load `path` when given, otherwise start from defaults.
    pub fn load_or_default(path: Option<&Path>) -> ConfigResult<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.max_steps == 0 {
            return Err(ConfigError::Invalid {
                key: "max_steps",
                message: "must be at least 1".to_string(),
            });
        }
        if self.engine == EngineKind::Recorded && self.recording.is_none() {
            return Err(ConfigError::Missing("recording"));
        }
        Ok(())
    }

    /// Environment first, then the config file, then the built-in lookup.
    /// This is the only place the path variables are read.
    pub fn python_path(&self) -> PathBuf {
        env_path(PYTHON_ENV)
            .or_else(|| self.python.clone())
            .unwrap_or_else(default_python)
    }

    pub fn bridge_script_path(&self) -> PathBuf {
        env_path(BRIDGE_ENV)
            .or_else(|| self.bridge_script.clone())
            .unwrap_or_else(default_bridge_script)
    }
}

fn env_path(var: &str) -> Option<PathBuf> {
    std::env::var_os(var)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}
