//! Statechart Engines
//! The external interpreter is an opaque stepping oracle behind
//! [`StatechartEngine`]; backends are picked from configuration.

mod recorded;
mod sismic;


use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::bridge::{ExchangeFormat, ExecutableStatechart, TranslationResult};
use crate::chart::StatechartDefinition;
use crate::config::{ConfigError, SimConfig};

pub use recorded::{RecordedEngine, RecordedTrace, Recording};
pub use sismic::{default_bridge_script, default_python, SismicEngine};

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Failed to spawn '{program}': {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },
    #[error("Engine I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("Engine exited with {status}: {stderr}")]
    Failed { status: String, stderr: String },
    #[error("Malformed engine output: {0}")]
    Protocol(#[from] serde_json::Error),
    #[error("Engine error for '{statechart}': {message}")]
    Execution { statechart: String, message: String },
    #[error("No recorded trace for '{0}'")]
    NotRecorded(String),
    #[error("No diagram available for '{0}'")]
    NoDiagram(String),
}

pub type EngineResult<T> = Result<T, EngineError>;

/// One atomic transition firing reported by the interpreter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MicroStep {
    /// Event that triggered the step, if any
    pub event: Option<String>,
    /// Fired transition, as rendered by the interpreter
    pub transition: Option<String>,
    pub entered_states: Vec<String>,
    pub exited_states: Vec<String>,
    pub sent_events: Vec<String>,
}

impl MicroStep {
    pub fn new(entered: &[&str], exited: &[&str]) -> Self {
        Self {
            entered_states: entered.iter().map(|s| s.to_string()).collect(),
            exited_states: exited.iter().map(|s| s.to_string()).collect(),
            ..Self::default()
        }
    }

    /// One-line rendering for logs and terminals.
    pub fn summary(&self) -> String {
        let mut parts = Vec::new();
        if let Some(event) = &self.event {
            parts.push(format!("event {event}"));
        }
        if let Some(transition) = &self.transition {
            parts.push(transition.clone());
        }
        if !self.exited_states.is_empty() {
            parts.push(format!("exit [{}]", self.exited_states.join(", ")));
        }
        if !self.entered_states.is_empty() {
            parts.push(format!("enter [{}]", self.entered_states.join(", ")));
        }
        if !self.sent_events.is_empty() {
            parts.push(format!("sent [{}]", self.sent_events.join(", ")));
        }
        if parts.is_empty() {
            "(no change)".to_string()
        } else {
            parts.join(" | ")
        }
    }
}

/// The capability set required from a statechart interpreter.
pub trait StatechartEngine {
    /// Submit an exchange document; the engine accepts or rejects it.
    fn load(
        &mut self,
        chart: &StatechartDefinition,
        document: String,
        format: ExchangeFormat,
    ) -> TranslationResult<ExecutableStatechart>;

    /// Run up to `max_steps` steps and return the flattened micro-steps.
    fn execute(
        &mut self,
        chart: &ExecutableStatechart,
        max_steps: usize,
    ) -> EngineResult<Vec<MicroStep>>;

    /// Diagram markup (PlantUML for sismic) for the presentation layer.
    fn diagram(&mut self, chart: &ExecutableStatechart) -> EngineResult<String>;
}

/// Configuration tag naming an engine backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum EngineKind {
    #[default]
    Sismic,
    Recorded,
}

impl EngineKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EngineKind::Sismic => "sismic",
            EngineKind::Recorded => "recorded",
        }
    }
}

impl fmt::Display for EngineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for EngineKind {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<EngineKind> for String {
    fn from(value: EngineKind) -> Self {
        value.as_str().to_string()
    }
}

impl FromStr for EngineKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sismic" => Ok(EngineKind::Sismic),
            "recorded" => Ok(EngineKind::Recorded),
            other => Err(ConfigError::UnknownTag {
                key: "engine",
                value: other.to_string(),
            }),
        }
    }
}

/// Every supported backend.
#[derive(Debug)]
pub enum EngineBackend {
    Sismic(SismicEngine),
    Recorded(RecordedEngine),
}

impl EngineBackend {
    pub fn from_config(config: &SimConfig) -> Result<Self, ConfigError> {
        match config.engine {
            EngineKind::Sismic => Ok(EngineBackend::Sismic(SismicEngine::new(
                config.python_path(),
                config.bridge_script_path(),
            ))),
            EngineKind::Recorded => {
                let path = config
                    .recording
                    .as_ref()
                    .ok_or(ConfigError::Missing("recording"))?;
                let engine = RecordedEngine::from_file(path).map_err(|e| ConfigError::Invalid {
                    key: "recording",
                    message: e.to_string(),
                })?;
                Ok(EngineBackend::Recorded(engine))
            }
        }
    }

    pub fn kind(&self) -> EngineKind {
        match self {
            EngineBackend::Sismic(_) => EngineKind::Sismic,
            EngineBackend::Recorded(_) => EngineKind::Recorded,
        }
    }
}

impl StatechartEngine for EngineBackend {
    fn load(
        &mut self,
        chart: &StatechartDefinition,
        document: String,
        format: ExchangeFormat,
    ) -> TranslationResult<ExecutableStatechart> {
        match self {
            EngineBackend::Sismic(engine) => engine.load(chart, document, format),
            EngineBackend::Recorded(engine) => engine.load(chart, document, format),
        }
    }

    fn execute(
        &mut self,
        chart: &ExecutableStatechart,
        max_steps: usize,
    ) -> EngineResult<Vec<MicroStep>> {
        match self {
            EngineBackend::Sismic(engine) => engine.execute(chart, max_steps),
            EngineBackend::Recorded(engine) => engine.execute(chart, max_steps),
        }
    }

    fn diagram(&mut self, chart: &ExecutableStatechart) -> EngineResult<String> {
        match self {
            EngineBackend::Sismic(engine) => engine.diagram(chart),
            EngineBackend::Recorded(engine) => engine.diagram(chart),
        }
    }
}
