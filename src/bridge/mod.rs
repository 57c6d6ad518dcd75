//! Serialization Bridge
//! Renders statechart definitions into the interpreter's exchange document
//! and turns the interpreter's answer back into an executable handle

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::chart::{Region, StateDef, StatechartDefinition};
use crate::config::ConfigError;
use crate::engine::EngineError;

#[cfg(test)]
mod tests;

#[derive(Error, Debug)]
pub enum TranslationError {
    #[error("Statechart '{statechart}' is inconsistent: {problems}")]
    InvalidDefinition { statechart: String, problems: String },
    #[error("YAML serialization failed: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),
    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Engine rejected statechart '{statechart}': {message}")]
    Rejected { statechart: String, message: String },
    #[error("Malformed engine response for '{statechart}': {message}")]
    MalformedResponse { statechart: String, message: String },
    #[error(transparent)]
    Engine(#[from] EngineError),
}

pub type TranslationResult<T> = Result<T, TranslationError>;

/// Text syntax of the exchange document. Both are read by sismic's YAML
/// importer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ExchangeFormat {
    #[default]
    Yaml,
    Json,
}

impl ExchangeFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            ExchangeFormat::Yaml => "yaml",
            ExchangeFormat::Json => "json",
        }
    }
}

impl fmt::Display for ExchangeFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for ExchangeFormat {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ExchangeFormat> for String {
    fn from(value: ExchangeFormat) -> Self {
        value.as_str().to_string()
    }
}

impl FromStr for ExchangeFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "yaml" | "yml" => Ok(ExchangeFormat::Yaml),
            "json" => Ok(ExchangeFormat::Json),
            other => Err(ConfigError::UnknownTag {
                key: "format",
                value: other.to_string(),
            }),
        }
    }
}

/// A statechart the engine accepted, ready to execute.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutableStatechart {
    pub name: String,
    /// The exchange document the engine accepted
    pub document: String,
    pub format: ExchangeFormat,
}

// ============================================================================
// SISMIC DOCUMENT SHAPE
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SismicDocument {
    pub statechart: SismicStatechart,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SismicStatechart {
    pub name: String,
    #[serde(rename = "root state")]
    pub root_state: SismicState,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SismicState {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub transitions: Vec<SismicTransition>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub states: Vec<SismicState>,
    #[serde(rename = "parallel states", default, skip_serializing_if = "Vec::is_empty")]
    pub parallel_states: Vec<SismicState>,
}

impl SismicState {
    fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            initial: None,
            transitions: Vec::new(),
            states: Vec::new(),
            parallel_states: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SismicTransition {
    /// Absent for unresolved targets
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event: Option<String>,
}

/// Restructure a definition into the sismic document shape. Regions become
/// compound states, composite states get `parallel states`.
pub fn to_sismic_document(chart: &StatechartDefinition, emit_trigger_events: bool) -> SismicDocument {
    let mut root = SismicState::named(chart.root.name.clone());
    root.parallel_states = chart
        .root
        .parallel_regions
        .iter()
        .map(|region| region_to_sismic(region, emit_trigger_events))
        .collect();

    SismicDocument {
        statechart: SismicStatechart {
            name: chart.name.clone(),
            root_state: root,
        },
    }
}

fn region_to_sismic(region: &Region, emit_trigger_events: bool) -> SismicState {
    let mut out = SismicState::named(region.name.clone());
    out.initial = region.initial_state.clone();
    out.states = region
        .states
        .iter()
        .map(|(name, state)| state_to_sismic(name, state, emit_trigger_events))
        .collect();
    out
}

fn state_to_sismic(name: &str, state: &StateDef, emit_trigger_events: bool) -> SismicState {
    let mut out = SismicState::named(name);
    out.transitions = state
        .transitions
        .iter()
        .map(|(target, def)| SismicTransition {
            target: target.clone(),
            event: if emit_trigger_events {
                def.triggers.first().cloned()
            } else {
                None
            },
        })
        .collect();
    out.parallel_states = state
        .parallel_regions
        .iter()
        .flatten()
        .map(|region| region_to_sismic(region, emit_trigger_events))
        .collect();
    out
}

/// Render a definition as exchange text. The definition is validated first;
/// key order follows the translator's traversal order.
pub fn to_exchange_format(
    chart: &StatechartDefinition,
    format: ExchangeFormat,
    emit_trigger_events: bool,
) -> TranslationResult<String> {
    chart
        .validate()
        .map_err(|problems| TranslationError::InvalidDefinition {
            statechart: chart.name.clone(),
            problems: problems.join("; "),
        })?;

    let document = to_sismic_document(chart, emit_trigger_events);
    let text = match format {
        ExchangeFormat::Yaml => serde_yaml_ng::to_string(&document)?,
        ExchangeFormat::Json => serde_json::to_string_pretty(&document)?,
    };
    log::debug!("exchange document for '{}':\n{}", chart.name, text);
    Ok(text)
}

/// Reply of the engine to a load request.
#[derive(Debug, Deserialize)]
struct LoadReply {
    ok: bool,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Parse the engine's load reply. A rejection carries the engine's message
/// unchanged.
pub fn from_engine_response(
    statechart: &str,
    document: String,
    format: ExchangeFormat,
    reply: &str,
) -> TranslationResult<ExecutableStatechart> {
    let parsed: LoadReply =
        serde_json::from_str(reply.trim()).map_err(|e| TranslationError::MalformedResponse {
            statechart: statechart.to_string(),
            message: e.to_string(),
        })?;

    if !parsed.ok {
        return Err(TranslationError::Rejected {
            statechart: statechart.to_string(),
            message: parsed.error.unwrap_or_default(),
        });
    }

    let name = parsed.name.unwrap_or_else(|| statechart.to_string());
    if name != statechart {
        log::warn!("engine loaded '{}' as '{}'", statechart, name);
    }

    Ok(ExecutableStatechart {
        name,
        document,
        format,
    })
}
