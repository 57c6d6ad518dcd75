//! Replays traces captured earlier with `chartstep-cli record`.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::bridge::{ExchangeFormat, ExecutableStatechart, TranslationError, TranslationResult};
use crate::chart::StatechartDefinition;

use super::{EngineError, EngineResult, MicroStep, StatechartEngine};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordedTrace {
    pub name: String,
    pub steps: Vec<MicroStep>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diagram: Option<String>,
}

/// A set of traces, one per statechart name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Recording {
    pub traces: Vec<RecordedTrace>,
}

impl Recording {
    pub fn load(path: &Path) -> EngineResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn save(&self, path: &Path) -> EngineResult<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn trace(&self, name: &str) -> Option<&RecordedTrace> {
        self.traces.iter().find(|t| t.name == name)
    }

    /// Add a trace, replacing any earlier one with the same name.
    pub fn push(&mut self, trace: RecordedTrace) {
        match self.traces.iter_mut().find(|t| t.name == trace.name) {
            Some(existing) => *existing = trace,
            None => self.traces.push(trace),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RecordedEngine {
    recording: Recording,
}

impl RecordedEngine {
    pub fn new(recording: Recording) -> Self {
        Self { recording }
    }

    pub fn from_file(path: &Path) -> EngineResult<Self> {
        Ok(Self::new(Recording::load(path)?))
    }

    pub fn with_trace(mut self, name: impl Into<String>, steps: Vec<MicroStep>) -> Self {
        self.recording.push(RecordedTrace {
            name: name.into(),
            steps,
            diagram: None,
        });
        self
    }

    pub fn recording(&self) -> &Recording {
        &self.recording
    }
}

impl StatechartEngine for RecordedEngine {
    fn load(
        &mut self,
        chart: &StatechartDefinition,
        document: String,
        format: ExchangeFormat,
    ) -> TranslationResult<ExecutableStatechart> {
        if self.recording.trace(&chart.name).is_none() {
            return Err(TranslationError::Rejected {
                statechart: chart.name.clone(),
                message: "no recorded trace for this statechart".to_string(),
            });
        }
        Ok(ExecutableStatechart {
            name: chart.name.clone(),
            document,
            format,
        })
    }

    /// The budget caps the number of replayed micro-steps.
    fn execute(
        &mut self,
        chart: &ExecutableStatechart,
        max_steps: usize,
    ) -> EngineResult<Vec<MicroStep>> {
        let trace = self
            .recording
            .trace(&chart.name)
            .ok_or_else(|| EngineError::NotRecorded(chart.name.clone()))?;
        Ok(trace.steps.iter().take(max_steps).cloned().collect())
    }

    fn diagram(&mut self, chart: &ExecutableStatechart) -> EngineResult<String> {
        self.recording
            .trace(&chart.name)
            .and_then(|t| t.diagram.clone())
            .ok_or_else(|| EngineError::NoDiagram(chart.name.clone()))
    }
}
