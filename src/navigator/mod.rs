//! Step Navigator
//! Owns one execution cursor per statechart and walks a single shared step
//! index over traces of differing lengths.

use thiserror::Error;

use crate::bridge::{to_exchange_format, ExchangeFormat, TranslationError};
use crate::chart::StatechartDefinition;
use crate::config::SimConfig;
use crate::engine::{EngineError, MicroStep, StatechartEngine};


/// Why one statechart could not be run.
#[derive(Error, Debug)]
pub enum NavigatorError {
    #[error(transparent)]
    Translation(#[from] TranslationError),
    #[error(transparent)]
    Engine(#[from] EngineError),
}

#[derive(Debug)]
pub struct ChartFailure {
    pub name: String,
    pub error: NavigatorError,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigatorState {
    Unstarted,
    /// Traces built, nothing read yet
    Ready,
    Advanced,
    /// Terminal
    Finalized,
}

/// Everything the navigator needs to hand a definition to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavigatorSettings {
    pub format: ExchangeFormat,
    pub emit_trigger_events: bool,
    pub max_steps: usize,
}

impl NavigatorSettings {
    pub fn from_config(config: &SimConfig) -> Self {
        Self {
            format: config.format,
            emit_trigger_events: config.synthesis.emit_trigger_events,
            max_steps: config.max_steps,
        }
    }
}

impl Default for NavigatorSettings {
    fn default() -> Self {
        Self::from_config(&SimConfig::default())
    }
}

/// A statechart's trace and its diagram markup.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionCursor {
    pub name: String,
    pub trace: Vec<MicroStep>,
    pub diagram: Option<String>,
}

impl ExecutionCursor {
    fn empty(name: &str) -> Self {
        Self {
            name: name.to_string(),
            trace: Vec::new(),
            diagram: None,
        }
    }

    /// Read position for a global index: clamped into the trace, `None`
    /// when there is nothing to read.
    pub fn position(&self, global_index: i64) -> Option<usize> {
        if self.trace.is_empty() || global_index < 0 {
            return None;
        }
        let last = self.trace.len() - 1;
        Some((global_index as usize).min(last))
    }
}

/// One `{name, micro-step, diagram}` entry handed to the presenter.
#[derive(Debug, Clone, PartialEq)]
pub struct StepView {
    pub name: String,
    /// Clamped position inside the statechart's trace
    pub index: usize,
    pub step: MicroStep,
    pub diagram: Option<String>,
}

pub type StepSet = Vec<StepView>;

pub struct StepNavigator<E: StatechartEngine> {
    engine: E,
    definitions: Vec<StatechartDefinition>,
    settings: NavigatorSettings,
    state: NavigatorState,
    step_index: i64,
    cursors: Vec<ExecutionCursor>,
    failures: Vec<ChartFailure>,
}

impl<E: StatechartEngine> StepNavigator<E> {
    pub fn new(
        engine: E,
        definitions: Vec<StatechartDefinition>,
        settings: NavigatorSettings,
    ) -> Self {
        Self {
            engine,
            definitions,
            settings,
            state: NavigatorState::Unstarted,
            step_index: -1,
            cursors: Vec::new(),
            failures: Vec::new(),
        }
    }

    pub fn state(&self) -> NavigatorState {
        self.state
    }

    pub fn step_index(&self) -> i64 {
        self.step_index
    }

    /// Statechart names in definition order.
    pub fn names(&self) -> Vec<&str> {
        self.definitions.iter().map(|d| d.name.as_str()).collect()
    }

    pub fn cursors(&self) -> &[ExecutionCursor] {
        &self.cursors
    }

    pub fn failures(&self) -> &[ChartFailure] {
        &self.failures
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Translate, load and execute every statechart. A failing statechart
    /// keeps an empty trace and does not stop the others.
    pub fn start(&mut self) -> Option<StepSet> {
        match self.state {
            NavigatorState::Finalized => return None,
            NavigatorState::Ready | NavigatorState::Advanced => {
                log::debug!("navigator already started");
                return Some(self.view());
            }
            NavigatorState::Unstarted => {}
        }

        log::info!(
            "starting {} statechart(s) with a budget of {} steps",
            self.definitions.len(),
            self.settings.max_steps
        );

        for chart in &self.definitions {
            match build_cursor(&mut self.engine, chart, &self.settings) {
                Ok(cursor) => self.cursors.push(cursor),
                Err(error) => {
                    log::error!("statechart '{}' failed: {}", chart.name, error);
                    self.cursors.push(ExecutionCursor::empty(&chart.name));
                    self.failures.push(ChartFailure {
                        name: chart.name.clone(),
                        error,
                    });
                }
            }
        }

        self.step_index = -1;
        self.state = NavigatorState::Ready;
        Some(Vec::new())
    }

    pub fn next_step(&mut self) -> Option<StepSet> {
        match self.state {
            NavigatorState::Finalized => return None,
            NavigatorState::Unstarted => {
                self.start();
            }
            _ => {}
        }
        self.step_index = (self.step_index + 1).min(self.last_index());
        self.state = NavigatorState::Advanced;
        Some(self.view())
    }

    pub fn previous_step(&mut self) -> Option<StepSet> {
        match self.state {
            NavigatorState::Finalized => return None,
            NavigatorState::Unstarted => {
                self.start();
            }
            _ => {}
        }
        self.step_index = (self.step_index - 1).max(0);
        self.state = NavigatorState::Advanced;
        Some(self.view())
    }

    /// Last readable step of the longest trace. The global index never
    /// passes it, so stepping back always moves the longest trace.
    fn last_index(&self) -> i64 {
        self.cursors
            .iter()
            .map(|cursor| cursor.trace.len() as i64)
            .max()
            .unwrap_or(0)
            .saturating_sub(1)
            .max(0)
    }

    /// Always `None`; the navigator accepts nothing afterwards.
    pub fn finalize(&mut self) -> Option<StepSet> {
        if self.state != NavigatorState::Finalized {
            log::info!("navigator finalized at step {}", self.step_index);
        }
        self.state = NavigatorState::Finalized;
        None
    }

    pub fn automatic(&mut self) -> Option<StepSet> {
        match self.state {
            NavigatorState::Unstarted => self.start(),
            _ => self.next_step(),
        }
    }

    /// Current read for every statechart with a non-empty trace.
    pub fn view(&self) -> StepSet {
        self.cursors
            .iter()
            .filter_map(|cursor| {
                let index = cursor.position(self.step_index)?;
                Some(StepView {
                    name: cursor.name.clone(),
                    index,
                    step: cursor.trace[index].clone(),
                    diagram: cursor.diagram.clone(),
                })
            })
            .collect()
    }
}

fn build_cursor<E: StatechartEngine>(
    engine: &mut E,
    chart: &StatechartDefinition,
    settings: &NavigatorSettings,
) -> Result<ExecutionCursor, NavigatorError> {
    let document = to_exchange_format(chart, settings.format, settings.emit_trigger_events)?;
    let executable = engine.load(chart, document, settings.format)?;
    let trace = engine.execute(&executable, settings.max_steps)?;
    if trace.is_empty() {
        log::warn!("statechart '{}' produced an empty trace", chart.name);
    } else {
        log::info!("statechart '{}': {} micro-step(s)", chart.name, trace.len());
    }

    let diagram = match engine.diagram(&executable) {
        Ok(markup) => Some(markup),
        Err(e) => {
            log::warn!("no diagram for '{}': {}", chart.name, e);
            None
        }
    };

    Ok(ExecutionCursor {
        name: chart.name.clone(),
        trace,
        diagram,
    })
}
