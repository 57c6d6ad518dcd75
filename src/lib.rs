//! chartstep - Statechart translation and step-through simulation
//! Turns hierarchical model state machines into sismic statecharts and walks
//! their execution traces one micro-step at a time

pub mod bridge;
pub mod chart;
pub mod config;
pub mod controller;
pub mod engine;
pub mod model;
pub mod navigator;
pub mod parser;
pub mod translator;

use std::path::Path;

pub use bridge::{to_exchange_format, ExchangeFormat, ExecutableStatechart, TranslationError};
pub use chart::StatechartDefinition;
pub use config::{ConfigError, SimConfig};
pub use controller::{Command, Presenter, SimulationController, TerminalPresenter};
pub use engine::{EngineBackend, EngineError, EngineKind, MicroStep, StatechartEngine};
pub use navigator::{NavigatorSettings, StepNavigator, StepView};
pub use parser::{load_model_file, parse_model, ParseError, ParseResult};
pub use translator::{translate_session, TranslationOptions};

/// Read a model file and translate every state machine in it.
pub fn load_statecharts(
    path: &Path,
    options: &TranslationOptions,
) -> ParseResult<Vec<StatechartDefinition>> {
    let document = load_model_file(path)?;
    let charts = translate_session(&document, options);
    log::info!(
        "translated {} statechart(s) from {}",
        charts.len(),
        path.display()
    );
    Ok(charts)
}
