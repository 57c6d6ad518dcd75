//! Model-to-Statechart Translator
//! Reads state machines out of a model session and synthesizes one nested
//! statechart definition per machine

mod collector;
mod reader;
mod synthesizer;


use serde::{Deserialize, Serialize};

use crate::chart::StatechartDefinition;
use crate::model::ModelSession;

pub use collector::{
    Collector, IntermediateMachine, IntermediateRegion, IntermediateState, StateIndex,
};
pub use reader::{read_state_machines, MachineOf};
pub use synthesizer::{is_initial_name, synthesize};

/// Knobs for the translation pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TranslationOptions {
    /// Keep directly owned states that have no outgoing transitions and are
    /// never targeted. `false` drops them.
    pub keep_terminal_states: bool,
    /// Emit the first trigger of each transition as its event.
    pub emit_trigger_events: bool,
}

impl Default for TranslationOptions {
    fn default() -> Self {
        Self {
            keep_terminal_states: true,
            emit_trigger_events: false,
        }
    }
}

impl TranslationOptions {
    /// Output identical to the legacy exporter.
    pub fn legacy() -> Self {
        Self {
            keep_terminal_states: false,
            emit_trigger_events: false,
        }
    }
}

/// Translate every state machine of the session, in reader order.
pub fn translate_session<M: ModelSession>(
    session: &M,
    options: &TranslationOptions,
) -> Vec<StatechartDefinition> {
    let machines = read_state_machines(session);
    let mut collector = Collector::new();

    let charts: Vec<StatechartDefinition> = machines
        .into_iter()
        .map(|machine| {
            let tree = collector.collect_machine(machine);
            synthesize(&tree.name, &tree.regions, options)
        })
        .collect();

    log::info!(
        "translated {} statechart(s), {} distinct state name(s) indexed",
        charts.len(),
        collector.index().len()
    );
    charts
}

/// Text outline of every collected machine, for inspection.
pub fn outline_session<M: ModelSession>(session: &M) -> String {
    let mut collector = Collector::new();
    read_state_machines(session)
        .into_iter()
        .map(|machine| collector.collect_machine(machine).outline())
        .collect::<Vec<_>>()
        .join("\n")
}
