//! Region/State Collector: builds the intermediate tree under a machine.

use std::collections::HashMap;
use std::fmt::Write as _;

use crate::model::{MachineSource, NamedElement, RegionSource, StateSource, TransitionSource};

pub type StateOf<R> = <R as RegionSource>::State;
pub type TransitionOf<R> = <StateOf<R> as StateSource>::Transition;
pub type LinkOf<R> = <StateOf<R> as StateSource>::Link;

pub struct IntermediateMachine<'m, R: RegionSource> {
    pub name: String,
    pub regions: Vec<IntermediateRegion<'m, R>>,
}

pub struct IntermediateRegion<'m, R: RegionSource> {
    pub name: String,
    pub states: Vec<IntermediateState<'m, R>>,
}

/// One collected state. Relations keep references to the source elements.
pub struct IntermediateState<'m, R: RegionSource> {
    pub name: String,
    pub outgoing: Vec<&'m TransitionOf<R>>,
    pub incoming: Vec<&'m TransitionOf<R>>,
    pub realized_states: Vec<&'m LinkOf<R>>,
    pub realizing_states: Vec<&'m LinkOf<R>>,
    /// `None` for simple states and for composites whose regions are empty.
    pub nested_regions: Option<Vec<IntermediateRegion<'m, R>>>,
}

impl<'m, R: RegionSource> IntermediateState<'m, R> {
    pub fn is_composite(&self) -> bool {
        self.nested_regions.is_some()
    }
}

/// Name to source-state lookup. Later duplicates replace earlier ones.
pub struct StateIndex<'m, S> {
    by_name: HashMap<String, &'m S>,
}

impl<'m, S> StateIndex<'m, S> {
    pub fn new() -> Self {
        Self {
            by_name: HashMap::new(),
        }
    }

    pub fn lookup(&self, name: &str) -> Option<&'m S> {
        self.by_name.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    fn record(&mut self, name: &str, state: &'m S) {
        if self.by_name.insert(name.to_string(), state).is_some() {
            log::debug!("state name '{}' seen more than once; keeping the latest", name);
        }
    }
}

impl<'m, S> Default for StateIndex<'m, S> {
    fn default() -> Self {
        Self::new()
    }
}

pub struct Collector<'m, R: RegionSource> {
    index: StateIndex<'m, StateOf<R>>,
}

impl<'m, R: RegionSource + 'm> Default for Collector<'m, R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'m, R: RegionSource + 'm> Collector<'m, R> {
    pub fn new() -> Self {
        Self {
            index: StateIndex::new(),
        }
    }

    pub fn collect_machine<M>(&mut self, machine: &'m M) -> IntermediateMachine<'m, R>
    where
        M: MachineSource<Region = R>,
    {
        let regions = machine
            .owned_regions()
            .into_iter()
            .map(|region| IntermediateRegion {
                name: region.name().to_string(),
                states: self.collect(region),
            })
            .collect();

        IntermediateMachine {
            name: machine.name().to_string(),
            regions,
        }
    }

    /// Collect every state directly owned by `region`, recursing into
    /// nested regions of composite states.
    pub fn collect(&mut self, region: &'m R) -> Vec<IntermediateState<'m, R>> {
        let mut states = Vec::new();

        for state in region.owned_states() {
            let name = state.name().to_string();

            let nested_regions = state.owned_regions().and_then(|regions| {
                let nested: Vec<IntermediateRegion<'m, R>> = regions
                    .into_iter()
                    .map(|nested| IntermediateRegion {
                        name: nested.name().to_string(),
                        states: self.collect(nested),
                    })
                    .collect();
                if nested.is_empty() {
                    None
                } else {
                    Some(nested)
                }
            });

            self.index.record(&name, state);

            states.push(IntermediateState {
                name,
                incoming: state.incoming(),
                outgoing: state.outgoing(),
                realized_states: state.realized_states(),
                realizing_states: state.realizing_states(),
                nested_regions,
            });
        }

        log::debug!(
            "collected {} state(s) in region '{}'",
            states.len(),
            region.name()
        );
        states
    }

    pub fn index(&self) -> &StateIndex<'m, StateOf<R>> {
        &self.index
    }
}

impl<'m, R: RegionSource> IntermediateMachine<'m, R> {
    /// Indented text rendering of the collected tree.
    pub fn outline(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "machine {}", self.name);
        for region in &self.regions {
            region.outline_into(&mut out, 1);
        }
        out
    }
}

impl<'m, R: RegionSource> IntermediateRegion<'m, R> {
    fn outline_into(&self, out: &mut String, depth: usize) {
        let pad = "  ".repeat(depth);
        let _ = writeln!(out, "{pad}region {}", self.name);
        for state in &self.states {
            let _ = writeln!(
                out,
                "{pad}  state {} (in: {}, out: {})",
                state.name,
                state.incoming.len(),
                state.outgoing.len()
            );
            for transition in &state.outgoing {
                let targets: Vec<String> = transition
                    .target_names()
                    .into_iter()
                    .map(|t| t.unwrap_or_else(|| "[*]".to_string()))
                    .collect();
                let triggers = transition.trigger_names();
                if triggers.is_empty() {
                    let _ = writeln!(out, "{pad}    --> {}", targets.join(", "));
                } else {
                    let _ = writeln!(
                        out,
                        "{pad}    --> {} : {}",
                        targets.join(", "),
                        triggers.join(", ")
                    );
                }
            }
            for link in &state.realized_states {
                let _ = writeln!(out, "{pad}    realizes {}", link.name());
            }
            for link in &state.realizing_states {
                let _ = writeln!(out, "{pad}    realized by {}", link.name());
            }
            for nested in state.nested_regions.iter().flatten() {
                nested.outline_into(out, depth + 2);
            }
        }
    }
}
