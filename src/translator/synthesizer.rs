//! Statechart Synthesizer: intermediate tree to statechart definition.

use crate::chart::{OrderedMap, Region, StateDef, StatechartDefinition, TransitionDef};
use crate::model::{RegionSource, TransitionSource};

use super::collector::IntermediateRegion;
use super::TranslationOptions;

/// States whose name contains this (case-insensitive) win the initial slot.
const INITIAL_MARKER: &str = "init";

pub fn is_initial_name(name: &str) -> bool {
    name.to_lowercase().contains(INITIAL_MARKER)
}

/// Build the definition of one state machine. Top-level regions always
/// become parallel regions of the synthetic root state.
pub fn synthesize<R: RegionSource>(
    name: &str,
    regions: &[IntermediateRegion<'_, R>],
    options: &TranslationOptions,
) -> StatechartDefinition {
    let mut chart = StatechartDefinition::new(name);
    for region in regions {
        chart.root.parallel_regions.push(synthesize_region(region, options));
    }
    log::debug!(
        "synthesized '{}' with {} top-level region(s)",
        chart.name,
        chart.root.parallel_regions.len()
    );
    chart
}

fn synthesize_region<R: RegionSource>(
    region: &IntermediateRegion<'_, R>,
    options: &TranslationOptions,
) -> Region {
    let mut out = Region::new(region.name.clone());
    let mut pending: Vec<String> = Vec::new();

    for state in &region.states {
        if out.initial_state.is_none() || is_initial_name(&state.name) {
            out.initial_state = Some(state.name.clone());
        }

        let mut transitions: OrderedMap<Option<String>, TransitionDef> = OrderedMap::new();
        for transition in &state.outgoing {
            let triggers = transition.trigger_names();
            for target in transition.target_names() {
                if let Some(target_name) = &target {
                    pending.push(target_name.clone());
                }
                let entry = transitions.get_or_insert_with(target, TransitionDef::default);
                for trigger in &triggers {
                    if !entry.triggers.contains(trigger) {
                        entry.triggers.push(trigger.clone());
                    }
                }
            }
        }

        // Fan-out is ordinary same-region transitions, never parallelism.
        if state.outgoing.len() > 1 {
            log::debug!(
                "state '{}' in region '{}' fans out over {} transitions",
                state.name,
                region.name,
                state.outgoing.len()
            );
        }

        let parallel_regions = state.nested_regions.as_ref().map(|nested| {
            nested
                .iter()
                .map(|r| synthesize_region(r, options))
                .collect::<Vec<_>>()
        });

        let keep = !state.outgoing.is_empty()
            || parallel_regions.is_some()
            || options.keep_terminal_states;
        if keep {
            out.states.insert(
                state.name.clone(),
                StateDef {
                    transitions,
                    parallel_regions,
                },
            );
        }
    }

    for target in pending {
        if !out.states.contains_key(&target) {
            log::debug!("backfilling placeholder state '{}' in region '{}'", target, region.name);
            out.states.insert(target, StateDef::placeholder());
        }
    }

    out
}
