//! Model Language Parser
//! Parses the textual model language into the in-memory model graph

use std::path::Path;

use pest::iterators::Pair;
use pest::Parser;
use pest_derive::Parser;
use thiserror::Error;

use crate::model::{
    ComponentModel, ElementRef, MachineModel, ModelDocument, ModelError, RegionModel,
    StateModel, SystemModel, TransitionModel,
};

#[cfg(test)]
mod tests;

#[derive(Parser)]
#[grammar = "parser/model.pest"]
pub struct ModelParser;

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Parse error: {0}")]
    PestError(#[from] pest::error::Error<Rule>),
    #[error("Invalid syntax at line {line}: {message}")]
    SyntaxError { line: usize, message: String },
    #[error("Unknown source state '{name}' at line {line}")]
    UnknownState { name: String, line: usize },
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error("Could not read '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
}

pub type ParseResult<T> = Result<T, ParseError>;

/// Parse model language source into a linked model document
pub fn parse_model(source: &str) -> ParseResult<ModelDocument> {
    let mut pairs = ModelParser::parse(Rule::file, source)?;
    let file = pairs.next().ok_or_else(|| ParseError::SyntaxError {
        line: 1,
        message: "empty model".to_string(),
    })?;

    let system_pair = file
        .into_inner()
        .find(|p| p.as_rule() == Rule::system_def)
        .ok_or_else(|| ParseError::SyntaxError {
            line: 1,
            message: "expected a `system` block".to_string(),
        })?;

    let system = parse_system(system_pair)?;
    log::debug!(
        "parsed system '{}' ({} machines, {} components)",
        system.name,
        system.state_machines.len(),
        system.components.len()
    );
    Ok(ModelDocument::new(system).finish()?)
}

/// Load a model file; `.json` files are read as the JSON form, anything else
/// as the model language.
pub fn load_model_file(path: &Path) -> ParseResult<ModelDocument> {
    let content = std::fs::read_to_string(path).map_err(|source| ParseError::Io {
        path: path.display().to_string(),
        source,
    })?;

    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));

    if is_json {
        Ok(ModelDocument::from_json(&content)?)
    } else {
        parse_model(&content)
    }
}

fn line_of(pair: &Pair<Rule>) -> usize {
    pair.as_span().start_pos().line_col().0
}

fn name_text(pair: Pair<Rule>) -> String {
    match pair.into_inner().next() {
        Some(inner) if inner.as_rule() == Rule::quoted_name => inner
            .into_inner()
            .next()
            .map(|q| q.as_str().to_string())
            .unwrap_or_default(),
        Some(inner) => inner.as_str().to_string(),
        None => String::new(),
    }
}

fn parse_system(pair: Pair<Rule>) -> ParseResult<SystemModel> {
    let mut system = SystemModel::new(String::new());

    for item in pair.into_inner() {
        match item.as_rule() {
            Rule::name => system.name = name_text(item),
            Rule::component_def => system.components.push(parse_component(item)?),
            Rule::machine_def => system.state_machines.push(parse_machine(item)?),
            _ => {}
        }
    }

    Ok(system)
}

fn parse_component(pair: Pair<Rule>) -> ParseResult<ComponentModel> {
    let mut component = ComponentModel::new(String::new());

    for item in pair.into_inner() {
        match item.as_rule() {
            Rule::name => component.name = name_text(item),
            Rule::machine_def => component.state_machines.push(parse_machine(item)?),
            _ => {}
        }
    }

    Ok(component)
}

fn parse_machine(pair: Pair<Rule>) -> ParseResult<MachineModel> {
    let mut machine = MachineModel::new(String::new());

    for item in pair.into_inner() {
        match item.as_rule() {
            Rule::name => machine.name = name_text(item),
            Rule::region_def => machine.regions.push(parse_region(item)?),
            _ => {}
        }
    }

    Ok(machine)
}

fn parse_region(pair: Pair<Rule>) -> ParseResult<RegionModel> {
    let mut region = RegionModel::new(String::new());
    // Transitions may name a source declared further down the region.
    let mut pending: Vec<(usize, TransitionModel)> = Vec::new();

    for item in pair.into_inner() {
        match item.as_rule() {
            Rule::name => region.name = name_text(item),
            Rule::state_def => {
                let state = parse_state(item)?;
                // Update existing or add new
                if let Some(existing) = region.state_mut(&state.name) {
                    existing.realized_states.extend(state.realized_states);
                    existing.realizing_states.extend(state.realizing_states);
                    if let Some(regions) = state.regions {
                        existing.regions.get_or_insert_with(Vec::new).extend(regions);
                    }
                } else {
                    region.states.push(state);
                }
            }
            Rule::transition => {
                let line = line_of(&item);
                pending.push((line, parse_transition(item)?));
            }
            _ => {}
        }
    }

    for (line, transition) in pending {
        match region.state_mut(&transition.source) {
            Some(state) => state.outgoing.push(transition),
            None => {
                return Err(ParseError::UnknownState {
                    name: transition.source,
                    line,
                })
            }
        }
    }

    Ok(region)
}

fn parse_state(pair: Pair<Rule>) -> ParseResult<StateModel> {
    let mut state = StateModel::new(String::new());

    for item in pair.into_inner() {
        match item.as_rule() {
            Rule::name => state.name = name_text(item),
            Rule::state_body => {
                for body_item in item.into_inner() {
                    match body_item.as_rule() {
                        Rule::realizes => {
                            if let Some(target) = first_name(body_item) {
                                state.realized_states.push(ElementRef::new(target));
                            }
                        }
                        Rule::realized_by => {
                            if let Some(source) = first_name(body_item) {
                                state.realizing_states.push(ElementRef::new(source));
                            }
                        }
                        Rule::region_def => {
                            let region = parse_region(body_item)?;
                            state.regions.get_or_insert_with(Vec::new).push(region);
                        }
                        _ => {}
                    }
                }
            }
            _ => {}
        }
    }

    Ok(state)
}

fn first_name(pair: Pair<Rule>) -> Option<String> {
    pair.into_inner()
        .find(|p| p.as_rule() == Rule::name)
        .map(name_text)
}

fn parse_transition(pair: Pair<Rule>) -> ParseResult<TransitionModel> {
    let line = line_of(&pair);
    let mut source: Option<String> = None;
    let mut transition = TransitionModel::new(String::new());

    for item in pair.into_inner() {
        match item.as_rule() {
            Rule::name => source = Some(name_text(item)),
            Rule::target_list => {
                for target in item.into_inner() {
                    match target.into_inner().next() {
                        Some(inner) if inner.as_rule() == Rule::unresolved => {
                            transition.targets.push(None);
                        }
                        Some(inner) => {
                            transition.targets.push(Some(ElementRef::new(name_text(inner))));
                        }
                        None => {}
                    }
                }
            }
            Rule::trigger_list => {
                for trigger in item.into_inner() {
                    transition.triggers.push(ElementRef::new(name_text(trigger)));
                }
            }
            _ => {}
        }
    }

    transition.source = source.ok_or_else(|| ParseError::SyntaxError {
        line,
        message: "transition without a source state".to_string(),
    })?;
    Ok(transition)
}
