//! In-memory model graph, loaded from the model language or from JSON.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{
    ComponentSource, MachineSource, ModelSession, NamedElement, RegionSource, StateSource,
    SystemSource, TransitionSource,
};

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Invalid model JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("{kind} without a name in '{path}'")]
    EmptyName { kind: &'static str, path: String },
    #[error("Transition in state '{state}' declares source '{source_name}'")]
    SourceMismatch { state: String, source_name: String },
}

pub type ModelResult<T> = Result<T, ModelError>;

/// A named reference to another element (transition target, trigger,
/// realization link).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementRef {
    pub name: String,
}

impl ElementRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// A whole opened model: one logical system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelDocument {
    pub system: SystemModel,
}

impl ModelDocument {
    pub fn new(system: SystemModel) -> Self {
        Self { system }
    }

    /// Load a model from its JSON form and link it.
    pub fn from_json(source: &str) -> ModelResult<Self> {
        let document: ModelDocument = serde_json::from_str(source)?;
        document.finish()
    }

    pub fn to_json(&self) -> ModelResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check names, stamp transition sources and derive incoming lists.
    pub fn finish(mut self) -> ModelResult<Self> {
        if self.system.name.trim().is_empty() {
            return Err(ModelError::EmptyName {
                kind: "System",
                path: String::new(),
            });
        }
        let system_name = self.system.name.clone();
        for machine in &mut self.system.state_machines {
            machine.finish(&system_name)?;
        }
        for component in &mut self.system.components {
            let path = format!("{}/{}", system_name, component.name);
            if component.name.trim().is_empty() {
                return Err(ModelError::EmptyName {
                    kind: "Component",
                    path,
                });
            }
            for machine in &mut component.state_machines {
                machine.finish(&path)?;
            }
        }
        Ok(self)
    }

    /// Every state machine in the document, system-level first.
    pub fn machine_names(&self) -> Vec<&str> {
        self.system
            .state_machines
            .iter()
            .chain(self.system.components.iter().flat_map(|c| c.state_machines.iter()))
            .map(|m| m.name.as_str())
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemModel {
    pub name: String,
    #[serde(default)]
    pub state_machines: Vec<MachineModel>,
    #[serde(default)]
    pub components: Vec<ComponentModel>,
}

impl SystemModel {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state_machines: Vec::new(),
            components: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentModel {
    pub name: String,
    #[serde(default)]
    pub state_machines: Vec<MachineModel>,
}

impl ComponentModel {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state_machines: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MachineModel {
    pub name: String,
    #[serde(default)]
    pub regions: Vec<RegionModel>,
}

impl MachineModel {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            regions: Vec::new(),
        }
    }

    pub fn with_region(mut self, region: RegionModel) -> Self {
        self.regions.push(region);
        self
    }

    fn finish(&mut self, owner: &str) -> ModelResult<()> {
        let path = format!("{}/{}", owner, self.name);
        if self.name.trim().is_empty() {
            return Err(ModelError::EmptyName {
                kind: "State machine",
                path,
            });
        }
        for region in &mut self.regions {
            region.stamp_sources(&path)?;
        }

        // Incoming lists span the whole machine, nested regions included.
        let mut all = Vec::new();
        for region in &self.regions {
            region.gather_outgoing(&mut all);
        }
        for region in &mut self.regions {
            region.assign_incoming(&all);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionModel {
    pub name: String,
    #[serde(default)]
    pub states: Vec<StateModel>,
}

impl RegionModel {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            states: Vec::new(),
        }
    }

    pub fn with_state(mut self, state: StateModel) -> Self {
        self.states.push(state);
        self
    }

    pub fn state_mut(&mut self, name: &str) -> Option<&mut StateModel> {
        self.states.iter_mut().find(|s| s.name == name)
    }

    fn stamp_sources(&mut self, owner: &str) -> ModelResult<()> {
        let path = format!("{}/{}", owner, self.name);
        if self.name.trim().is_empty() {
            return Err(ModelError::EmptyName { kind: "Region", path });
        }
        for state in &mut self.states {
            if state.name.trim().is_empty() {
                return Err(ModelError::EmptyName {
                    kind: "State",
                    path,
                });
            }
            for transition in &mut state.outgoing {
                if transition.source.is_empty() {
                    transition.source = state.name.clone();
                } else if transition.source != state.name {
                    return Err(ModelError::SourceMismatch {
                        state: state.name.clone(),
                        source_name: transition.source.clone(),
                    });
                }
            }
            if let Some(regions) = &mut state.regions {
                let nested_path = format!("{}/{}", path, state.name);
                for region in regions {
                    region.stamp_sources(&nested_path)?;
                }
            }
        }
        Ok(())
    }

    fn gather_outgoing(&self, out: &mut Vec<TransitionModel>) {
        for state in &self.states {
            out.extend(state.outgoing.iter().cloned());
            for region in state.regions.iter().flatten() {
                region.gather_outgoing(out);
            }
        }
    }

    fn assign_incoming(&mut self, all: &[TransitionModel]) {
        for state in &mut self.states {
            state.incoming = all
                .iter()
                .filter(|t| t.targets.iter().flatten().any(|target| target.name == state.name))
                .cloned()
                .collect();
            for region in state.regions.iter_mut().flatten() {
                region.assign_incoming(all);
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateModel {
    pub name: String,
    #[serde(default)]
    pub outgoing: Vec<TransitionModel>,
    /// Derived from the outgoing transitions of the owning machine.
    #[serde(skip)]
    pub incoming: Vec<TransitionModel>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub realized_states: Vec<ElementRef>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub realizing_states: Vec<ElementRef>,
    /// Nested regions; `Some` marks a composite state.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regions: Option<Vec<RegionModel>>,
}

impl StateModel {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            outgoing: Vec::new(),
            incoming: Vec::new(),
            realized_states: Vec::new(),
            realizing_states: Vec::new(),
            regions: None,
        }
    }

    /// Add an outgoing transition to a single named target.
    pub fn to(mut self, target: impl Into<String>) -> Self {
        let transition = TransitionModel::new(self.name.clone()).with_target(target);
        self.outgoing.push(transition);
        self
    }

    pub fn with_transition(mut self, transition: TransitionModel) -> Self {
        self.outgoing.push(transition);
        self
    }

    pub fn with_region(mut self, region: RegionModel) -> Self {
        self.regions.get_or_insert_with(Vec::new).push(region);
        self
    }

    pub fn is_composite(&self) -> bool {
        self.regions.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionModel {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Name of the owning state; filled in when the document is finished.
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub targets: Vec<Option<ElementRef>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub triggers: Vec<ElementRef>,
}

impl TransitionModel {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            name: None,
            source: source.into(),
            targets: Vec::new(),
            triggers: Vec::new(),
        }
    }

    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.targets.push(Some(ElementRef::new(target)));
        self
    }

    pub fn with_unresolved_target(mut self) -> Self {
        self.targets.push(None);
        self
    }

    pub fn with_trigger(mut self, trigger: impl Into<String>) -> Self {
        self.triggers.push(ElementRef::new(trigger));
        self
    }
}

impl NamedElement for ElementRef {
    fn name(&self) -> &str {
        &self.name
    }
}

impl NamedElement for ComponentModel {
    fn name(&self) -> &str {
        &self.name
    }
}

impl NamedElement for MachineModel {
    fn name(&self) -> &str {
        &self.name
    }
}

impl NamedElement for RegionModel {
    fn name(&self) -> &str {
        &self.name
    }
}

impl NamedElement for StateModel {
    fn name(&self) -> &str {
        &self.name
    }
}

impl ModelSession for ModelDocument {
    type System = SystemModel;

    fn logical_system(&self) -> &SystemModel {
        &self.system
    }
}

impl SystemSource for SystemModel {
    type Machine = MachineModel;
    type Component = ComponentModel;

    fn owned_state_machines(&self) -> Vec<&MachineModel> {
        self.state_machines.iter().collect()
    }

    fn owned_components(&self) -> Vec<&ComponentModel> {
        self.components.iter().collect()
    }
}

impl ComponentSource for ComponentModel {
    type Machine = MachineModel;

    fn owned_state_machines(&self) -> Vec<&MachineModel> {
        self.state_machines.iter().collect()
    }
}

impl MachineSource for MachineModel {
    type Region = RegionModel;

    fn owned_regions(&self) -> Vec<&RegionModel> {
        self.regions.iter().collect()
    }
}

impl RegionSource for RegionModel {
    type State = StateModel;

    fn owned_states(&self) -> Vec<&StateModel> {
        self.states.iter().collect()
    }
}

impl StateSource for StateModel {
    type Region = RegionModel;
    type Transition = TransitionModel;
    type Link = ElementRef;

    fn incoming(&self) -> Vec<&TransitionModel> {
        self.incoming.iter().collect()
    }

    fn outgoing(&self) -> Vec<&TransitionModel> {
        self.outgoing.iter().collect()
    }

    fn realized_states(&self) -> Vec<&ElementRef> {
        self.realized_states.iter().collect()
    }

    fn realizing_states(&self) -> Vec<&ElementRef> {
        self.realizing_states.iter().collect()
    }

    fn owned_regions(&self) -> Option<Vec<&RegionModel>> {
        self.regions.as_ref().map(|regions| regions.iter().collect())
    }
}

impl TransitionSource for TransitionModel {
    type Target = ElementRef;
    type Trigger = ElementRef;

    fn targets(&self) -> Vec<Option<&ElementRef>> {
        self.targets.iter().map(Option::as_ref).collect()
    }

    fn triggers(&self) -> Vec<&ElementRef> {
        self.triggers.iter().collect()
    }
}
