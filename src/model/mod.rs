//! Source Model Graph
//! Read-only capability set over a hierarchical model (system, components,
//! state machines, regions, states, transitions) plus an in-memory graph
//! that implements it.

mod memory;

#[cfg(test)]
mod tests;

pub use memory::{
    ComponentModel, ElementRef, MachineModel, ModelDocument, ModelError, ModelResult,
    RegionModel, StateModel, SystemModel, TransitionModel,
};

/// Anything in the source graph that carries a name.
///
/// Names are not guaranteed to be unique.
pub trait NamedElement {
    fn name(&self) -> &str;
}

/// Entry point into an opened model.
pub trait ModelSession {
    type System: SystemSource;

    fn logical_system(&self) -> &Self::System;
}

/// The logical system: owns state machines directly and through components.
pub trait SystemSource {
    type Machine: MachineSource;
    type Component: ComponentSource<Machine = Self::Machine>;

    fn owned_state_machines(&self) -> Vec<&Self::Machine>;
    fn owned_components(&self) -> Vec<&Self::Component>;
}

pub trait ComponentSource: NamedElement {
    type Machine: MachineSource;

    fn owned_state_machines(&self) -> Vec<&Self::Machine>;
}

pub trait MachineSource: NamedElement {
    type Region: RegionSource;

    fn owned_regions(&self) -> Vec<&Self::Region>;
}

pub trait RegionSource: NamedElement + Sized {
    type State: StateSource<Region = Self>;

    fn owned_states(&self) -> Vec<&Self::State>;
}

/// A state (or mode) inside a region.
///
/// Every relation is a separate accessor. A state that is not composite
/// returns `None` from [`StateSource::owned_regions`].
pub trait StateSource: NamedElement {
    type Region: RegionSource;
    type Transition: TransitionSource;
    type Link: NamedElement;

    fn incoming(&self) -> Vec<&Self::Transition>;
    fn outgoing(&self) -> Vec<&Self::Transition>;
    /// Abstraction links towards states this one realizes.
    fn realized_states(&self) -> Vec<&Self::Link>;
    /// Abstraction links from states realizing this one.
    fn realizing_states(&self) -> Vec<&Self::Link>;
    fn owned_regions(&self) -> Option<Vec<&Self::Region>>;
}

pub trait TransitionSource {
    type Target: NamedElement;
    type Trigger: NamedElement;

    /// Resolved targets. `None` marks an unresolved or terminating target.
    fn targets(&self) -> Vec<Option<&Self::Target>>;
    fn triggers(&self) -> Vec<&Self::Trigger>;

    fn target_names(&self) -> Vec<Option<String>> {
        self.targets()
            .into_iter()
            .map(|t| t.map(|t| t.name().to_string()))
            .collect()
    }

    fn trigger_names(&self) -> Vec<String> {
        self.triggers().into_iter().map(|t| t.name().to_string()).collect()
    }
}
