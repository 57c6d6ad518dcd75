//! Graph Reader: flattens the ownership hierarchy into a list of machines.

use crate::model::{ComponentSource, ModelSession, NamedElement, SystemSource};

pub type MachineOf<M> = <<M as ModelSession>::System as SystemSource>::Machine;

/// Every state machine of the logical system: the ones owned by the system
/// itself first, then each component's in component order.
pub fn read_state_machines<M: ModelSession>(session: &M) -> Vec<&MachineOf<M>> {
    let system = session.logical_system();
    let mut machines = system.owned_state_machines();

    for component in system.owned_components() {
        let owned = component.owned_state_machines();
        log::debug!(
            "component '{}' owns {} state machine(s)",
            component.name(),
            owned.len()
        );
        machines.extend(owned);
    }

    log::info!("read {} state machine(s) from the model", machines.len());
    machines
}
