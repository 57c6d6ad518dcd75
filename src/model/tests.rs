//! Unit tests for the in-memory model graph

use crate::model::{
    ComponentModel, MachineModel, ModelDocument, ModelError, ModelSession, NamedElement,
    RegionModel, StateModel, StateSource, SystemModel, SystemSource, TransitionModel,
    TransitionSource,
};

fn ping_pong() -> MachineModel {
    MachineModel::new("PingPong").with_region(
        RegionModel::new("Main")
            .with_state(StateModel::new("Ping").to("Pong"))
            .with_state(StateModel::new("Pong").to("Ping")),
    )
}

#[test]
fn test_builders_and_accessors() {
    let mut system = SystemModel::new("Sys");
    system.state_machines.push(ping_pong());
    let document = ModelDocument::new(system).finish().expect("valid model");

    let system = document.logical_system();
    assert_eq!(system.owned_state_machines().len(), 1);
    assert!(system.owned_components().is_empty());

    let ping = &document.system.state_machines[0].regions[0].states[0];
    assert_eq!(ping.name(), "Ping");
    assert_eq!(ping.outgoing().len(), 1);
    assert_eq!(ping.incoming().len(), 1);
    assert!(ping.owned_regions().is_none());
}

#[test]
fn test_transition_target_and_trigger_names() {
    let transition = TransitionModel::new("A")
        .with_target("B")
        .with_unresolved_target()
        .with_trigger("tick");

    assert_eq!(
        transition.target_names(),
        vec![Some("B".to_string()), None]
    );
    assert_eq!(transition.trigger_names(), vec!["tick".to_string()]);
}

#[test]
fn test_from_json_links_sources_and_incoming() {
    let json = r#"{
        "system": {
            "name": "Sys",
            "components": [
                {
                    "name": "Lamp",
                    "state_machines": [
                        {
                            "name": "LampModes",
                            "regions": [
                                {
                                    "name": "Main",
                                    "states": [
                                        { "name": "Off", "outgoing": [ { "targets": ["On"], "triggers": ["press"] } ] },
                                        { "name": "On", "outgoing": [ { "targets": ["Off", null] } ] }
                                    ]
                                }
                            ]
                        }
                    ]
                }
            ]
        }
    }"#;

    let document = ModelDocument::from_json(json).expect("valid JSON model");
    let region = &document.system.components[0].state_machines[0].regions[0];
    let off = &region.states[0];
    let on = &region.states[1];

    assert_eq!(off.outgoing[0].source, "Off");
    assert_eq!(on.outgoing[0].targets.len(), 2);
    assert!(on.outgoing[0].targets[1].is_none());
    assert_eq!(off.incoming.len(), 1);
    assert_eq!(off.incoming[0].source, "On");
    assert_eq!(on.incoming.len(), 1);
}

#[test]
fn test_from_json_rejects_malformed_input() {
    let err = ModelDocument::from_json(r#"{ "system": { "components": 3 } }"#).unwrap_err();
    assert!(matches!(err, ModelError::Json(_)));
}

#[test]
fn test_finish_rejects_empty_state_name() {
    let mut system = SystemModel::new("Sys");
    system.state_machines.push(
        MachineModel::new("M").with_region(RegionModel::new("R").with_state(StateModel::new(" "))),
    );

    let err = ModelDocument::new(system).finish().unwrap_err();
    match err {
        ModelError::EmptyName { kind, path } => {
            assert_eq!(kind, "State");
            assert_eq!(path, "Sys/M/R");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_finish_rejects_foreign_transition_source() {
    let mut system = SystemModel::new("Sys");
    let mut component = ComponentModel::new("C");
    component.state_machines.push(
        MachineModel::new("M").with_region(
            RegionModel::new("R")
                .with_state(StateModel::new("A").with_transition(TransitionModel::new("Z").with_target("A"))),
        ),
    );
    system.components.push(component);

    let err = ModelDocument::new(system).finish().unwrap_err();
    assert!(matches!(err, ModelError::SourceMismatch { .. }));
}

#[test]
fn test_machine_names_lists_system_level_first() {
    let mut system = SystemModel::new("Sys");
    let mut component = ComponentModel::new("C");
    component.state_machines.push(MachineModel::new("Owned"));
    system.components.push(component);
    system.state_machines.push(MachineModel::new("Top"));

    let document = ModelDocument::new(system);
    assert_eq!(document.machine_names(), vec!["Top", "Owned"]);
}
