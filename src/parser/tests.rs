//! Unit tests for the model language parser

use crate::model::{NamedElement, StateSource};
use crate::parser::{load_model_file, parse_model, ParseError};

#[test]
fn test_parse_system_with_components() {
    let source = r#"
        system Infotainment {
            machine SystemModes {
                region Main {
                    state Off
                    state On
                    Off --> On : power
                }
            }
            component Player {
                machine PlayerModes {
                    region Main {
                        state Idle
                        state Playing
                        Idle --> Playing
                        Playing --> Idle
                    }
                }
            }
        }
    "#;

    let model = parse_model(source).expect("Should parse successfully");
    assert_eq!(model.system.name, "Infotainment");
    assert_eq!(model.system.state_machines.len(), 1);
    assert_eq!(model.system.components.len(), 1);
    assert_eq!(model.system.components[0].name, "Player");
    assert_eq!(model.machine_names(), vec!["SystemModes", "PlayerModes"]);
}

#[test]
fn test_parse_transition_with_triggers() {
    let source = r#"
        system S {
            machine M {
                region R {
                    state A
                    state B
                    A --> B : go, hurry
                }
            }
        }
    "#;

    let model = parse_model(source).expect("Should parse successfully");
    let region = &model.system.state_machines[0].regions[0];
    let a = &region.states[0];
    assert_eq!(a.outgoing.len(), 1);

    let transition = &a.outgoing[0];
    assert_eq!(transition.source, "A");
    assert_eq!(transition.targets.len(), 1);
    assert_eq!(transition.targets[0].as_ref().map(|t| t.name()), Some("B"));
    let triggers: Vec<&str> = transition.triggers.iter().map(|t| t.name()).collect();
    assert_eq!(triggers, vec!["go", "hurry"]);
}

#[test]
fn test_parse_fan_out_and_unresolved_targets() {
    let source = r#"
        system S {
            machine M {
                region R {
                    state A
                    A --> B, C
                    A --> [*]
                }
            }
        }
    "#;

    let model = parse_model(source).expect("Should parse successfully");
    let a = &model.system.state_machines[0].regions[0].states[0];
    assert_eq!(a.outgoing.len(), 2);
    assert_eq!(a.outgoing[0].targets.len(), 2);
    assert_eq!(a.outgoing[1].targets, vec![None]);
}

#[test]
fn test_parse_transition_before_state_declaration() {
    let source = r#"
        system S {
            machine M {
                region R {
                    A -> B
                    state A
                }
            }
        }
    "#;

    let model = parse_model(source).expect("Should parse successfully");
    let region = &model.system.state_machines[0].regions[0];
    assert_eq!(region.states.len(), 1);
    assert_eq!(region.states[0].outgoing.len(), 1);
}

#[test]
fn test_parse_unknown_source_state() {
    let source = r#"
        system S {
            machine M {
                region R {
                    state A
                    Ghost --> A
                }
            }
        }
    "#;

    let err = parse_model(source).unwrap_err();
    match err {
        ParseError::UnknownState { name, line } => {
            assert_eq!(name, "Ghost");
            assert_eq!(line, 6);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_parse_composite_state_with_nested_regions() {
    let source = r#"
        system S {
            machine M {
                region R {
                    state Init
                    state Running {
                        region Audio {
                            state Muted
                            state Loud
                            Muted --> Loud
                        }
                        region Video {
                            state Dark
                            state Bright
                            Dark --> Bright
                        }
                    }
                    Init --> Running
                }
            }
        }
    "#;

    let model = parse_model(source).expect("Should parse successfully");
    let region = &model.system.state_machines[0].regions[0];
    let running = &region.states[1];
    assert!(running.is_composite());
    let nested = running.owned_regions().expect("composite state");
    assert_eq!(nested.len(), 2);
    assert_eq!(nested[0].name, "Audio");
    assert_eq!(nested[1].name, "Video");
    assert!(!region.states[0].is_composite());
}

#[test]
fn test_parse_incoming_is_linked_across_nested_regions() {
    let source = r#"
        system S {
            machine M {
                region R {
                    state A
                    state B {
                        region Inner {
                            state C
                            C --> A
                        }
                    }
                    A --> B
                }
            }
        }
    "#;

    let model = parse_model(source).expect("Should parse successfully");
    let region = &model.system.state_machines[0].regions[0];
    let a = &region.states[0];
    let b = &region.states[1];
    assert_eq!(a.incoming().len(), 1);
    assert_eq!(a.incoming()[0].source, "C");
    assert_eq!(b.incoming().len(), 1);
    assert_eq!(b.incoming()[0].source, "A");
}

#[test]
fn test_parse_realization_links_and_quoted_names() {
    let source = r#"
        system S {
            machine "Power Modes" {
                region Main {
                    state "Deep Sleep" {
                        realizes LowPower
                        realized_by "Board Sleep"
                    }
                }
            }
        }
    "#;

    let model = parse_model(source).expect("Should parse successfully");
    let machine = &model.system.state_machines[0];
    assert_eq!(machine.name, "Power Modes");
    let state = &machine.regions[0].states[0];
    assert_eq!(state.name, "Deep Sleep");
    assert_eq!(state.realized_states()[0].name(), "LowPower");
    assert_eq!(state.realizing_states()[0].name(), "Board Sleep");
    assert!(!state.is_composite());
}

#[test]
fn test_parse_keyword_prefixed_state_names() {
    let source = r#"
        system S {
            machine M {
                region R {
                    state stateful
                    state regional
                    stateful --> regional
                }
            }
        }
    "#;

    let model = parse_model(source).expect("Should parse successfully");
    let region = &model.system.state_machines[0].regions[0];
    assert_eq!(region.states[0].name, "stateful");
    assert_eq!(region.states[1].name, "regional");
    assert_eq!(region.states[0].outgoing.len(), 1);
}

#[test]
fn test_parse_comments() {
    let source = r#"
        // Top-level comment
        system S {
            %% mermaid-style comment
            machine M { region R { state A } }
        }
    "#;

    assert!(parse_model(source).is_ok());
}

#[test]
fn test_parse_rejects_missing_system() {
    assert!(matches!(
        parse_model("machine M { }"),
        Err(ParseError::PestError(_))
    ));
}

#[test]
fn test_parse_rejects_empty_quoted_name() {
    let source = r#"system S { machine "" { } }"#;
    assert!(matches!(parse_model(source), Err(ParseError::Model(_))));
}

#[test]
fn test_load_model_file_by_extension() {
    let dir = tempfile::tempdir().expect("tempdir");

    let text_path = dir.path().join("plant.model");
    std::fs::write(
        &text_path,
        "system Plant { machine M { region R { state A state B A --> B } } }",
    )
    .expect("write model");
    let from_text = load_model_file(&text_path).expect("model language file");

    let json_path = dir.path().join("plant.json");
    std::fs::write(&json_path, from_text.to_json().expect("json")).expect("write json");
    let from_json = load_model_file(&json_path).expect("json file");

    assert_eq!(from_text, from_json);
}

#[test]
fn test_load_model_file_missing() {
    let err = load_model_file(std::path::Path::new("/definitely/not/here.model")).unwrap_err();
    assert!(matches!(err, ParseError::Io { .. }));
}
