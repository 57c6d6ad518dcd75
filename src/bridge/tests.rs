//! Unit tests for the serialization bridge

use crate::bridge::{
    from_engine_response, to_exchange_format, to_sismic_document, ExchangeFormat,
    SismicDocument, TranslationError,
};
use crate::chart::{Region, StateDef, StatechartDefinition, TransitionDef};
use crate::config::ConfigError;

fn transition(triggers: &[&str]) -> TransitionDef {
    TransitionDef {
        triggers: triggers.iter().map(|t| t.to_string()).collect(),
    }
}

fn toggle_chart() -> StatechartDefinition {
    let mut region = Region::new("Main");
    region.initial_state = Some("Idle".to_string());

    let mut idle = StateDef::default();
    idle.transitions.insert(Some("Active".to_string()), transition(&["press"]));
    let mut active = StateDef::default();
    active.transitions.insert(Some("Idle".to_string()), transition(&["press", "timeout"]));
    active.transitions.insert(None, transition(&[]));

    region.states.insert("Idle".to_string(), idle);
    region.states.insert("Active".to_string(), active);
    StatechartDefinition::new("Toggle").with_region(region)
}

#[test]
fn test_document_nests_regions_under_root() {
    let doc = to_sismic_document(&toggle_chart(), false);
    assert_eq!(doc.statechart.name, "Toggle");
    assert_eq!(doc.statechart.root_state.name, "root");

    let regions = &doc.statechart.root_state.parallel_states;
    assert_eq!(regions.len(), 1);
    assert_eq!(regions[0].name, "Main");
    assert_eq!(regions[0].initial.as_deref(), Some("Idle"));

    let names: Vec<&str> = regions[0].states.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["Idle", "Active"]);
}

#[test]
fn test_unresolved_target_has_no_target_key() {
    let doc = to_sismic_document(&toggle_chart(), false);
    let on = &doc.statechart.root_state.parallel_states[0].states[1];
    assert_eq!(on.transitions.len(), 2);
    assert_eq!(on.transitions[0].target.as_deref(), Some("Idle"));
    assert_eq!(on.transitions[1].target, None);

    let json = to_exchange_format(&toggle_chart(), ExchangeFormat::Json, false).unwrap();
    assert!(!json.contains("null"));
}

#[test]
fn test_events_only_when_requested() {
    let silent = to_sismic_document(&toggle_chart(), false);
    let idle = &silent.statechart.root_state.parallel_states[0].states[0];
    assert_eq!(idle.transitions[0].event, None);

    let loud = to_sismic_document(&toggle_chart(), true);
    let on = &loud.statechart.root_state.parallel_states[0].states[1];
    assert_eq!(on.transitions[0].event.as_deref(), Some("press"));
    assert_eq!(on.transitions[1].event, None);
}

#[test]
fn test_yaml_uses_sismic_keys_in_order() {
    let yaml = to_exchange_format(&toggle_chart(), ExchangeFormat::Yaml, false).unwrap();

    assert!(yaml.starts_with("statechart:"));
    assert!(yaml.contains("root state:"));
    assert!(yaml.contains("parallel states:"));
    assert!(yaml.contains("initial: Idle"));

    let idle = yaml.find("name: Idle").unwrap();
    let active = yaml.find("name: Active").unwrap();
    assert!(idle < active);
    assert!(yaml.find("name: Toggle").unwrap() < yaml.find("root state:").unwrap());
}

#[test]
fn test_yaml_and_json_describe_the_same_document() {
    let chart = toggle_chart();
    let yaml = to_exchange_format(&chart, ExchangeFormat::Yaml, true).unwrap();
    let json = to_exchange_format(&chart, ExchangeFormat::Json, true).unwrap();

    let from_yaml: SismicDocument = serde_yaml_ng::from_str(&yaml).unwrap();
    let from_json: SismicDocument = serde_json::from_str(&json).unwrap();
    assert_eq!(from_yaml, from_json);
    assert_eq!(from_yaml, to_sismic_document(&chart, true));
}

#[test]
fn test_composite_state_emits_parallel_states() {
    let mut inner = Region::new("Inner");
    inner.initial_state = Some("Sub".to_string());
    inner.states.insert("Sub".to_string(), StateDef::placeholder());

    let mut outer = Region::new("Outer");
    outer.initial_state = Some("Parent".to_string());
    outer.states.insert(
        "Parent".to_string(),
        StateDef {
            parallel_regions: Some(vec![inner]),
            ..StateDef::default()
        },
    );

    let chart = StatechartDefinition::new("Nested").with_region(outer);
    let doc = to_sismic_document(&chart, false);
    let parent = &doc.statechart.root_state.parallel_states[0].states[0];
    assert_eq!(parent.parallel_states.len(), 1);
    assert_eq!(parent.parallel_states[0].name, "Inner");
    assert_eq!(parent.parallel_states[0].states[0].name, "Sub");
}

#[test]
fn test_invalid_definition_is_not_serialized() {
    let mut region = Region::new("Main");
    region.initial_state = Some("A".to_string());
    let mut a = StateDef::default();
    a.transitions.insert(Some("Missing".to_string()), TransitionDef::default());
    region.states.insert("A".to_string(), a);
    let chart = StatechartDefinition::new("Broken").with_region(region);

    match to_exchange_format(&chart, ExchangeFormat::Yaml, false) {
        Err(TranslationError::InvalidDefinition {
            statechart,
            problems,
        }) => {
            assert_eq!(statechart, "Broken");
            assert!(problems.contains("Missing"));
        }
        other => panic!("expected InvalidDefinition, got {:?}", other),
    }
}

#[test]
fn test_accepted_response_yields_executable() {
    let exec = from_engine_response(
        "Toggle",
        "statechart: {}".to_string(),
        ExchangeFormat::Yaml,
        r#"{"ok": true, "name": "Toggle"}"#,
    )
    .unwrap();

    assert_eq!(exec.name, "Toggle");
    assert_eq!(exec.document, "statechart: {}");
    assert_eq!(exec.format, ExchangeFormat::Yaml);
}

#[test]
fn test_rejection_message_is_verbatim() {
    let reply = r#"{"ok": false, "error": "StatechartError: State A is defined twice"}"#;
    match from_engine_response("Dup", String::new(), ExchangeFormat::Yaml, reply) {
        Err(TranslationError::Rejected { statechart, message }) => {
            assert_eq!(statechart, "Dup");
            assert_eq!(message, "StatechartError: State A is defined twice");
        }
        other => panic!("expected Rejected, got {:?}", other),
    }
}

#[test]
fn test_garbage_response_is_malformed() {
    let result = from_engine_response("X", String::new(), ExchangeFormat::Json, "Traceback ...");
    assert!(matches!(
        result,
        Err(TranslationError::MalformedResponse { .. })
    ));
}

#[test]
fn test_exchange_format_tags() {
    assert_eq!("yaml".parse::<ExchangeFormat>().unwrap(), ExchangeFormat::Yaml);
    assert_eq!("YML".parse::<ExchangeFormat>().unwrap(), ExchangeFormat::Yaml);
    assert_eq!(" json ".parse::<ExchangeFormat>().unwrap(), ExchangeFormat::Json);
    assert_eq!(ExchangeFormat::Json.to_string(), "json");

    match "toml".parse::<ExchangeFormat>() {
        Err(ConfigError::UnknownTag { key, value }) => {
            assert_eq!(key, "format");
            assert_eq!(value, "toml");
        }
        other => panic!("expected UnknownTag, got {:?}", other),
    }
}
