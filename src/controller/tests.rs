//! Unit tests for the simulation controller

use std::collections::VecDeque;
use std::io::Cursor;

use crate::chart::{Region, StateDef, StatechartDefinition};
use crate::controller::{
    Command, ControllerError, ControllerResult, Presenter, SimulationController,
    TerminalPresenter,
};
use crate::engine::{MicroStep, RecordedEngine};
use crate::navigator::{NavigatorSettings, NavigatorState, StepNavigator, StepView};

fn chart(name: &str) -> StatechartDefinition {
    let mut region = Region::new("R");
    region.initial_state = Some("A".to_string());
    region.states.insert("A".to_string(), StateDef::placeholder());
    StatechartDefinition::new(name).with_region(region)
}

fn navigator() -> StepNavigator<RecordedEngine> {
    let engine = RecordedEngine::default()
        .with_trace(
            "Left",
            vec![MicroStep::new(&["A"], &[]), MicroStep::new(&["B"], &["A"])],
        )
        .with_trace("Right", vec![MicroStep::new(&["X"], &[])]);
    StepNavigator::new(
        engine,
        vec![chart("Left"), chart("Right")],
        NavigatorSettings::default(),
    )
}

/// Replays a fixed command script and records what it was asked to show.
#[derive(Default)]
struct ScriptedPresenter {
    script: VecDeque<Option<String>>,
    buttons: Vec<String>,
    renders: Vec<(Vec<(String, usize)>, Option<String>)>,
}

impl ScriptedPresenter {
    fn new(tokens: &[Option<&str>]) -> Self {
        Self {
            script: tokens.iter().map(|t| t.map(str::to_string)).collect(),
            ..Self::default()
        }
    }
}

impl Presenter for ScriptedPresenter {
    fn build_command_interface(&mut self, buttons: &[String]) -> ControllerResult<()> {
        self.buttons = buttons.to_vec();
        Ok(())
    }

    fn listen(&mut self) -> ControllerResult<Option<String>> {
        Ok(self.script.pop_front().flatten())
    }

    fn render(&mut self, steps: &[StepView], selected: Option<&str>) -> ControllerResult<()> {
        self.renders.push((
            steps.iter().map(|s| (s.name.clone(), s.index)).collect(),
            selected.map(str::to_string),
        ));
        Ok(())
    }
}

#[test]
fn test_parse_commands() {
    let names = ["Left", "Right"];
    assert_eq!(Command::parse("next_step", &names).unwrap(), Command::NextStep);
    assert_eq!(
        Command::parse("previous_step", &names).unwrap(),
        Command::PreviousStep
    );
    assert_eq!(Command::parse("finalize", &names).unwrap(), Command::Finalize);
    assert_eq!(Command::parse("automatic", &names).unwrap(), Command::Automatic);
    assert_eq!(
        Command::parse("Right", &names).unwrap(),
        Command::Select("Right".to_string())
    );
}

#[test]
fn test_unknown_token_is_an_error() {
    match Command::parse("jump", &["Left"]) {
        Err(ControllerError::UnknownCommand(token)) => assert_eq!(token, "jump"),
        other => panic!("expected UnknownCommand, got {:?}", other),
    }
}

#[test]
fn test_button_tokens() {
    assert_eq!(Command::token_for_button("NEXT"), Some("next_step"));
    assert_eq!(Command::token_for_button("PREVIOUS"), Some("previous_step"));
    assert_eq!(Command::token_for_button("FINALIZE"), Some("finalize"));
    assert_eq!(Command::token_for_button("Left"), None);
}

#[test]
fn test_buttons_are_names_then_navigation() {
    let mut controller = SimulationController::new(navigator(), ScriptedPresenter::default());
    controller.build_command_interface().unwrap();
    assert_eq!(
        controller.presenter().buttons,
        vec!["Left", "Right", "NEXT", "PREVIOUS", "FINALIZE"]
    );
}

#[test]
fn test_run_until_finalize() {
    let presenter = ScriptedPresenter::new(&[
        Some("next_step"),
        Some("next_step"),
        Some("finalize"),
        Some("next_step"),
    ]);
    let mut controller = SimulationController::new(navigator(), presenter);
    controller.run().unwrap();

    assert_eq!(controller.navigator().state(), NavigatorState::Finalized);
    assert!(controller.current().is_none());
    // The command after finalize is never polled.
    assert_eq!(controller.presenter().script.len(), 1);

    let renders = &controller.presenter().renders;
    assert_eq!(renders.len(), 2);
    assert_eq!(
        renders[1].0,
        vec![("Left".to_string(), 1), ("Right".to_string(), 0)]
    );
}

#[test]
fn test_close_is_finalize() {
    let presenter = ScriptedPresenter::new(&[Some("next_step"), None]);
    let mut controller = SimulationController::new(navigator(), presenter);
    controller.run().unwrap();
    assert_eq!(controller.navigator().state(), NavigatorState::Finalized);
}

#[test]
fn test_select_only_changes_display() {
    let presenter = ScriptedPresenter::new(&[
        Some("Right"),
        Some("next_step"),
        Some("Left"),
        Some("finalize"),
    ]);
    let mut controller = SimulationController::new(navigator(), presenter);
    controller.run().unwrap();

    let renders = &controller.presenter().renders;
    // Nothing to show before the first step.
    assert_eq!(renders.len(), 2);
    assert_eq!(renders[0].1.as_deref(), Some("Right"));
    assert_eq!(renders[1].1.as_deref(), Some("Left"));
    assert_eq!(renders[0].0, renders[1].0);
    assert_eq!(controller.navigator().step_index(), 0);
}

#[test]
fn test_unknown_command_ends_run() {
    let presenter = ScriptedPresenter::new(&[Some("bogus"), Some("next_step"), Some("finalize")]);
    let mut controller = SimulationController::new(navigator(), presenter);
    match controller.run() {
        Err(ControllerError::UnknownCommand(token)) => assert_eq!(token, "bogus"),
        other => panic!("expected UnknownCommand, got {:?}", other),
    }
    assert!(controller.presenter().renders.is_empty());
    assert_eq!(controller.navigator().state(), NavigatorState::Unstarted);
}

#[test]
fn test_poll_surfaces_unknown_command() {
    let presenter = ScriptedPresenter::new(&[Some("bogus")]);
    let mut controller = SimulationController::new(navigator(), presenter);
    assert!(matches!(
        controller.poll(),
        Err(ControllerError::UnknownCommand(_))
    ));
    assert_eq!(controller.navigator().state(), NavigatorState::Unstarted);
}

#[test]
fn test_automatic_start_renders_nothing() {
    let mut controller = SimulationController::new(navigator(), ScriptedPresenter::default());
    assert!(controller.dispatch(Command::Automatic).unwrap());
    assert_eq!(controller.current().map(Vec::len), Some(0));
    assert!(controller.presenter().renders.is_empty());

    assert!(controller.dispatch(Command::Automatic).unwrap());
    assert_eq!(controller.presenter().renders.len(), 1);
}

#[test]
fn test_terminal_session() {
    let input = Cursor::new("n\n\nRight\nnext\nprev\nq\n");
    let presenter = TerminalPresenter::new(input, Vec::new());
    let mut controller = SimulationController::new(navigator(), presenter);
    controller.run().unwrap();

    let output = String::from_utf8(controller.into_presenter().into_output()).unwrap();
    assert!(output.starts_with("State Machine Simulator"));
    assert!(output.contains("[Left] [Right] [NEXT] [PREVIOUS] [FINALIZE]"));
    assert!(output.contains("-->> MicroStep 0 [Left]"));
    assert!(output.contains("-->> MicroStep 0 [Right]"));
    assert!(output.contains("entered_states: [\"X\"]"));
    // Left reaches index 1 only while Right is selected.
    assert!(!output.contains("-->> MicroStep 1 [Left]"));
}

#[test]
fn test_terminal_reprompts_on_typo() {
    let input = Cursor::new("jump\nn\nq\n");
    let presenter = TerminalPresenter::new(input, Vec::new());
    let mut controller = SimulationController::new(navigator(), presenter);
    controller.run().unwrap();

    let output = String::from_utf8(controller.into_presenter().into_output()).unwrap();
    assert!(output.contains("unknown command 'jump'"));
    assert!(output.contains("-->> MicroStep 0 [Left]"));
}

#[test]
fn test_terminal_eof_closes() {
    let presenter = TerminalPresenter::new(Cursor::new(""), Vec::new());
    let mut controller = SimulationController::new(navigator(), presenter);
    controller.run().unwrap();
    assert_eq!(controller.navigator().state(), NavigatorState::Finalized);
}
