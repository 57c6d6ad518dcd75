//! Simulation Controller
//! Polls a presenter for one command at a time, dispatches it to the
//! navigator and hands the result back for rendering.

mod terminal;

#[cfg(test)]
mod tests;

use thiserror::Error;

use crate::engine::StatechartEngine;
use crate::navigator::{StepNavigator, StepSet, StepView};

pub use terminal::TerminalPresenter;

pub const NEXT_BUTTON: &str = "NEXT";
pub const PREVIOUS_BUTTON: &str = "PREVIOUS";
pub const FINALIZE_BUTTON: &str = "FINALIZE";

#[derive(Error, Debug)]
pub enum ControllerError {
    #[error("Unknown command '{0}'")]
    UnknownCommand(String),
    #[error("Presenter I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

pub type ControllerResult<T> = Result<T, ControllerError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    NextStep,
    PreviousStep,
    Finalize,
    Automatic,
    /// Show only this statechart; no navigator transition
    Select(String),
}

impl Command {
    /// Parse a command token. Statechart names are only accepted when they
    /// are in `names`.
    pub fn parse(token: &str, names: &[&str]) -> ControllerResult<Self> {
        match token {
            "next_step" => Ok(Command::NextStep),
            "previous_step" => Ok(Command::PreviousStep),
            "finalize" => Ok(Command::Finalize),
            "automatic" => Ok(Command::Automatic),
            name if names.contains(&name) => Ok(Command::Select(name.to_string())),
            other => Err(ControllerError::UnknownCommand(other.to_string())),
        }
    }

    /// Command token for a navigation button label.
    pub fn token_for_button(label: &str) -> Option<&'static str> {
        match label {
            NEXT_BUTTON => Some("next_step"),
            PREVIOUS_BUTTON => Some("previous_step"),
            FINALIZE_BUTTON => Some("finalize"),
            _ => None,
        }
    }
}

/// The presentation surface driven by the controller.
pub trait Presenter {
    /// Called once with the statechart names followed by the navigation
    /// buttons.
    fn build_command_interface(&mut self, buttons: &[String]) -> ControllerResult<()>;

    /// Block for exactly one command token. `None` means the surface was
    /// closed.
    fn listen(&mut self) -> ControllerResult<Option<String>>;

    /// Display the current step set, narrowed to `selected` when set.
    fn render(&mut self, steps: &[StepView], selected: Option<&str>) -> ControllerResult<()>;
}

pub struct SimulationController<E: StatechartEngine, P: Presenter> {
    navigator: StepNavigator<E>,
    presenter: P,
    selected: Option<String>,
    current: Option<StepSet>,
}

impl<E: StatechartEngine, P: Presenter> SimulationController<E, P> {
    pub fn new(navigator: StepNavigator<E>, presenter: P) -> Self {
        Self {
            navigator,
            presenter,
            selected: None,
            current: None,
        }
    }

    /// Statechart names followed by NEXT/PREVIOUS/FINALIZE.
    pub fn buttons(&self) -> Vec<String> {
        let mut buttons: Vec<String> = self
            .navigator
            .names()
            .into_iter()
            .map(str::to_string)
            .collect();
        buttons.extend(
            [NEXT_BUTTON, PREVIOUS_BUTTON, FINALIZE_BUTTON]
                .iter()
                .map(|b| b.to_string()),
        );
        buttons
    }

    pub fn build_command_interface(&mut self) -> ControllerResult<()> {
        let buttons = self.buttons();
        self.presenter.build_command_interface(&buttons)
    }

    /// Run until the navigator is finalized or the presenter closes.
    /// An unknown command token ends the run with `UnknownCommand`.
    pub fn run(&mut self) -> ControllerResult<()> {
        self.build_command_interface()?;
        while self.poll()? {}
        log::info!("Simulation finalized");
        Ok(())
    }

    /// Process one command. Returns `false` once the session is over.
    pub fn poll(&mut self) -> ControllerResult<bool> {
        let command = match self.presenter.listen()? {
            Some(token) => Command::parse(&token, &self.navigator.names())?,
            None => {
                log::debug!("presenter closed");
                Command::Finalize
            }
        };
        self.dispatch(command)
    }

    pub fn dispatch(&mut self, command: Command) -> ControllerResult<bool> {
        log::debug!("dispatching {:?}", command);
        let result = match command {
            Command::Select(name) => {
                self.selected = Some(name);
                if let Some(steps) = &self.current {
                    self.presenter.render(steps, self.selected.as_deref())?;
                }
                return Ok(true);
            }
            Command::NextStep => self.navigator.next_step(),
            Command::PreviousStep => self.navigator.previous_step(),
            Command::Finalize => self.navigator.finalize(),
            Command::Automatic => self.navigator.automatic(),
        };

        match result {
            Some(steps) => {
                if !steps.is_empty() {
                    self.presenter.render(&steps, self.selected.as_deref())?;
                }
                self.current = Some(steps);
                Ok(true)
            }
            None => {
                self.current = None;
                Ok(false)
            }
        }
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    /// Last step set produced by the navigator, `None` after finalize.
    pub fn current(&self) -> Option<&StepSet> {
        self.current.as_ref()
    }

    pub fn navigator(&self) -> &StepNavigator<E> {
        &self.navigator
    }

    pub fn navigator_mut(&mut self) -> &mut StepNavigator<E> {
        &mut self.navigator
    }

    pub fn presenter(&self) -> &P {
        &self.presenter
    }

    pub fn presenter_mut(&mut self) -> &mut P {
        &mut self.presenter
    }

    pub fn into_presenter(self) -> P {
        self.presenter
    }
}
