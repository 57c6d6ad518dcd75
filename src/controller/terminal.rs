//! Line-oriented presenter for `chartstep-cli simulate`.

use std::io::{BufRead, Write};

use super::{Command, ControllerResult, Presenter};
use crate::navigator::StepView;

pub struct TerminalPresenter<R: BufRead, W: Write> {
    input: R,
    output: W,
    names: Vec<String>,
}

impl<R: BufRead, W: Write> TerminalPresenter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self {
            input,
            output,
            names: Vec::new(),
        }
    }

    pub fn into_output(self) -> W {
        self.output
    }

    /// Map shortcuts and button labels onto command tokens; anything else
    /// is returned as typed.
    fn normalize(line: &str) -> String {
        if let Some(token) = Command::token_for_button(&line.to_ascii_uppercase()) {
            return token.to_string();
        }
        match line.to_ascii_lowercase().as_str() {
            "n" => "next_step".to_string(),
            "p" | "prev" => "previous_step".to_string(),
            "a" | "auto" => "automatic".to_string(),
            "q" | "quit" => "finalize".to_string(),
            _ => line.to_string(),
        }
    }
}

impl<R: BufRead, W: Write> Presenter for TerminalPresenter<R, W> {
    fn build_command_interface(&mut self, buttons: &[String]) -> ControllerResult<()> {
        self.names = buttons
            .iter()
            .filter(|b| Command::token_for_button(b).is_none())
            .cloned()
            .collect();
        writeln!(self.output, "State Machine Simulator")?;
        let labels: Vec<String> = buttons.iter().map(|b| format!("[{b}]")).collect();
        writeln!(self.output, "{}", labels.join(" "))?;
        writeln!(
            self.output,
            "commands: next (n), previous (p), automatic (a), finalize (q), or a statechart name"
        )?;
        self.output.flush()?;
        Ok(())
    }

    /// Re-prompts on blank lines and on input that is no command, so typos
    /// never reach the controller.
    fn listen(&mut self) -> ControllerResult<Option<String>> {
        loop {
            write!(self.output, "> ")?;
            self.output.flush()?;

            let mut line = String::new();
            if self.input.read_line(&mut line)? == 0 {
                return Ok(None);
            }
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let token = Self::normalize(line);
            let names: Vec<&str> = self.names.iter().map(String::as_str).collect();
            if Command::parse(&token, &names).is_ok() {
                return Ok(Some(token));
            }
            writeln!(self.output, "unknown command '{line}'")?;
        }
    }

    fn render(&mut self, steps: &[StepView], selected: Option<&str>) -> ControllerResult<()> {
        for view in steps {
            if selected.is_some_and(|name| name != view.name) {
                continue;
            }
            let step = &view.step;
            writeln!(self.output, "-->> MicroStep {} [{}]", view.index, view.name)?;
            writeln!(self.output, "event: {}", step.event.as_deref().unwrap_or("-"))?;
            writeln!(
                self.output,
                "transition: {}",
                step.transition.as_deref().unwrap_or("-")
            )?;
            writeln!(self.output, "entered_states: {:?}", step.entered_states)?;
            writeln!(self.output, "exited_states: {:?}", step.exited_states)?;
            writeln!(self.output, "sent_events: {:?}", step.sent_events)?;
        }
        self.output.flush()?;
        Ok(())
    }
}
