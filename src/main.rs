//! chartstep GUI - Statechart Simulator
//! Model editor, exchange document preview and step-through controls

use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use eframe::egui;

use chartstep::bridge::to_exchange_format;
use chartstep::controller::{
    Command, ControllerResult, Presenter, SimulationController, FINALIZE_BUTTON, NEXT_BUTTON,
    PREVIOUS_BUTTON,
};
use chartstep::engine::EngineBackend;
use chartstep::model::ModelDocument;
use chartstep::navigator::{NavigatorSettings, NavigatorState, StepNavigator, StepView};
use chartstep::parser::{parse_model, ParseError};
use chartstep::translator::{outline_session, translate_session};
use chartstep::{SimConfig, StatechartDefinition};

const DEMO_MODEL: &str = include_str!("../demos/plant.model");

fn chartstep_icon() -> egui::IconData {
    // Generated 64x64 icon: dark tile with three ascending step bars.
    let w: u32 = 64;
    let h: u32 = 64;
    let mut rgba = vec![0u8; (w * h * 4) as usize];
    let bars = [(10u32, 40u32), (26, 26), (42, 12)];

    for y in 0..h {
        for x in 0..w {
            let mut px = [24u8, 28, 36, 255];

            for (i, (left, top)) in bars.iter().enumerate() {
                if x >= *left && x < left + 12 && y >= *top && y < 54 {
                    let shade = 40 * i as u8;
                    px = [70 + shade, 150 + shade / 2, 220, 255];
                }
            }

            let idx = ((y * w + x) * 4) as usize;
            rgba[idx..idx + 4].copy_from_slice(&px);
        }
    }

    egui::IconData {
        rgba,
        width: w,
        height: h,
    }
}

fn main() -> eframe::Result<()> {
    env_logger::init();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1300.0, 850.0])
            .with_title("chartstep - Statechart Simulator")
            .with_icon(chartstep_icon()),
        ..Default::default()
    };

    eframe::run_native(
        "chartstep",
        options,
        Box::new(|cc| Ok(Box::new(ChartstepApp::new(cc)))),
    )
}

/// Presenter backed by the window: button clicks are queued as command
/// tokens and the controller's renders are kept for the next frame.
#[derive(Default)]
struct WindowPresenter {
    pending: VecDeque<String>,
    buttons: Vec<String>,
    shown: Vec<StepView>,
    selected: Option<String>,
}

impl Presenter for WindowPresenter {
    fn build_command_interface(&mut self, buttons: &[String]) -> ControllerResult<()> {
        self.buttons = buttons.to_vec();
        Ok(())
    }

    fn listen(&mut self) -> ControllerResult<Option<String>> {
        // An empty queue means the window is closing.
        Ok(self.pending.pop_front())
    }

    fn render(&mut self, steps: &[StepView], selected: Option<&str>) -> ControllerResult<()> {
        self.shown = steps.to_vec();
        self.selected = selected.map(str::to_string);
        Ok(())
    }
}

type Session = SimulationController<EngineBackend, WindowPresenter>;

struct ChartstepApp {
    /// Model source (model language or JSON)
    source: String,
    source_path: Option<PathBuf>,
    config: SimConfig,
    config_path: Option<PathBuf>,
    /// Collected tree of the last good parse
    outline: String,
    statecharts: Vec<StatechartDefinition>,
    /// Exchange document (or its error) per statechart
    documents: Vec<Result<String, String>>,
    /// Statechart shown in the document panel
    preview: usize,
    error_message: Option<String>,
    status: String,
    show_model_panel: bool,
    show_document_panel: bool,
    session: Option<Session>,
}

impl ChartstepApp {
    fn new(_cc: &eframe::CreationContext<'_>) -> Self {
        let mut app = Self {
            source: DEMO_MODEL.to_string(),
            source_path: None,
            config: SimConfig::default(),
            config_path: None,
            outline: String::new(),
            statecharts: Vec::new(),
            documents: Vec::new(),
            preview: 0,
            error_message: None,
            status: "Ready".to_string(),
            show_model_panel: true,
            show_document_panel: true,
            session: None,
        };
        app.parse_source();
        app
    }

    fn parse_document(&self) -> Result<ModelDocument, ParseError> {
        if self.source.trim_start().starts_with('{') {
            Ok(ModelDocument::from_json(&self.source)?)
        } else {
            parse_model(&self.source)
        }
    }

    fn parse_source(&mut self) {
        match self.parse_document() {
            Ok(document) => {
                self.outline = outline_session(&document);
                self.statecharts = translate_session(&document, &self.config.synthesis);
                self.error_message = None;
                self.refresh_documents();
            }
            Err(e) => {
                self.error_message = Some(e.to_string());
            }
        }
    }

    fn refresh_documents(&mut self) {
        let emit = self.config.synthesis.emit_trigger_events;
        self.documents = self
            .statecharts
            .iter()
            .map(|chart| {
                to_exchange_format(chart, self.config.format, emit).map_err(|e| e.to_string())
            })
            .collect();
        if self.preview >= self.statecharts.len() {
            self.preview = 0;
        }
    }

    fn open_model(&mut self, path: &Path) {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                self.source = content;
                self.source_path = Some(path.to_path_buf());
                self.session = None;
                self.parse_source();
                self.status = format!("Opened {}", path.display());
            }
            Err(e) => self.error_message = Some(format!("{}: {}", path.display(), e)),
        }
    }

    fn open_config(&mut self, path: &Path) {
        match SimConfig::load(path) {
            Ok(config) => {
                self.config = config;
                self.config_path = Some(path.to_path_buf());
                self.session = None;
                self.parse_source();
                self.status = format!("Config {}", path.display());
            }
            Err(e) => self.error_message = Some(e.to_string()),
        }
    }

    fn start_session(&mut self) {
        let engine = match EngineBackend::from_config(&self.config) {
            Ok(engine) => engine,
            Err(e) => {
                self.error_message = Some(e.to_string());
                return;
            }
        };

        let mut navigator = StepNavigator::new(
            engine,
            self.statecharts.clone(),
            NavigatorSettings::from_config(&self.config),
        );
        navigator.start();
        let failures = navigator.failures().len();

        let mut session = SimulationController::new(navigator, WindowPresenter::default());
        if let Err(e) = session.build_command_interface() {
            self.error_message = Some(e.to_string());
            return;
        }
        self.session = Some(session);
        self.status = if failures == 0 {
            "Simulation started".to_string()
        } else {
            format!("Simulation started, {} statechart(s) failed", failures)
        };
    }

    fn session_active(&self) -> bool {
        self.session
            .as_ref()
            .is_some_and(|s| s.navigator().state() != NavigatorState::Finalized)
    }

    /// Queue one command token and let the controller process it.
    fn press(&mut self, token: &str) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        session.presenter_mut().pending.push_back(token.to_string());
        match session.poll() {
            Ok(true) => {}
            Ok(false) => self.status = "Simulation finalized!".to_string(),
            Err(e) => self.error_message = Some(e.to_string()),
        }
    }

    /// Poll with nothing queued, which the controller treats as finalize.
    fn close_session(&mut self) {
        if !self.session_active() {
            return;
        }
        if let Some(session) = self.session.as_mut() {
            session.presenter_mut().pending.clear();
            if let Err(e) = session.poll() {
                log::warn!("closing session: {}", e);
            }
        }
    }

    fn controls_ui(&mut self, ui: &mut egui::Ui) {
        let mut clicked: Option<String> = None;
        let active = self.session_active();

        ui.horizontal_wrapped(|ui| {
            if ui.button("▶ Start").clicked() {
                self.start_session();
            }
            ui.separator();

            let Some(session) = self.session.as_ref() else {
                ui.label("Press Start to run the engine");
                return;
            };

            let selected = session.selected().map(str::to_string);
            for button in &session.presenter().buttons {
                if let Some(token) = Command::token_for_button(button) {
                    if ui.add_enabled(active, egui::Button::new(button.as_str())).clicked() {
                        clicked = Some(token.to_string());
                    }
                } else {
                    let is_selected = selected.as_deref() == Some(button.as_str());
                    if ui.add_enabled(active, egui::SelectableLabel::new(is_selected, button.as_str())).clicked() {
                        clicked = Some(button.clone());
                    }
                }
            }
            if ui.add_enabled(active, egui::Button::new("AUTO")).clicked() {
                clicked = Some("automatic".to_string());
            }
        });

        if let Some(token) = clicked {
            self.press(&token);
        }
    }

    fn steps_ui(&self, ui: &mut egui::Ui) {
        let Some(session) = self.session.as_ref() else {
            return;
        };
        let navigator = session.navigator();

        for failure in navigator.failures() {
            ui.colored_label(
                egui::Color32::from_rgb(220, 80, 80),
                format!("⚠ {}: {}", failure.name, failure.error),
            );
        }

        let presenter = session.presenter();
        let selected = presenter.selected.as_deref();
        if presenter.shown.is_empty() {
            ui.label(format!(
                "Step {} · press {} to advance",
                navigator.step_index(),
                NEXT_BUTTON
            ));
            return;
        }

        egui::ScrollArea::vertical()
            .id_salt("steps")
            .show(ui, |ui| {
                for view in presenter
                    .shown
                    .iter()
                    .filter(|v| selected.map_or(true, |name| name == v.name))
                {
                    step_view_ui(ui, view);
                    ui.add_space(8.0);
                }
            });
    }
}

fn step_view_ui(ui: &mut egui::Ui, view: &StepView) {
    ui.heading(format!("{} · micro-step {}", view.name, view.index));
    let step = &view.step;

    egui::Grid::new(("step_grid", view.name.as_str()))
        .num_columns(2)
        .striped(true)
        .show(ui, |ui| {
            ui.label("event");
            ui.monospace(step.event.as_deref().unwrap_or("-"));
            ui.end_row();
            ui.label("transition");
            ui.monospace(step.transition.as_deref().unwrap_or("-"));
            ui.end_row();
            ui.label("entered_states");
            ui.monospace(step.entered_states.join(", "));
            ui.end_row();
            ui.label("exited_states");
            ui.monospace(step.exited_states.join(", "));
            ui.end_row();
            ui.label("sent_events");
            ui.monospace(step.sent_events.join(", "));
            ui.end_row();
        });

    if let Some(diagram) = &view.diagram {
        ui.collapsing(format!("Diagram ({})", view.name), |ui| {
            ui.add(
                egui::TextEdit::multiline(&mut diagram.as_str())
                    .code_editor()
                    .desired_width(f32::INFINITY),
            );
        });
    }
}

impl eframe::App for ChartstepApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Closing the window ends the simulation like FINALIZE.
        if ctx.input(|i| i.viewport().close_requested()) {
            self.close_session();
        }

        egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
            egui::menu::bar(ui, |ui| {
                ui.menu_button("File", |ui| {
                    if ui.button("Load Demo Model").clicked() {
                        self.source = DEMO_MODEL.to_string();
                        self.source_path = None;
                        self.session = None;
                        self.parse_source();
                        ui.close_menu();
                    }
                    ui.separator();
                    if ui.button("📂 Open Model...").clicked() {
                        if let Some(path) = rfd::FileDialog::new()
                            .add_filter("Model", &["model", "txt", "json"])
                            .pick_file()
                        {
                            self.open_model(&path);
                        }
                        ui.close_menu();
                    }
                    if ui.button("💾 Save Model...").clicked() {
                        if let Some(path) = rfd::FileDialog::new()
                            .add_filter("Model", &["model"])
                            .save_file()
                        {
                            if let Err(e) = std::fs::write(&path, &self.source) {
                                self.error_message = Some(e.to_string());
                            }
                        }
                        ui.close_menu();
                    }
                    if ui.button("⚙ Open Config...").clicked() {
                        if let Some(path) = rfd::FileDialog::new()
                            .add_filter("Config", &["json"])
                            .pick_file()
                        {
                            self.open_config(&path);
                        }
                        ui.close_menu();
                    }
                    ui.separator();
                    if ui.button("📤 Export Document...").clicked() {
                        if let Some(Ok(text)) = self.documents.get(self.preview) {
                            if let Some(path) = rfd::FileDialog::new()
                                .add_filter(self.config.format.as_str(), &[self.config.format.as_str()])
                                .save_file()
                            {
                                if let Err(e) = std::fs::write(&path, text) {
                                    self.error_message = Some(e.to_string());
                                }
                            }
                        }
                        ui.close_menu();
                    }
                    ui.separator();
                    if ui.button("Quit").clicked() {
                        ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                    }
                });

                ui.menu_button("View", |ui| {
                    if ui.checkbox(&mut self.show_model_panel, "Model").clicked() {
                        ui.close_menu();
                    }
                    if ui.checkbox(&mut self.show_document_panel, "Exchange Document").clicked() {
                        ui.close_menu();
                    }
                });

                ui.menu_button("Translation", |ui| {
                    let mut changed = ui
                        .checkbox(&mut self.config.synthesis.keep_terminal_states, "Keep terminal states")
                        .changed();
                    changed |= ui
                        .checkbox(&mut self.config.synthesis.emit_trigger_events, "Emit trigger events")
                        .changed();
                    if changed {
                        self.session = None;
                        self.parse_source();
                    }
                });
            });
        });

        if self.show_model_panel {
            egui::SidePanel::left("model_panel")
                .resizable(true)
                .default_width(380.0)
                .show(ctx, |ui| {
                    ui.horizontal(|ui| {
                        ui.heading("Model");
                        if let Some(path) = &self.source_path {
                            ui.label(path.display().to_string());
                        }
                    });
                    ui.separator();

                    let editor = egui::ScrollArea::vertical()
                        .id_salt("model_source")
                        .max_height(ui.available_height() * 0.6)
                        .show(ui, |ui| {
                            ui.add(
                                egui::TextEdit::multiline(&mut self.source)
                                    .code_editor()
                                    .desired_width(f32::INFINITY),
                            )
                        });
                    if editor.inner.changed() {
                        self.session = None;
                        self.parse_source();
                    }

                    if let Some(error) = &self.error_message {
                        ui.colored_label(egui::Color32::from_rgb(220, 80, 80), error);
                    }

                    ui.separator();
                    ui.label("Collected tree");
                    egui::ScrollArea::vertical()
                        .id_salt("outline")
                        .show(ui, |ui| {
                            ui.monospace(&self.outline);
                        });
                });
        }

        if self.show_document_panel {
            egui::SidePanel::right("document_panel")
                .resizable(true)
                .default_width(360.0)
                .show(ctx, |ui| {
                    ui.heading("Exchange Document");
                    ui.horizontal_wrapped(|ui| {
                        for (i, chart) in self.statecharts.iter().enumerate() {
                            if ui.selectable_label(self.preview == i, &chart.name).clicked() {
                                self.preview = i;
                            }
                        }
                    });
                    ui.separator();

                    egui::ScrollArea::vertical()
                        .id_salt("document")
                        .show(ui, |ui| match self.documents.get(self.preview) {
                            Some(Ok(text)) => {
                                ui.add(
                                    egui::TextEdit::multiline(&mut text.as_str())
                                        .code_editor()
                                        .desired_width(f32::INFINITY),
                                );
                            }
                            Some(Err(e)) => {
                                ui.colored_label(egui::Color32::from_rgb(220, 80, 80), e);
                            }
                            None => {
                                ui.label("No statecharts");
                            }
                        });
                });
        }

        egui::TopBottomPanel::bottom("info_panel").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label(concat!("chartstep v", env!("CARGO_PKG_VERSION")));
                ui.separator();
                ui.label(format!(
                    "engine: {} | format: {} | budget: {}",
                    self.config.engine, self.config.format, self.config.max_steps
                ));
                if let Some(session) = &self.session {
                    ui.separator();
                    ui.label(format!("step {}", session.navigator().step_index()));
                }
                ui.separator();
                ui.label(&self.status);
            });
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading("Simulation");
            ui.label(format!(
                "{} statechart(s) · {} / {} / {} step the shared index",
                self.statecharts.len(),
                NEXT_BUTTON,
                PREVIOUS_BUTTON,
                FINALIZE_BUTTON
            ));
            ui.separator();
            self.controls_ui(ui);
            ui.separator();
            self.steps_ui(ui);
        });
    }
}
