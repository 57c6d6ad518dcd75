//! chartstep CLI - inspect, translate, record and simulate model state machines

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use thiserror::Error;

use chartstep::bridge::to_exchange_format;
use chartstep::config::{ConfigError, SimConfig};
use chartstep::controller::{ControllerError, SimulationController, TerminalPresenter};
use chartstep::engine::{
    EngineBackend, EngineError, EngineKind, RecordedTrace, Recording, StatechartEngine,
};
use chartstep::navigator::{NavigatorSettings, StepNavigator};
use chartstep::parser::{load_model_file, ParseError};
use chartstep::translator::{outline_session, translate_session, TranslationOptions};
use chartstep::{ExchangeFormat, StatechartDefinition, TranslationError};

#[derive(Parser)]
#[command(name = "chartstep-cli", version, about = "Statechart translation and step-through simulation")]
struct Cli {
    /// JSON config file
    #[arg(short, long, global = true, env = "CHARTSTEP_CONFIG")]
    config: Option<PathBuf>,

    /// Step budget per statechart
    #[arg(long, global = true)]
    max_steps: Option<usize>,

    /// Drop terminal states nobody targets (historical output)
    #[arg(long, global = true)]
    legacy: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the collected region/state tree
    Inspect { model: PathBuf },
    /// Print the exchange document of every statechart
    Translate {
        model: PathBuf,
        /// yaml or json
        #[arg(long)]
        format: Option<ExchangeFormat>,
        /// Emit the first trigger of each transition as its event
        #[arg(long)]
        events: bool,
    },
    /// Run the engine once per statechart and store the traces
    Record {
        model: PathBuf,
        #[arg(short, long)]
        out: PathBuf,
    },
    /// Step through the traces in the terminal
    Simulate {
        model: PathBuf,
        /// sismic or recorded
        #[arg(long)]
        engine: Option<EngineKind>,
        /// Trace file for the recorded engine
        #[arg(long)]
        recording: Option<PathBuf>,
    },
}

#[derive(Error, Debug)]
enum CliError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Translation(#[from] TranslationError),
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error(transparent)]
    Controller(#[from] ControllerError),
    #[error("Output failed: {0}")]
    Io(#[from] io::Error),
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("❌ {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let mut config = SimConfig::load_or_default(cli.config.as_deref())?;
    if let Some(max_steps) = cli.max_steps {
        config.max_steps = max_steps;
    }
    if cli.legacy {
        config.synthesis.keep_terminal_states = false;
    }

    match cli.command {
        Commands::Inspect { model } => inspect(&model, &config.synthesis),
        Commands::Translate {
            model,
            format,
            events,
        } => {
            if let Some(format) = format {
                config.format = format;
            }
            if events {
                config.synthesis.emit_trigger_events = true;
            }
            translate(&model, &config)
        }
        Commands::Record { model, out } => {
            config.validate()?;
            record(&model, &out, &config)
        }
        Commands::Simulate {
            model,
            engine,
            recording,
        } => {
            if let Some(engine) = engine {
                config.engine = engine;
            }
            if recording.is_some() {
                config.recording = recording;
            }
            config.validate()?;
            simulate(&model, &config)
        }
    }
}

fn statecharts(
    model: &Path,
    options: &TranslationOptions,
) -> Result<Vec<StatechartDefinition>, CliError> {
    Ok(chartstep::load_statecharts(model, options)?)
}

fn inspect(model: &Path, options: &TranslationOptions) -> Result<(), CliError> {
    let document = load_model_file(model)?;
    let charts = translate_session(&document, options);

    let mut out = io::stdout().lock();
    write!(out, "{}", outline_session(&document))?;
    writeln!(out)?;
    writeln!(out, "✅ {} statechart(s):", charts.len())?;
    for chart in &charts {
        writeln!(out, "  {}", chart.name)?;
        for region in chart.regions() {
            writeln!(
                out,
                "    region {} ({} states, initial: {})",
                region.name,
                region.states.len(),
                region.initial_state.as_deref().unwrap_or("-")
            )?;
        }
    }
    Ok(())
}

fn translate(model: &Path, config: &SimConfig) -> Result<(), CliError> {
    let charts = statecharts(model, &config.synthesis)?;
    let mut out = io::stdout().lock();
    for chart in &charts {
        let text = to_exchange_format(chart, config.format, config.synthesis.emit_trigger_events)?;
        writeln!(out, "# {}", chart.name)?;
        writeln!(out, "{}", text.trim_end())?;
    }
    Ok(())
}

fn record(model: &Path, out: &Path, config: &SimConfig) -> Result<(), CliError> {
    let charts = statecharts(model, &config.synthesis)?;
    let mut engine = EngineBackend::from_config(config)?;
    let mut recording = Recording::default();

    for chart in &charts {
        match record_one(&mut engine, chart, config) {
            Ok(trace) => {
                println!("  {}: {} micro-step(s)", chart.name, trace.steps.len());
                recording.push(trace);
            }
            Err(e) => log::error!("skipping '{}': {}", chart.name, e),
        }
    }

    recording.save(out)?;
    println!("✅ Recorded {} trace(s) to {}", recording.traces.len(), out.display());
    Ok(())
}

fn record_one(
    engine: &mut EngineBackend,
    chart: &StatechartDefinition,
    config: &SimConfig,
) -> Result<RecordedTrace, CliError> {
    let document = to_exchange_format(chart, config.format, config.synthesis.emit_trigger_events)?;
    let executable = engine.load(chart, document, config.format)?;
    let steps = engine.execute(&executable, config.max_steps)?;
    let diagram = engine
        .diagram(&executable)
        .map_err(|e| log::warn!("no diagram for '{}': {}", chart.name, e))
        .ok();
    Ok(RecordedTrace {
        name: chart.name.clone(),
        steps,
        diagram,
    })
}

fn simulate(model: &Path, config: &SimConfig) -> Result<(), CliError> {
    let charts = statecharts(model, &config.synthesis)?;
    let engine = EngineBackend::from_config(config)?;
    let mut navigator = StepNavigator::new(engine, charts, NavigatorSettings::from_config(config));
    navigator.start();

    for failure in navigator.failures() {
        eprintln!("⚠️  {}: {}", failure.name, failure.error);
    }

    let presenter = TerminalPresenter::new(io::stdin().lock(), io::stdout());
    let mut controller = SimulationController::new(navigator, presenter);
    controller.run()?;
    println!("Simulation finalized!");
    Ok(())
}
