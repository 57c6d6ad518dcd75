//! Subprocess backend talking to the Python `sismic` interpreter through
//! `tools/sismic_bridge.py`: one JSON request on stdin, one JSON reply on
//! stdout.

use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use serde::{Deserialize, Serialize};

use crate::bridge::{self, ExchangeFormat, ExecutableStatechart, TranslationResult};
use crate::chart::StatechartDefinition;

use super::{EngineError, EngineResult, MicroStep, StatechartEngine};

const BRIDGE_SCRIPT: &str = "tools/sismic_bridge.py";

/// `python3` from PATH. Environment overrides live in `SimConfig::python_path`.
pub fn default_python() -> PathBuf {
    PathBuf::from("python3")
}

/// Bridge script next to the executable (plain, `resources/`, or
/// `../share/chartstep/`), then the source tree.
pub fn default_bridge_script() -> PathBuf {
    if let Ok(exe) = std::env::current_exe() {
        if let Some(exe_dir) = exe.parent() {
            let sibling = exe_dir.join(BRIDGE_SCRIPT);
            if sibling.exists() {
                return sibling;
            }

            let resources = exe_dir.join("resources").join(BRIDGE_SCRIPT);
            if resources.exists() {
                return resources;
            }

            // Debian package layout: /usr/bin/<bin> → /usr/share/chartstep/tools
            if let Some(usr_dir) = exe_dir.parent() {
                let shared = usr_dir.join("share/chartstep").join(BRIDGE_SCRIPT);
                if shared.exists() {
                    return shared;
                }
            }
        }
    }

    // Dev fallback
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join(BRIDGE_SCRIPT)
}

#[derive(Serialize)]
struct BridgeRequest<'a> {
    command: &'a str,
    definition: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_steps: Option<usize>,
}

#[derive(Deserialize)]
struct ExecuteReply {
    ok: bool,
    #[serde(default)]
    steps: Vec<MicroStep>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Deserialize)]
struct DiagramReply {
    ok: bool,
    #[serde(default)]
    diagram: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SismicEngine {
    python: PathBuf,
    script: PathBuf,
}

impl SismicEngine {
    pub fn new(python: impl Into<PathBuf>, script: impl Into<PathBuf>) -> Self {
        Self {
            python: python.into(),
            script: script.into(),
        }
    }

    fn request(&self, request: &BridgeRequest<'_>) -> EngineResult<String> {
        let input = serde_json::to_vec(request)?;

        let mut child = Command::new(&self.python)
            .arg(&self.script)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| EngineError::Spawn {
                program: self.python.display().to_string(),
                source,
            })?;

        {
            let stdin = child.stdin.as_mut().ok_or_else(|| {
                EngineError::Io(std::io::Error::new(
                    std::io::ErrorKind::BrokenPipe,
                    "bridge stdin unavailable",
                ))
            })?;
            stdin.write_all(&input)?;
        }

        let output = child.wait_with_output()?;
        if !output.status.success() {
            return Err(EngineError::Failed {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl StatechartEngine for SismicEngine {
    fn load(
        &mut self,
        chart: &StatechartDefinition,
        document: String,
        format: ExchangeFormat,
    ) -> TranslationResult<ExecutableStatechart> {
        log::debug!("loading '{}' into sismic via {}", chart.name, self.script.display());
        let reply = self.request(&BridgeRequest {
            command: "load",
            definition: &document,
            max_steps: None,
        })?;
        bridge::from_engine_response(&chart.name, document, format, &reply)
    }

    fn execute(
        &mut self,
        chart: &ExecutableStatechart,
        max_steps: usize,
    ) -> EngineResult<Vec<MicroStep>> {
        let reply = self.request(&BridgeRequest {
            command: "execute",
            definition: &chart.document,
            max_steps: Some(max_steps),
        })?;
        let reply: ExecuteReply = serde_json::from_str(reply.trim())?;
        if !reply.ok {
            return Err(EngineError::Execution {
                statechart: chart.name.clone(),
                message: reply.error.unwrap_or_default(),
            });
        }
        Ok(reply.steps)
    }

    fn diagram(&mut self, chart: &ExecutableStatechart) -> EngineResult<String> {
        let reply = self.request(&BridgeRequest {
            command: "diagram",
            definition: &chart.document,
            max_steps: None,
        })?;
        let reply: DiagramReply = serde_json::from_str(reply.trim())?;
        match (reply.ok, reply.diagram) {
            (true, Some(diagram)) => Ok(diagram),
            (true, None) => Err(EngineError::NoDiagram(chart.name.clone())),
            (false, _) => Err(EngineError::Execution {
                statechart: chart.name.clone(),
                message: reply.error.unwrap_or_default(),
            }),
        }
    }
}
