//! Message kinds and bodies spoken by the execution engine.
//!
//! The channel itself treats `type` as an opaque discriminator; these helpers
//! only give the views typed access to the engine's current protocol.

use relay_core::Envelope;
use serde::{Deserialize, Serialize};

/// Discriminators used by the engine.
pub mod kinds {
    /// Log lines produced while a job runs.
    pub const LOG: &str = "LOG";
    /// Run a script; the engine answers with the same kind.
    pub const RUN: &str = "RUN";
    /// Rows written to console destinations.
    pub const RESULT: &str = "RESULT";
    /// Validate a script without running it; answered with the same kind.
    pub const COMPILE: &str = "COMPILE";
    pub const OUTPUT: &str = "OUTPUT";
}

/// Body of `RUN` and `COMPILE` requests.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ScriptRequest {
    pub script: String,
}

/// Body of the engine's answer to `RUN` and `COMPILE`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct RunResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Body of `LOG`, `RESULT` and `OUTPUT` messages: one line of text.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct OutputEntry {
    pub entry: String,
}

pub fn run_script(script: impl Into<String>) -> Envelope {
    script_envelope(kinds::RUN, script.into())
}

pub fn compile_script(script: impl Into<String>) -> Envelope {
    script_envelope(kinds::COMPILE, script.into())
}

fn script_envelope(kind: &str, script: String) -> Envelope {
    Envelope::new(kind, serde_json::json!({ "script": script }))
}

/// An inbound envelope interpreted against the engine protocol.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    Log(OutputEntry),
    Result(OutputEntry),
    Output(OutputEntry),
    RunFinished(RunResponse),
    CompileFinished(RunResponse),
    /// A kind this client does not know; passed through untouched.
    Other(Envelope),
}

impl EngineEvent {
    /// Fails only when a known kind carries a body of the wrong shape.
    pub fn parse(envelope: &Envelope) -> Result<Self, serde_json::Error> {
        let data = || envelope.data.clone();
        Ok(match envelope.kind.as_str() {
            kinds::LOG => EngineEvent::Log(serde_json::from_value(data())?),
            kinds::RESULT => EngineEvent::Result(serde_json::from_value(data())?),
            kinds::OUTPUT => EngineEvent::Output(serde_json::from_value(data())?),
            kinds::RUN => EngineEvent::RunFinished(serde_json::from_value(data())?),
            kinds::COMPILE => EngineEvent::CompileFinished(serde_json::from_value(data())?),
            _ => EngineEvent::Other(envelope.clone()),
        })
    }
}
