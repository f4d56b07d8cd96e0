//! Wire codec for the `{type, data}` envelope carried in text frames.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// The two-field message every frame on the wire carries.
///
/// `kind` is the discriminator consumers filter on (`"type"` on the wire);
/// `data` is passed through untouched.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Envelope {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub data: Value,
}

impl Envelope {
    pub fn new(kind: impl Into<String>, data: Value) -> Self {
        Self {
            kind: kind.into(),
            data,
        }
    }

    pub fn is(&self, kind: &str) -> bool {
        self.kind == kind
    }
}

/// A received frame that could not be decoded into an [`Envelope`].
#[derive(Error, Debug, Clone, PartialEq)]
#[error("Malformed frame: {reason}")]
pub struct MalformedFrame {
    pub reason: String,
    pub frame: String,
}

/// Serializes an envelope into a text frame.
pub fn encode(envelope: &Envelope) -> Result<String, serde_json::Error> {
    serde_json::to_string(envelope)
}

/// Parses a text frame. Extra fields are ignored, a missing `data` becomes `null`,
/// and anything that is not an object with a string `type` is reported as malformed.
pub fn decode(frame: &str) -> Result<Envelope, MalformedFrame> {
    let malformed = |reason: String| MalformedFrame {
        reason,
        frame: frame.to_string(),
    };

    let value: Value = serde_json::from_str(frame).map_err(|e| malformed(e.to_string()))?;
    if !value.is_object() {
        return Err(malformed("expected a JSON object".to_string()));
    }
    serde_json::from_value(value).map_err(|e| malformed(e.to_string()))
}
