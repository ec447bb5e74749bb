//! Loop argument channels.

use crate::error::{StepError, StepResult};
use crate::step::Args;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The two argument sequences a conditional loop threads across iterations.
///
/// Serialized as `{"toPredicate": [..], "toBody": [..]}`, which is the shape a
/// loop body must produce.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoopState {
    pub to_predicate: Args,
    pub to_body: Args,
}

impl LoopState {
    pub fn new(to_predicate: Args, to_body: Args) -> Self {
        Self {
            to_predicate,
            to_body,
        }
    }

    /// First-iteration state: `toPredicate = predicate preset`,
    /// `toBody = body preset ++ call args`.
    pub fn seed(predicate_preset: &[Value], body_preset: &[Value], args: Args) -> Self {
        let mut to_body = Vec::with_capacity(body_preset.len() + args.len());
        to_body.extend(body_preset.iter().cloned());
        to_body.extend(args);
        Self {
            to_predicate: predicate_preset.to_vec(),
            to_body,
        }
    }

    pub fn into_value(self) -> Value {
        serde_json::json!({
            "toPredicate": self.to_predicate,
            "toBody": self.to_body,
        })
    }

    pub fn from_value(value: Value) -> StepResult<Self> {
        serde_json::from_value(value)
            .map_err(|e| StepError::MalformedLoopState(e.to_string()))
    }
}

/// Truthiness of a predicate verdict: `null`, `false`, `0` and `""` are false,
/// everything else is true.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
