use ligature_core::{StepSpec, Value};
use serde::{Deserialize, Serialize};

/// Returns its first argument, or `null` when called without one.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IdentityNode;

impl IdentityNode {
    pub fn new() -> Self {
        Self
    }

    pub fn spec(&self) -> StepSpec {
        StepSpec::direct("identity", |args| {
            Ok(args.into_iter().next().unwrap_or_default())
        })
    }
}

/// Ignores its arguments and returns a fixed value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConstantNode {
    pub value: Value,
}

impl ConstantNode {
    pub fn new(value: impl Into<Value>) -> Self {
        Self {
            value: value.into(),
        }
    }

    pub fn spec(&self) -> StepSpec {
        let value = self.value.clone();
        StepSpec::direct("constant", move |_| Ok(value.clone()))
    }
}
