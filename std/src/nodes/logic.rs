use ligature_core::{Args, Route, StepError, StepSpec, Value, is_truthy};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// `true` when the first argument is a number below `limit`.
///
/// Missing or non-numeric arguments count as `0`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LessThanNode {
    pub limit: f64,
}

impl LessThanNode {
    pub fn new(limit: impl Into<f64>) -> Self {
        Self {
            limit: limit.into(),
        }
    }

    pub fn spec(&self) -> StepSpec {
        let limit = self.limit;
        StepSpec::direct(format!("lt{limit}"), move |args| {
            let n = args.first().and_then(Value::as_f64).unwrap_or_default();
            Ok(Value::Bool(n < limit))
        })
    }
}

/// Negates the truthiness of its first argument.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NotNode;

impl NotNode {
    pub fn new() -> Self {
        Self
    }

    pub fn spec(&self) -> StepSpec {
        StepSpec::direct("not", |args| {
            let verdict = args.first().is_some_and(is_truthy);
            Ok(Value::Bool(!verdict))
        })
    }
}

/// Wraps a plain Rust predicate over the call arguments.
pub struct PredicateNode<F> {
    label: String,
    predicate: Arc<F>,
}

impl<F> PredicateNode<F>
where
    F: Fn(&[Value]) -> bool + Send + Sync + 'static,
{
    pub fn new(label: impl Into<String>, predicate: F) -> Self {
        Self {
            label: label.into(),
            predicate: Arc::new(predicate),
        }
    }

    pub fn spec(&self) -> StepSpec {
        let predicate = self.predicate.clone();
        StepSpec::direct(self.label.clone(), move |args| {
            Ok(Value::Bool(predicate(&args)))
        })
    }
}

impl<F> Clone for PredicateNode<F> {
    fn clone(&self) -> Self {
        Self {
            label: self.label.clone(),
            predicate: self.predicate.clone(),
        }
    }
}

impl<F> std::fmt::Debug for PredicateNode<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PredicateNode")
            .field("label", &self.label)
            .finish()
    }
}

/// Dispatcher root that routes on a field of its first argument.
///
/// Called with `[{"kind": "a", ..}, rest..]` it routes to key `"a"` and
/// forwards every argument unchanged. A missing field routes to `null`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwitchNode {
    pub field: String,
}

impl SwitchNode {
    pub fn on(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
        }
    }

    pub fn spec(&self) -> StepSpec {
        let field = self.field.clone();
        StepSpec::direct(format!("switch:{field}"), move |args: Args| {
            let subject = args.first().ok_or_else(|| {
                StepError::custom(format!("switch on `{field}` called without a subject"))
            })?;
            let key = match subject.get(&field) {
                Some(key) => key.clone(),
                None => {
                    tracing::debug!(field = %field, "switch subject lacks field, routing to null");
                    Value::Null
                }
            };
            Ok(Route::new(key, args).into_value())
        })
    }
}
