//! # Step: The Invocation Convention
//!
//! Every unit of work handed to a combinator is a [`StepSpec`]: a [`Step`]
//! bundled with its preset arguments and a label. A step is either
//!
//! * **Direct**: called with `preset ++ args`, returns its value at once, or
//! * **Continuation**: called with `preset ++ args` and a [`Continuation`],
//!   which it must resume exactly once with its results.
//!
//! The variant is chosen by whoever builds the `StepSpec`. The runtime never
//! calls a step to find out how it behaves; it matches on the variant.

use crate::continuation::Continuation;
use crate::error::{StepError, StepResult};
use crate::schematic::Schematic;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Ordered argument sequence passed to a step.
pub type Args = Vec<Value>;

pub type DirectFn = Arc<dyn Fn(Args) -> StepResult<Value> + Send + Sync>;
pub type ContinuationFn = Arc<dyn Fn(Args, Continuation) -> StepResult<()> + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mode {
    Direct,
    Continuation,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Direct => f.write_str("direct"),
            Mode::Continuation => f.write_str("continuation"),
        }
    }
}

/// A callable in one of the two shapes.
#[derive(Clone)]
pub enum Step {
    Direct(DirectFn),
    Continuation(ContinuationFn),
}

impl Step {
    pub fn mode(&self) -> Mode {
        match self {
            Step::Direct(_) => Mode::Direct,
            Step::Continuation(_) => Mode::Continuation,
        }
    }

    /// Run either shape, delivering the outcome into `next`.
    ///
    /// A Direct result is resumed as the single value `[result]`.
    pub fn call_into(&self, args: Args, next: Continuation) -> StepResult<()> {
        match self {
            Step::Direct(f) => {
                let value = f(args)?;
                next.resume(vec![value])
            }
            Step::Continuation(f) => f(args, next),
        }
    }
}

impl fmt::Debug for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Step::{:?}", self.mode())
    }
}

/// A step together with its preset arguments.
#[derive(Clone)]
pub struct StepSpec {
    step: Step,
    preset: Args,
    label: String,
    inner: Option<Arc<Schematic>>,
}

impl StepSpec {
    pub fn new(label: impl Into<String>, step: Step) -> Self {
        Self {
            step,
            preset: Vec::new(),
            label: label.into(),
            inner: None,
        }
    }

    /// Build a Direct step from a closure.
    pub fn direct<F>(label: impl Into<String>, f: F) -> Self
    where
        F: Fn(Args) -> StepResult<Value> + Send + Sync + 'static,
    {
        Self::new(label, Step::Direct(Arc::new(f)))
    }

    /// Build a continuation-based step from a closure.
    pub fn continuation<F>(label: impl Into<String>, f: F) -> Self
    where
        F: Fn(Args, Continuation) -> StepResult<()> + Send + Sync + 'static,
    {
        Self::new(label, Step::Continuation(Arc::new(f)))
    }

    /// Arguments prepended to every call.
    pub fn with_preset(mut self, preset: Args) -> Self {
        self.preset = preset;
        self
    }

    /// Attach the structure of a composed step, for schematic export.
    pub fn with_schematic(mut self, schematic: Schematic) -> Self {
        self.inner = Some(Arc::new(schematic));
        self
    }

    pub fn mode(&self) -> Mode {
        self.step.mode()
    }

    pub fn is_direct(&self) -> bool {
        self.mode() == Mode::Direct
    }

    pub fn step(&self) -> &Step {
        &self.step
    }

    pub fn preset(&self) -> &[Value] {
        &self.preset
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn schematic(&self) -> Option<&Schematic> {
        self.inner.as_deref()
    }

    /// `preset ++ args`
    pub fn arguments(&self, args: Args) -> Args {
        if self.preset.is_empty() {
            return args;
        }
        let mut all = Vec::with_capacity(self.preset.len() + args.len());
        all.extend(self.preset.iter().cloned());
        all.extend(args);
        all
    }

    pub fn call(&self, args: Args) -> StepResult<Value> {
        match &self.step {
            Step::Direct(f) => f(self.arguments(args)),
            Step::Continuation(_) => Err(self.misuse("called without a continuation")),
        }
    }

    pub fn call_with(&self, args: Args, next: Continuation) -> StepResult<()> {
        match &self.step {
            Step::Continuation(f) => f(self.arguments(args), next),
            Step::Direct(_) => Err(self.misuse("is direct but was handed a continuation")),
        }
    }

    pub fn call_into(&self, args: Args, next: Continuation) -> StepResult<()> {
        self.step.call_into(self.arguments(args), next)
    }

    fn misuse(&self, what: &str) -> StepError {
        tracing::warn!(step = %self.label, mode = %self.mode(), "step {what}");
        StepError::MisusedContinuation(format!("step `{}` {what}", self.label))
    }
}

impl fmt::Debug for StepSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StepSpec")
            .field("label", &self.label)
            .field("mode", &self.mode())
            .field("preset", &self.preset)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::continuation::capture;
    use serde_json::json;

    fn concat() -> StepSpec {
        StepSpec::direct("concat", |args| Ok(Value::Array(args)))
    }

    #[test]
    fn preset_args_come_first() {
        let spec = concat().with_preset(vec![json!("a"), json!("b")]);
        let out = spec.call(vec![json!("c")]).unwrap();
        assert_eq!(out, json!(["a", "b", "c"]));
    }

    #[test]
    fn direct_spec_rejects_continuation() {
        let err = concat()
            .call_with(vec![], Continuation::discard())
            .unwrap_err();
        assert!(err.is_misuse());
    }

    #[test]
    fn continuation_spec_rejects_direct_call() {
        let spec = StepSpec::continuation("echo", |args, next| next.resume(args));
        assert_eq!(spec.mode(), Mode::Continuation);
        assert!(spec.call(vec![]).unwrap_err().is_misuse());
    }

    #[test]
    fn call_into_adapts_direct_results() {
        let (k, captured) = capture("out");
        concat()
            .with_preset(vec![json!(1)])
            .call_into(vec![json!(2)], k)
            .unwrap();
        assert_eq!(captured.take(), Some(vec![json!([1, 2])]));
    }

    #[test]
    fn step_errors_propagate_untouched() {
        let spec = StepSpec::direct("fails", |_| Err(anyhow::anyhow!("bad input").into()));
        let err = spec.call(vec![]).unwrap_err();
        assert!(matches!(err, StepError::Other(_)));
        assert_eq!(err.to_string(), "bad input");
    }
}
