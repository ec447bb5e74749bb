//! # Telemetry: Observability Decorators
//!
//! This module provides a decorator for adding tracing to any step.

use crate::continuation::Continuation;
use crate::step::{Step, StepSpec};
use std::sync::Arc;
use std::time::Instant;
use tracing::info_span;

/// A wrapper that runs the inner step inside an `info_span!("Step")`.
///
/// The wrapped spec keeps the inner preset arguments and mode. For a
/// continuation-based step the time until its continuation fires is logged
/// as well.
#[derive(Clone)]
pub struct Traced {
    inner: StepSpec,
    name: String,
}

impl Traced {
    pub fn new(inner: StepSpec, name: &str) -> Self {
        Self {
            inner,
            name: name.to_string(),
        }
    }

    pub fn into_spec(self) -> StepSpec {
        let Traced { inner, name } = self;
        let preset = inner.preset().to_vec();
        let schematic = inner.schematic().cloned();

        let step = match inner.step().clone() {
            Step::Direct(f) => {
                let name = name.clone();
                Step::Direct(Arc::new(move |args| {
                    let span = info_span!("Step", ligature.step = %name, ligature.mode = "direct");
                    let _entered = span.enter();
                    tracing::debug!(?args, "Entering step");
                    let start = Instant::now();
                    let result = f(args);
                    let duration = start.elapsed();
                    match &result {
                        Ok(value) => tracing::info!(?value, ?duration, "Step completed"),
                        Err(e) => tracing::error!(error = %e, ?duration, "Step failed"),
                    }
                    result
                }))
            }
            Step::Continuation(f) => {
                let name = name.clone();
                Step::Continuation(Arc::new(move |args, next: Continuation| {
                    let span = info_span!(
                        "Step",
                        ligature.step = %name,
                        ligature.mode = "continuation"
                    );
                    let _entered = span.enter();
                    tracing::debug!(?args, "Entering step");
                    let start = Instant::now();
                    let step_name = name.clone();
                    let label = next.label().to_string();
                    let timed = Continuation::new(label, move |values| {
                        tracing::info!(
                            step = %step_name,
                            ?values,
                            duration = ?start.elapsed(),
                            "Step resumed"
                        );
                        next.resume(values)
                    });
                    let result = f(args, timed);
                    if let Err(e) = &result {
                        tracing::error!(error = %e, "Step failed");
                    }
                    result
                }))
            }
        };

        let spec = StepSpec::new(name, step).with_preset(preset);
        match schematic {
            Some(schematic) => spec.with_schematic(schematic),
            None => spec,
        }
    }
}

/// Convenience for `Traced::new(spec, label).into_spec()`.
pub fn traced(spec: StepSpec) -> StepSpec {
    let name = spec.label().to_string();
    Traced::new(spec, &name).into_spec()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::continuation::capture;
    use crate::step::Mode;
    use serde_json::{Value, json};

    #[test]
    fn traced_direct_keeps_preset_and_result() {
        let spec = StepSpec::direct("sum", |args| {
            Ok(json!(args.iter().filter_map(Value::as_i64).sum::<i64>()))
        })
        .with_preset(vec![json!(10)]);
        let wrapped = traced(spec);
        assert_eq!(wrapped.label(), "sum");
        assert_eq!(wrapped.call(vec![json!(5)]).unwrap(), json!(15));
    }

    #[test]
    fn traced_continuation_forwards_resume() {
        let spec = StepSpec::continuation("echo", |args, next| next.resume(args));
        let wrapped = Traced::new(spec, "echo-traced").into_spec();
        assert_eq!(wrapped.mode(), Mode::Continuation);

        let (k, captured) = capture("out");
        wrapped.call_with(vec![json!("hi")], k).unwrap();
        assert_eq!(captured.take(), Some(vec![json!("hi")]));
    }
}
