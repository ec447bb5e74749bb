//! # Loop: Predicate-Driven Repetition
//!
//! A `Loop` alternates a predicate step and a body step while the predicate
//! holds. Two argument channels travel across iterations in a [`LoopState`]:
//! `toPredicate` feeds the predicate, `toBody` feeds the body, and the body
//! produces the next pair.
//!
//! ## Execution strategies
//!
//! | predicate | body | path |
//! |---|---|---|
//! | Direct | Direct | plain `while` loop, returns the last pair |
//! | Direct | Continuation | state machine, body resumes with the next pair |
//! | Continuation | Direct | state machine, predicate resumes with its verdict |
//! | Continuation | Continuation | state machine, no synchronous return at all |
//!
//! The asynchronous paths run through [`LoopRun`], a small state machine
//! (`Init`, `AwaitPredicate`, `AwaitBody`, `Done`) behind a trampoline. A
//! continuation resumed while the driver is still on the stack only queues
//! the next phase, so steps that resume synchronously never deepen the stack.

use ligature_core::schematic::{EdgeType, NodeKind, Schematic};
use ligature_core::{
    Args, Continuation, LoopState, Mode, Step, StepError, StepResult, StepSpec, Value, is_truthy,
};
use parking_lot::Mutex;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct Loop {
    predicate: StepSpec,
    body: StepSpec,
}

impl Default for Loop {
    /// A loop whose predicate never continues and whose body does nothing.
    fn default() -> Self {
        Self::from_parts(None, None)
    }
}

impl Loop {
    pub fn new(predicate: StepSpec, body: StepSpec) -> Self {
        Self { predicate, body }
    }

    /// Missing parts fall back to "never continue" and a no-op body.
    pub fn from_parts(predicate: Option<StepSpec>, body: Option<StepSpec>) -> Self {
        Self {
            predicate: predicate.unwrap_or_else(never),
            body: body.unwrap_or_else(noop),
        }
    }

    pub fn set_predicate(&mut self, predicate: StepSpec) -> &mut Self {
        self.predicate = predicate;
        self
    }

    pub fn set_functor(&mut self, body: StepSpec) -> &mut Self {
        self.body = body;
        self
    }

    pub fn predicate(&self) -> &StepSpec {
        &self.predicate
    }

    pub fn body(&self) -> &StepSpec {
        &self.body
    }

    /// Direct when both steps are Direct.
    pub fn mode(&self) -> Mode {
        if self.predicate.is_direct() && self.body.is_direct() {
            Mode::Direct
        } else {
            Mode::Continuation
        }
    }

    fn seed(&self, args: Args) -> LoopState {
        LoopState::seed(self.predicate.preset(), self.body.preset(), args)
    }

    /// Run a Direct/Direct loop to completion and return the last pair.
    pub fn invoke(&self, args: Args) -> StepResult<LoopState> {
        let (Step::Direct(predicate), Step::Direct(body)) =
            (self.predicate.step(), self.body.step())
        else {
            return Err(StepError::MisusedContinuation(format!(
                "loop `{}`/`{}` has continuation-based steps; use invoke_with",
                self.predicate.label(),
                self.body.label()
            )));
        };

        let mut state = self.seed(args);
        let mut iterations: u64 = 0;
        while is_truthy(&predicate(state.to_predicate.clone())?) {
            let produced = body(std::mem::take(&mut state.to_body))?;
            state = LoopState::from_value(produced)?;
            iterations += 1;
        }
        tracing::debug!(iterations, "loop finished");
        Ok(state)
    }

    /// Run the loop in any mode; the final pair is resumed into `completion`
    /// as a single `LoopState` value.
    pub fn invoke_with(&self, args: Args, completion: Continuation) -> StepResult<()> {
        match self.mode() {
            Mode::Direct => {
                let state = self.invoke(args)?;
                completion.resume(vec![state.into_value()])
            }
            Mode::Continuation => {
                let run = Arc::new(LoopRun {
                    predicate: self.predicate.step().clone(),
                    body: self.body.step().clone(),
                    completion,
                    driver: Mutex::new(Driver::default()),
                });
                run.schedule(Phase::Init(self.seed(args)))
            }
        }
    }

    /// Expose the loop as a single step. Direct loops return the final pair
    /// as a `LoopState` value.
    pub fn to_spec(&self, label: &str) -> StepSpec {
        let cycle = self.clone();
        let spec = match self.mode() {
            Mode::Direct => {
                StepSpec::direct(label, move |args| Ok(cycle.invoke(args)?.into_value()))
            }
            Mode::Continuation => {
                StepSpec::continuation(label, move |args, next| cycle.invoke_with(args, next))
            }
        };
        spec.with_schematic(self.schematic(label))
    }

    pub fn schematic(&self, name: &str) -> Schematic {
        let mut schematic = Schematic::new(name);
        let predicate = schematic.add_step(NodeKind::Predicate, &self.predicate);
        let body = schematic.add_step(NodeKind::Body, &self.body);
        schematic.connect(&predicate, &body, EdgeType::Linear);
        schematic.connect(&body, &predicate, EdgeType::Loop);
        schematic
    }
}

fn never() -> StepSpec {
    StepSpec::direct("never", |_| Ok(Value::Bool(false)))
}

fn noop() -> StepSpec {
    StepSpec::direct("noop", |args| {
        Ok(LoopState::new(Vec::new(), args).into_value())
    })
}

#[derive(Debug)]
enum Phase {
    Init(LoopState),
    AwaitPredicate(LoopState),
    AwaitBody(LoopState),
    Done(LoopState),
}

impl Phase {
    fn name(&self) -> &'static str {
        match self {
            Phase::Init(_) => "init",
            Phase::AwaitPredicate(_) => "await_predicate",
            Phase::AwaitBody(_) => "await_body",
            Phase::Done(_) => "done",
        }
    }
}

#[derive(Debug, Default)]
struct Driver {
    driving: bool,
    pending: Option<Phase>,
    iterations: u64,
}

/// One in-flight invocation of a loop with at least one continuation-based
/// step. Owns snapshots of both steps, so reconfiguring the `Loop` does not
/// reach it.
struct LoopRun {
    predicate: Step,
    body: Step,
    completion: Continuation,
    driver: Mutex<Driver>,
}

impl LoopRun {
    /// Queue `phase` and drive the machine unless a driver is already on the
    /// stack.
    fn schedule(self: &Arc<Self>, phase: Phase) -> StepResult<()> {
        {
            let mut driver = self.driver.lock();
            driver.pending = Some(phase);
            if driver.driving {
                return Ok(());
            }
            driver.driving = true;
        }

        loop {
            let phase = {
                let mut driver = self.driver.lock();
                match driver.pending.take() {
                    Some(phase) => phase,
                    None => {
                        driver.driving = false;
                        return Ok(());
                    }
                }
            };
            tracing::trace!(phase = phase.name(), "loop phase");
            if let Err(e) = self.advance(phase) {
                let mut driver = self.driver.lock();
                driver.driving = false;
                driver.pending = None;
                return Err(e);
            }
        }
    }

    fn enqueue(&self, phase: Phase) {
        self.driver.lock().pending = Some(phase);
    }

    fn verdict(&self, verdict: &Value, state: LoopState) -> Phase {
        if is_truthy(verdict) {
            Phase::AwaitBody(state)
        } else {
            Phase::Done(state)
        }
    }

    fn advance(self: &Arc<Self>, phase: Phase) -> StepResult<()> {
        match phase {
            Phase::Init(state) => {
                self.enqueue(Phase::AwaitPredicate(state));
                Ok(())
            }
            Phase::AwaitPredicate(state) => match &self.predicate {
                Step::Direct(predicate) => {
                    let verdict = predicate(state.to_predicate.clone())?;
                    self.enqueue(self.verdict(&verdict, state));
                    Ok(())
                }
                Step::Continuation(predicate) => {
                    let run = Arc::clone(self);
                    let args = state.to_predicate.clone();
                    let next = Continuation::new("loop:predicate", move |values| {
                        let verdict = values.into_iter().next().unwrap_or_default();
                        let phase = run.verdict(&verdict, state);
                        run.schedule(phase)
                    });
                    predicate(args, next)
                }
            },
            Phase::AwaitBody(state) => match &self.body {
                Step::Direct(body) => {
                    let produced = body(state.to_body)?;
                    let next = LoopState::from_value(produced)?;
                    self.driver.lock().iterations += 1;
                    self.enqueue(Phase::AwaitPredicate(next));
                    Ok(())
                }
                Step::Continuation(body) => {
                    let run = Arc::clone(self);
                    let next = Continuation::new("loop:body", move |values| {
                        let produced = values.into_iter().next().unwrap_or_default();
                        let state = LoopState::from_value(produced)?;
                        run.driver.lock().iterations += 1;
                        run.schedule(Phase::AwaitPredicate(state))
                    });
                    body(state.to_body, next)
                }
            },
            Phase::Done(state) => {
                let iterations = self.driver.lock().iterations;
                tracing::debug!(iterations, "loop finished");
                self.completion.resume(vec![state.into_value()])
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ligature_core::capture;
    use serde_json::json;

    fn first_i64(args: &[Value]) -> i64 {
        args.first().and_then(Value::as_i64).unwrap_or_default()
    }

    fn below(limit: i64) -> StepSpec {
        StepSpec::direct("below", move |args| Ok(json!(first_i64(&args) < limit)))
    }

    fn increment() -> StepSpec {
        StepSpec::direct("increment", |args| {
            let n = first_i64(&args) + 1;
            Ok(LoopState::new(vec![json!(n)], vec![json!(n)]).into_value())
        })
    }

    #[test]
    fn direct_loop_counts_to_three() {
        let counted = Arc::new(Mutex::new(0));
        let hits = counted.clone();
        let body = StepSpec::direct("increment", move |args| {
            *hits.lock() += 1;
            let n = first_i64(&args) + 1;
            Ok(LoopState::new(vec![json!(n)], vec![json!(n)]).into_value())
        });
        let cycle = Loop::new(below(3).with_preset(vec![json!(0)]), body);

        let state = cycle.invoke(vec![json!(0)]).unwrap();

        assert_eq!(*counted.lock(), 3);
        assert_eq!(state, LoopState::new(vec![json!(3)], vec![json!(3)]));
        assert_eq!(
            state.into_value(),
            json!({"toPredicate": [3], "toBody": [3]})
        );
    }

    #[test]
    fn false_predicate_returns_seed() {
        let cycle = Loop::new(below(0), increment().with_preset(vec![json!("p")]));
        let state = cycle.invoke(vec![json!("c")]).unwrap();
        assert_eq!(state, LoopState::new(vec![], vec![json!("p"), json!("c")]));
    }

    #[test]
    fn default_loop_never_runs_body() {
        let state = Loop::default().invoke(vec![json!(1)]).unwrap();
        assert_eq!(state.to_body, vec![json!(1)]);
    }

    #[test]
    fn direct_loop_does_not_grow_the_stack() {
        let cycle = Loop::new(below(100_000).with_preset(vec![json!(0)]), increment());
        let state = cycle.invoke(vec![json!(0)]).unwrap();
        assert_eq!(state.to_predicate, vec![json!(100_000)]);
    }

    #[test]
    fn malformed_body_output() {
        let body = StepSpec::direct("bad", |_| Ok(json!(1)));
        let cycle = Loop::new(below(1).with_preset(vec![json!(0)]), body);
        let err = cycle.invoke(vec![]).unwrap_err();
        assert!(matches!(err, StepError::MalformedLoopState(_)));
    }

    #[test]
    fn continuation_body_with_direct_predicate() {
        let body = StepSpec::continuation("increment-later", |args, next| {
            let n = first_i64(&args) + 1;
            let state = LoopState::new(vec![json!(n)], vec![json!(n)]);
            next.resume_one(state.into_value())
        });
        let cycle = Loop::new(below(3).with_preset(vec![json!(0)]), body);
        assert_eq!(cycle.mode(), Mode::Continuation);
        assert!(cycle.invoke(vec![json!(0)]).unwrap_err().is_misuse());

        let (k, captured) = capture("done");
        cycle.invoke_with(vec![json!(0)], k).unwrap();
        assert_eq!(
            captured.take(),
            Some(vec![json!({"toPredicate": [3], "toBody": [3]})])
        );
    }

    #[test]
    fn continuation_predicate_with_direct_body() {
        let predicate = StepSpec::continuation("below-3", |args, next| {
            next.resume_one(json!(first_i64(&args) < 3))
        });
        let cycle = Loop::new(predicate.with_preset(vec![json!(0)]), increment());

        let (k, captured) = capture("done");
        cycle.invoke_with(vec![json!(0)], k).unwrap();
        assert_eq!(
            captured.take(),
            Some(vec![json!({"toPredicate": [3], "toBody": [3]})])
        );
    }

    #[test]
    fn synchronous_continuations_stay_shallow() {
        let predicate = StepSpec::continuation("below", |args, next| {
            next.resume_one(json!(first_i64(&args) < 50_000))
        });
        let body = StepSpec::continuation("increment", |args, next| {
            let n = first_i64(&args) + 1;
            let state = LoopState::new(vec![json!(n)], vec![json!(n)]);
            next.resume_one(state.into_value())
        });
        let cycle = Loop::new(predicate.with_preset(vec![json!(0)]), body);

        let (k, captured) = capture("done");
        cycle.invoke_with(vec![json!(0)], k).unwrap();
        let values = captured.take().unwrap();
        assert_eq!(values[0]["toBody"], json!([50_000]));
    }

    #[test]
    fn setters_replace_configuration() {
        let mut cycle = Loop::default();
        cycle
            .set_predicate(below(2).with_preset(vec![json!(0)]))
            .set_functor(increment());
        let state = cycle.invoke(vec![json!(0)]).unwrap();
        assert_eq!(state.to_body, vec![json!(2)]);
    }

    #[test]
    fn body_error_reaches_invoker() {
        let body = StepSpec::continuation("explode", |_, _| Err(StepError::custom("boom")));
        let cycle = Loop::new(below(1).with_preset(vec![json!(0)]), body);
        let err = cycle
            .invoke_with(vec![], Continuation::discard())
            .unwrap_err();
        assert_eq!(err.to_string(), "boom");
    }

    #[test]
    fn in_flight_run_keeps_its_predicate() {
        let parked: Arc<Mutex<Vec<Continuation>>> = Arc::default();
        let waiting = parked.clone();
        let body = StepSpec::continuation("parked", move |_, next| {
            waiting.lock().push(next);
            Ok(())
        });
        let mut looped = Loop::new(below(2).with_preset(vec![json!(0)]), body);

        let (k, captured) = capture("done");
        looped.invoke_with(vec![], k).unwrap();
        assert_eq!(parked.lock().len(), 1);

        let stop = StepSpec::direct("stop", |_| Ok(json!(false)));
        looped.set_predicate(stop);

        // Still below 2 for the original predicate, so the body runs again.
        let next = parked.lock().remove(0);
        let state = LoopState::new(vec![json!(1)], vec![json!(1)]);
        next.resume_one(state.into_value()).unwrap();
        assert!(!captured.is_set());
        assert_eq!(parked.lock().len(), 1);

        let next = parked.lock().remove(0);
        let state = LoopState::new(vec![json!(5)], vec![json!(5)]);
        next.resume_one(state.into_value()).unwrap();
        assert_eq!(
            captured.take(),
            Some(vec![json!({"toPredicate": [5], "toBody": [5]})])
        );
    }
}
