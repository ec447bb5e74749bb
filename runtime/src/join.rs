//! # Join: Fan-Out / Fan-In
//!
//! Starts every member step without waiting for the previous one to finish,
//! then resumes a single completion once all of them have reported back.
//! Results are placed by registration order, not completion order.

use ligature_core::schematic::{NodeKind, Schematic};
use ligature_core::{Args, Continuation, StepError, StepResult, StepSpec, Value};
use parking_lot::Mutex;
use std::sync::Arc;

/// A fixed set of continuation-based steps.
#[derive(Debug, Clone)]
pub struct Join {
    steps: Arc<[StepSpec]>,
}

impl Join {
    /// Every member must be continuation-based.
    pub fn new<I>(steps: I) -> StepResult<Self>
    where
        I: IntoIterator<Item = StepSpec>,
    {
        let steps: Arc<[StepSpec]> = steps.into_iter().collect();
        if let Some(direct) = steps.iter().find(|spec| spec.is_direct()) {
            return Err(StepError::MisusedContinuation(format!(
                "join member `{}` is direct",
                direct.label()
            )));
        }
        Ok(Self { steps })
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn steps(&self) -> &[StepSpec] {
        &self.steps
    }

    pub fn invoke(&self, completion: Continuation) -> StepResult<()> {
        self.invoke_with(Vec::new(), completion)
    }

    /// Start every member with `preset ++ args`.
    ///
    /// `completion` receives one value per member, in registration order;
    /// each is the array of values that member resumed with. A member that
    /// never resumes stalls the join.
    pub fn invoke_with(&self, args: Args, completion: Continuation) -> StepResult<()> {
        if self.steps.is_empty() {
            tracing::debug!("empty join completes immediately");
            return completion.resume(Vec::new());
        }

        let gather = Arc::new(Gather {
            state: Mutex::new(Slots {
                values: vec![None; self.steps.len()],
                remaining: self.steps.len(),
            }),
            completion,
        });

        for (index, spec) in self.steps.iter().enumerate() {
            let gather = Arc::clone(&gather);
            let label = format!("join:{}", spec.label());
            let collector = Continuation::new(label, move |values| gather.fill(index, values));
            spec.call_with(args.clone(), collector)?;
        }
        Ok(())
    }

    pub fn to_spec(&self, label: &str) -> StepSpec {
        let join = self.clone();
        StepSpec::continuation(label, move |args, next| join.invoke_with(args, next))
            .with_schematic(self.schematic(label))
    }

    pub fn schematic(&self, name: &str) -> Schematic {
        let mut schematic = Schematic::new(name);
        for spec in self.steps.iter() {
            schematic.add_step(NodeKind::Branch, spec);
        }
        schematic
    }
}

/// Per-invocation accumulator. Never shared between invocations.
struct Gather {
    state: Mutex<Slots>,
    completion: Continuation,
}

struct Slots {
    values: Vec<Option<Value>>,
    remaining: usize,
}

impl Gather {
    fn fill(&self, index: usize, values: Args) -> StepResult<()> {
        let finished = {
            let mut slots = self.state.lock();
            slots.values[index] = Some(Value::Array(values));
            slots.remaining -= 1;
            tracing::debug!(
                member = index,
                remaining = slots.remaining,
                "join member completed"
            );
            if slots.remaining == 0 {
                Some(std::mem::take(&mut slots.values))
            } else {
                None
            }
        };

        match finished {
            Some(values) => {
                let values = values.into_iter().map(Option::unwrap_or_default);
                self.completion.resume(values.collect())
            }
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ligature_core::capture;
    use serde_json::json;

    /// Holds its continuation until the test releases it.
    fn parked(
        label: &'static str,
        waiting: Arc<Mutex<Vec<(usize, Continuation)>>>,
        slot: usize,
    ) -> StepSpec {
        StepSpec::continuation(label, move |_, next| {
            waiting.lock().push((slot, next));
            Ok(())
        })
    }

    #[test]
    fn results_follow_registration_order() {
        let waiting = Arc::new(Mutex::new(Vec::new()));
        let join = Join::new([
            parked("a", waiting.clone(), 0),
            parked("b", waiting.clone(), 1),
            parked("c", waiting.clone(), 2),
        ])
        .unwrap();

        let (k, captured) = capture("all");
        join.invoke(k).unwrap();
        assert!(!captured.is_set());

        let mut pending = std::mem::take(&mut *waiting.lock());
        pending.reverse();
        for (slot, next) in pending {
            next.resume_one(json!(format!("v{slot}"))).unwrap();
        }

        assert_eq!(
            captured.take(),
            Some(vec![json!(["v0"]), json!(["v1"]), json!(["v2"])])
        );
    }

    #[test]
    fn empty_join_completes_at_once() {
        let join = Join::new(Vec::new()).unwrap();
        let (k, captured) = capture("none");
        join.invoke(k).unwrap();
        assert_eq!(captured.take(), Some(vec![]));
    }

    #[test]
    fn direct_member_is_rejected() {
        let direct = StepSpec::direct("direct", |_| Ok(Value::Null));
        let err = Join::new([direct]).unwrap_err();
        assert!(err.is_misuse());
    }

    #[test]
    fn double_resume_is_detected() {
        let twice = StepSpec::continuation("twice", |_, next| {
            next.resume_one(json!(1))?;
            next.resume_one(json!(2))
        });
        let join = Join::new([twice]).unwrap();

        let (k, captured) = capture("once");
        let err = join.invoke(k).unwrap_err();
        assert!(err.is_misuse());
        assert_eq!(captured.take(), Some(vec![json!([1])]));
    }

    #[test]
    fn each_invocation_gets_fresh_slots() {
        let join = Join::new([
            StepSpec::continuation("one", |_, next| next.resume_one(json!(1))),
            StepSpec::continuation("args", |args, next| next.resume(args)),
        ])
        .unwrap();

        for round in 0..2 {
            let (k, captured) = capture("round");
            join.invoke_with(vec![json!(round)], k).unwrap();
            assert_eq!(captured.take(), Some(vec![json!([1]), json!([round])]));
        }
    }
}
