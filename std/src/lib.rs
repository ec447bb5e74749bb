//! # Ligature Std
//!
//! Ready-made steps. Each node is a small serializable config struct whose
//! `spec()` builds the [`StepSpec`]; the free functions below are shorthands
//! for the common case.
//!
//! Everything here is Direct. Timers and I/O are left to the caller: a
//! continuation-based step can hand its continuation to whatever runtime the
//! application already uses.

pub mod nodes;
pub mod prelude;

use ligature_core::{StepSpec, Value};
use nodes::flow::{ConstantNode, IdentityNode};
use nodes::logic::{LessThanNode, NotNode, PredicateNode, SwitchNode};
use nodes::math::CounterNode;

pub fn identity() -> StepSpec {
    IdentityNode::new().spec()
}

pub fn constant(value: impl Into<Value>) -> StepSpec {
    ConstantNode::new(value).spec()
}

pub fn less_than(limit: impl Into<f64>) -> StepSpec {
    LessThanNode::new(limit).spec()
}

pub fn not() -> StepSpec {
    NotNode::new().spec()
}

pub fn predicate<F>(label: impl Into<String>, f: F) -> StepSpec
where
    F: Fn(&[Value]) -> bool + Send + Sync + 'static,
{
    PredicateNode::new(label, f).spec()
}

/// Dispatcher root keyed by `field` of the first argument.
pub fn switch_on(field: impl Into<String>) -> StepSpec {
    SwitchNode::on(field).spec()
}

/// Loop body counting up by `step`.
pub fn counter(step: i64) -> StepSpec {
    CounterNode::new(step).spec()
}
