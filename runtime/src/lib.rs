//! # Ligature Runtime
//!
//! The four combinators that compose [`StepSpec`](ligature_core::StepSpec)s:
//!
//! | Combinator | Shape | Mode |
//! |------------|-------|------|
//! | [`Chain`] | `a -> b -> c` | Direct when every node is Direct |
//! | [`Dispatcher`] | root picks one option | Direct when root and options are Direct |
//! | [`Loop`] | `while predicate { body }` | Direct when both steps are Direct |
//! | [`Join`] | run all, gather all | always continuation-based |
//!
//! Every combinator can be turned back into a step with `to_spec`, so they
//! nest freely.

pub mod chain;
pub mod cycle;
pub mod dispatch;
pub mod join;

pub use chain::Chain;
pub use cycle::Loop;
pub use dispatch::{Dispatcher, OptionTable};
pub use join::Join;

pub mod prelude {
    pub use crate::chain::Chain;
    pub use crate::cycle::Loop;
    pub use crate::dispatch::Dispatcher;
    pub use crate::join::Join;
}
