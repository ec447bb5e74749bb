//! # Ligature
//!
//! Build programs out of small steps without caring which ones finish at once
//! and which ones call back later.
//!
//! ```ignore
//! use ligature::prelude::*;
//!
//! let looped = Loop::new(steps::less_than(3).with_preset(vec![json!(0)]), steps::counter(1));
//! let state = looped.invoke(vec![json!(0)])?;
//! ```

// Re-export core modules
pub use ligature_core::{
    Args, BranchKey, Continuation, LigatureConfig, LoopState, Mode, Route, Schematic, Step,
    StepError, StepResult, StepSpec, Traced, Value, capture, is_truthy, traced,
};
pub use ligature_core::{config, continuation, error, route, schematic, state, step, telemetry};

pub use ligature_runtime::{Chain, Dispatcher, Join, Loop, OptionTable};

pub use ligature_observe as observe;
pub use ligature_std as steps;

pub mod prelude {
    pub use ligature_core::prelude::*;
    pub use ligature_core::{Traced, traced};
    pub use ligature_runtime::prelude::*;

    pub use crate::steps;
}
