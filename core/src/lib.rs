//! # Ligature Core
//!
//! The shared step convention used by every Ligature combinator:
//!
//! * [`StepSpec`]: a Direct or continuation-based step plus its preset arguments
//! * [`Continuation`]: the single-fire completion handle
//! * [`LoopState`] and [`Route`]: the named records steps exchange with the
//!   loop and dispatcher combinators
//! * [`Schematic`]: the static view of a composition
//!
//! The combinators themselves live in `ligature-runtime`.

pub mod config;
pub mod continuation;
pub mod error;
pub mod route;
pub mod schematic;
pub mod state;
pub mod step;
pub mod telemetry;

pub use config::{ConfigError, LigatureConfig, LogFormat, TelemetryConfig};
pub use continuation::{Captured, Continuation, capture};
pub use error::{StepError, StepResult};
pub use route::{BranchKey, Route};
pub use schematic::{Edge, EdgeType, Node, NodeKind, Schematic};
pub use state::{LoopState, is_truthy};
pub use step::{Args, Mode, Step, StepSpec};
pub use telemetry::{Traced, traced};

pub use serde_json::Value;

pub mod prelude {
    pub use crate::continuation::{Continuation, capture};
    pub use crate::error::{StepError, StepResult};
    pub use crate::route::{BranchKey, Route};
    pub use crate::state::LoopState;
    pub use crate::step::{Args, Mode, StepSpec};
    pub use serde_json::{Value, json};
}
