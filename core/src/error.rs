use thiserror::Error;

/// Result of invoking a step or a combinator.
pub type StepResult<T = serde_json::Value> = Result<T, StepError>;

/// Failures surfaced by the combinators.
///
/// Errors raised by user step logic travel through [`StepError::Other`]
/// untouched; the runtime never swallows them.
#[derive(Error, Debug)]
pub enum StepError {
    #[error("chain has no root step")]
    InvalidChain,

    #[error("no option registered for branch key {key}")]
    UnknownBranch { key: String },

    #[error("root step did not produce a {{key, args}} route: {0}")]
    MalformedRoute(String),

    #[error("loop body did not produce a {{toPredicate, toBody}} pair: {0}")]
    MalformedLoopState(String),

    #[error("continuation misuse: {0}")]
    MisusedContinuation(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl StepError {
    /// Shorthand for step authors reporting a plain message.
    pub fn custom(msg: impl std::fmt::Display) -> Self {
        StepError::Other(anyhow::anyhow!("{msg}"))
    }

    pub fn is_misuse(&self) -> bool {
        matches!(self, StepError::MisusedContinuation(_))
    }
}
