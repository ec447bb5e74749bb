//! # Continuation: Single-Fire Completion Handles
//!
//! A continuation-based step receives a [`Continuation`] and must resume it
//! exactly once. The handle is cheap to clone and `Send + Sync`, so a step may
//! stash it and resume later from another task or thread.
//!
//! The handle guards itself: the first `resume` consumes the downstream
//! logic, every later `resume` fails with
//! [`StepError::MisusedContinuation`] instead of running it again.

use crate::error::{StepError, StepResult};
use crate::step::Args;
use parking_lot::Mutex;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

type Resume = Box<dyn FnOnce(Args) -> StepResult<()> + Send>;

#[derive(Clone)]
pub struct Continuation {
    label: Arc<str>,
    slot: Arc<Mutex<Option<Resume>>>,
}

impl Continuation {
    /// Wrap downstream logic into a guarded continuation.
    pub fn new<F>(label: impl Into<String>, resume: F) -> Self
    where
        F: FnOnce(Args) -> StepResult<()> + Send + 'static,
    {
        let label: String = label.into();
        Self {
            label: Arc::from(label),
            slot: Arc::new(Mutex::new(Some(Box::new(resume)))),
        }
    }

    /// A continuation that accepts its values and drops them.
    pub fn discard() -> Self {
        Self::new("discard", |_| Ok(()))
    }

    /// Hand the step's results to the downstream logic.
    ///
    /// Errors raised downstream are returned to the caller of `resume`,
    /// which is whoever is on the stack when the step completes.
    pub fn resume(&self, args: Args) -> StepResult<()> {
        let pending = self.slot.lock().take();
        match pending {
            Some(resume) => resume(args),
            None => {
                tracing::warn!(continuation = %self.label, "continuation resumed more than once");
                Err(StepError::MisusedContinuation(format!(
                    "continuation `{}` resumed more than once",
                    self.label
                )))
            }
        }
    }

    pub fn resume_one(&self, value: Value) -> StepResult<()> {
        self.resume(vec![value])
    }

    /// True once the continuation has been resumed.
    pub fn is_spent(&self) -> bool {
        self.slot.lock().is_none()
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

impl fmt::Debug for Continuation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Continuation")
            .field("label", &self.label)
            .field("spent", &self.is_spent())
            .finish()
    }
}

/// Values captured by a continuation built with [`capture`].
#[derive(Clone, Default, Debug)]
pub struct Captured {
    inner: Arc<Mutex<Option<Args>>>,
}

impl Captured {
    pub fn take(&self) -> Option<Args> {
        self.inner.lock().take()
    }

    pub fn is_set(&self) -> bool {
        self.inner.lock().is_some()
    }
}

/// Build a continuation that stores whatever it is resumed with.
///
/// Handy at the outer edge of a composition, where the final values are read
/// back after the continuation chain has run.
pub fn capture(label: impl Into<String>) -> (Continuation, Captured) {
    let captured = Captured::default();
    let sink = captured.clone();
    let continuation = Continuation::new(label, move |args| {
        *sink.inner.lock() = Some(args);
        Ok(())
    });
    (continuation, captured)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn resumes_once() {
        let (k, captured) = capture("sink");
        assert!(!k.is_spent());
        k.resume(vec![json!(1), json!(2)]).unwrap();
        assert!(k.is_spent());
        assert_eq!(captured.take(), Some(vec![json!(1), json!(2)]));
    }

    #[test]
    fn second_resume_is_misuse_and_does_not_rerun() {
        let hits = Arc::new(Mutex::new(0));
        let counter = hits.clone();
        let k = Continuation::new("counted", move |_| {
            *counter.lock() += 1;
            Ok(())
        });

        k.resume(vec![]).unwrap();
        let clone = k.clone();
        let err = clone.resume(vec![]).unwrap_err();

        assert!(err.is_misuse());
        assert_eq!(*hits.lock(), 1);
    }

    #[test]
    fn downstream_error_reaches_resumer() {
        let k = Continuation::new("failing", |_| Err(StepError::custom("boom")));
        let err = k.resume_one(json!(null)).unwrap_err();
        assert_eq!(err.to_string(), "boom");
    }
}
