//! # Dispatcher: Branch on a Root Step's Result
//!
//! A `Dispatcher` runs one root step and uses its result to pick exactly one
//! follow-up step from an owned option table.
//!
//! * **Direct root**: returns a [`Route`] (`{"key": .., "args": [..]}`); the
//!   option registered under `key` runs with `args`.
//! * **Continuation root**: receives a router continuation holding a snapshot
//!   of the table and selects by resuming it with `[key, args...]`.
//!
//! With an empty table the dispatcher is just its root step.

use ahash::AHashMap;
use ligature_core::schematic::{EdgeType, NodeKind, Schematic};
use ligature_core::{
    Args, BranchKey, Continuation, Mode, Route, Step, StepError, StepResult, StepSpec, Value,
};
use std::sync::Arc;

pub type OptionTable = AHashMap<BranchKey, StepSpec>;

#[derive(Debug, Clone)]
pub struct Dispatcher {
    root: StepSpec,
    options: OptionTable,
}

impl Dispatcher {
    pub fn new(root: StepSpec) -> Self {
        Self {
            root,
            options: OptionTable::default(),
        }
    }

    /// Replace the whole option table.
    pub fn set_options<K, I>(&mut self, table: I) -> &mut Self
    where
        K: Into<BranchKey>,
        I: IntoIterator<Item = (K, StepSpec)>,
    {
        self.options = table
            .into_iter()
            .map(|(k, spec)| (k.into(), spec))
            .collect();
        self
    }

    pub fn drop_options(&mut self) -> &mut Self {
        self.options.clear();
        self
    }

    /// Register `spec` under `key`, replacing any previous option.
    pub fn add_option(&mut self, key: impl Into<BranchKey>, spec: StepSpec) -> &mut Self {
        self.options.insert(key.into(), spec);
        self
    }

    /// Returns whether an option was removed.
    pub fn remove_option(&mut self, key: impl Into<BranchKey>) -> bool {
        self.options.remove(&key.into()).is_some()
    }

    pub fn get_option(&self, key: impl Into<BranchKey>) -> Option<&StepSpec> {
        self.options.get(&key.into())
    }

    pub fn root(&self) -> &StepSpec {
        &self.root
    }

    pub fn len(&self) -> usize {
        self.options.len()
    }

    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }

    /// Direct when the root and every option are Direct.
    pub fn mode(&self) -> Mode {
        if self.options.is_empty() {
            return self.root.mode();
        }
        if self.root.is_direct() && self.options.values().all(StepSpec::is_direct) {
            Mode::Direct
        } else {
            Mode::Continuation
        }
    }

    /// Dispatch and return the selected option's value.
    pub fn invoke(&self, args: Args) -> StepResult<Value> {
        if self.options.is_empty() {
            return self.root.call(args);
        }
        match self.root.step() {
            Step::Direct(_) => {
                let route = self.route(args)?;
                let option = lookup(&self.options, &route.branch_key())?;
                option.call(route.args)
            }
            Step::Continuation(_) => Err(StepError::MisusedContinuation(format!(
                "dispatcher root `{}` is continuation-based; use invoke_with",
                self.root.label()
            ))),
        }
    }

    /// Dispatch in any mode, delivering the selected option's results into
    /// `completion`.
    pub fn invoke_with(&self, args: Args, completion: Continuation) -> StepResult<()> {
        if self.options.is_empty() {
            return self.root.call_into(args, completion);
        }
        match self.root.step() {
            Step::Direct(_) => {
                let route = self.route(args)?;
                let option = lookup(&self.options, &route.branch_key())?;
                option.call_into(route.args, completion)
            }
            Step::Continuation(_) => {
                let table = Arc::new(self.options.clone());
                let label = format!("router:{}", self.root.label());
                let router = Continuation::new(label, move |values| {
                    let mut values = values.into_iter();
                    let key = values.next().ok_or_else(|| {
                        StepError::MalformedRoute("router resumed without a key".to_string())
                    })?;
                    let option = lookup(&table, &BranchKey::new(&key))?;
                    option.call_into(values.collect(), completion)
                });
                self.root.call_with(args, router)
            }
        }
    }

    /// Expose the dispatcher as a single step, snapshotting the current table.
    pub fn to_spec(&self, label: &str) -> StepSpec {
        let dispatcher = self.clone();
        let spec = match self.mode() {
            Mode::Direct => StepSpec::direct(label, move |args| dispatcher.invoke(args)),
            Mode::Continuation => {
                StepSpec::continuation(label, move |args, next| dispatcher.invoke_with(args, next))
            }
        };
        spec.with_schematic(self.schematic(label))
    }

    pub fn schematic(&self, name: &str) -> Schematic {
        let mut schematic = Schematic::new(name);
        let root = schematic.add_step(NodeKind::Root, &self.root);
        let mut options: Vec<_> = self.options.iter().collect();
        options.sort_by(|a, b| a.0.cmp(b.0));
        for (key, spec) in options {
            let id = schematic.add_step(NodeKind::Option, spec);
            let edge = EdgeType::Branch(key.to_string());
            schematic.connect(&root, &id, edge);
        }
        schematic
    }

    fn route(&self, args: Args) -> StepResult<Route> {
        let value = self.root.call(args)?;
        Route::from_value(value)
    }
}

fn lookup<'a>(table: &'a OptionTable, key: &BranchKey) -> StepResult<&'a StepSpec> {
    match table.get(key) {
        Some(spec) => {
            tracing::debug!(branch = %key, option = %spec.label(), "branch selected");
            Ok(spec)
        }
        None => {
            tracing::warn!(branch = %key, "no option registered for branch");
            Err(StepError::UnknownBranch {
                key: key.to_string(),
            })
        }
    }
}
