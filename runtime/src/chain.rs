//! # Chain: Sequential Composition
//!
//! A `Chain` links steps so that each one's output becomes the next one's
//! input. Exactly one value flows forward from a Direct node. A
//! continuation-based node decides when the rest of the chain runs by
//! resuming its continuation; the values it resumes with become the next
//! node's call arguments.

use ligature_core::schematic::{EdgeType, NodeKind, Schematic};
use ligature_core::{Args, Continuation, Mode, Step, StepError, StepResult, StepSpec, Value};
use std::fmt;
use std::sync::Arc;

struct ChainNode {
    spec: StepSpec,
    next: Option<Box<ChainNode>>,
}

/// A singly linked sequence of steps.
///
/// `Clone`, `Debug` and `Drop` all walk the nodes iteratively, so chain
/// length is bounded by memory, not by stack depth.
pub struct Chain {
    root: Box<ChainNode>,
    len: usize,
}

impl Chain {
    pub fn new(root: StepSpec) -> Self {
        Self {
            root: Box::new(ChainNode {
                spec: root,
                next: None,
            }),
            len: 1,
        }
    }

    /// Build a chain from a sequence whose first element is the root.
    pub fn from_specs<I>(specs: I) -> StepResult<Self>
    where
        I: IntoIterator<Item = StepSpec>,
    {
        let mut specs: Vec<StepSpec> = specs.into_iter().collect();
        if specs.is_empty() {
            return Err(StepError::InvalidChain);
        }
        let len = specs.len();

        // Link back to front so building stays linear in the number of steps.
        let mut next: Option<Box<ChainNode>> = None;
        while let Some(spec) = specs.pop() {
            next = Some(Box::new(ChainNode { spec, next }));
        }
        let root = next.ok_or(StepError::InvalidChain)?;
        Ok(Self { root, len })
    }

    /// Link `spec` after the current tail, in place. Walks to the tail, so
    /// prefer [`Chain::from_specs`] when the steps are known up front.
    pub fn append(&mut self, spec: StepSpec) -> &mut Self {
        let mut slot = &mut self.root.next;
        while let Some(node) = slot {
            slot = &mut node.next;
        }
        *slot = Some(Box::new(ChainNode { spec, next: None }));
        self.len += 1;
        self
    }

    /// Copy every node into a new chain and append `spec` there.
    /// `self` is left untouched.
    pub fn append_copy(&self, spec: StepSpec) -> Chain {
        let mut copy = self.clone();
        copy.append(spec);
        copy
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn steps(&self) -> impl Iterator<Item = &StepSpec> {
        std::iter::successors(Some(&*self.root), |node| node.next.as_deref())
            .map(|node| &node.spec)
    }

    /// Direct when every node is Direct.
    pub fn mode(&self) -> Mode {
        if self.steps().all(StepSpec::is_direct) {
            Mode::Direct
        } else {
            Mode::Continuation
        }
    }

    /// Run a fully Direct chain and return the last step's value.
    pub fn invoke(&self, args: Args) -> StepResult<Value> {
        if self.mode() != Mode::Direct {
            let label = self.root.spec.label();
            tracing::warn!(chain = %label, "direct invoke of a continuation chain");
            return Err(StepError::MisusedContinuation(format!(
                "chain `{label}` contains continuation-based steps; use invoke_with"
            )));
        }

        let mut node = &*self.root;
        let mut value = node.spec.call(args)?;
        while let Some(next) = node.next.as_deref() {
            tracing::debug!(from = %node.spec.label(), to = %next.spec.label(), "chain advance");
            value = next.spec.call(vec![value])?;
            node = next;
        }
        Ok(value)
    }

    /// Run the chain in any mode, delivering the final values into
    /// `completion`.
    pub fn invoke_with(&self, args: Args, completion: Continuation) -> StepResult<()> {
        let specs: Arc<[StepSpec]> = self.steps().cloned().collect();
        run_from(specs, 0, args, completion)
    }

    /// Expose the chain as a single step. Later appends do not affect it.
    pub fn to_spec(&self, label: &str) -> StepSpec {
        let chain = self.clone();
        let spec = match self.mode() {
            Mode::Direct => StepSpec::direct(label, move |args| chain.invoke(args)),
            Mode::Continuation => {
                StepSpec::continuation(label, move |args, next| chain.invoke_with(args, next))
            }
        };
        spec.with_schematic(self.schematic(label))
    }

    pub fn schematic(&self, name: &str) -> Schematic {
        let mut schematic = Schematic::new(name);
        let mut previous: Option<String> = None;
        for spec in self.steps() {
            let id = schematic.add_step(NodeKind::Link, spec);
            if let Some(from) = previous {
                schematic.connect(&from, &id, EdgeType::Linear);
            }
            previous = Some(id);
        }
        schematic
    }
}

impl Clone for Chain {
    fn clone(&self) -> Self {
        let mut next: Option<Box<ChainNode>> = None;
        let specs: Vec<&StepSpec> = self.steps().collect();
        for spec in specs.into_iter().rev() {
            next = Some(Box::new(ChainNode {
                spec: spec.clone(),
                next,
            }));
        }
        match next {
            Some(root) => Self {
                root,
                len: self.len,
            },
            None => Self::new(self.root.spec.clone()),
        }
    }
}

impl fmt::Debug for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let steps: Vec<&str> = self.steps().map(StepSpec::label).collect();
        f.debug_struct("Chain")
            .field("len", &self.len)
            .field("steps", &steps)
            .finish()
    }
}

impl Drop for Chain {
    fn drop(&mut self) {
        // Unlink iteratively so long chains do not recurse on drop.
        let mut next = self.root.next.take();
        while let Some(mut node) = next {
            next = node.next.take();
        }
    }
}

fn run_from(
    specs: Arc<[StepSpec]>,
    start: usize,
    mut args: Args,
    completion: Continuation,
) -> StepResult<()> {
    let mut index = start;
    loop {
        let spec = &specs[index];
        if index + 1 == specs.len() {
            return spec.call_into(args, completion);
        }
        match spec.step() {
            Step::Direct(_) => {
                let value = spec.call(args)?;
                args = vec![value];
                index += 1;
            }
            Step::Continuation(_) => {
                let rest = Arc::clone(&specs);
                let label = format!("chain:{}", specs[index + 1].label());
                let next = Continuation::new(label, move |values| {
                    run_from(rest, index + 1, values, completion)
                });
                return spec.call_with(args, next);
            }
        }
    }
}
