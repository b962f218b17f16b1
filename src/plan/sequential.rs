//! Sequential execution of an ordered list of tree nodes.

use chrono::Utc;
use tracing::info;

use crate::context::RunContext;
use crate::error::Result;
use crate::status::{Reporter, StatusUpdate};

use super::node::{runnable, TaskNode};
use super::step::{Label, Sequence, SequenceKey, StepEntry};

/// Runs a fixed, ordered list of children one at a time on a single lane,
/// tracking cumulative weight for progress reporting.
#[derive(Debug, Default)]
pub struct SequentialGroup {
    children: Vec<TaskNode>,
}

impl SequentialGroup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a child node.
    pub fn push(&mut self, node: TaskNode) {
        self.children.push(node);
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub(crate) fn children(&self) -> &[TaskNode] {
        &self.children
    }

    /// Index of the direct child occupying the given step key, if any.
    pub(crate) fn position_by_step_key(&self, key: SequenceKey) -> Option<usize> {
        self.children.iter().position(|c| c.step_key() == key)
    }

    pub(crate) fn child_mut(&mut self, index: usize) -> &mut TaskNode {
        &mut self.children[index]
    }

    pub(crate) fn is_parallel_at(&self, index: usize) -> bool {
        matches!(self.children[index], TaskNode::Parallel(_))
    }

    pub(crate) fn remove_child_at(&mut self, index: usize) -> TaskNode {
        self.children.remove(index)
    }

    /// Recompute and cache every child's weight; the group total is the sum
    /// of the non-skipped ones.
    pub fn compute_weight(&mut self, ctx: &RunContext) -> f64 {
        let mut total = 0.0;
        for child in &mut self.children {
            if let Some(weight) = child.compute_weight(ctx).filter(|w| *w >= 0.0) {
                total += weight;
            }
        }
        total
    }

    /// Run every non-skipped child in order.
    ///
    /// Progress and the child's description are reported before each child
    /// executes. The first failure reports `Failed` with the error text and
    /// halts the remaining children; full success reports `Done` with the
    /// completion time.
    pub fn run(&mut self, ctx: &RunContext, reporter: &Reporter) -> Result<()> {
        match self.run_children(ctx, reporter) {
            Ok(()) => {
                reporter.send(StatusUpdate::done());
                Ok(())
            }
            Err(e) => {
                reporter.send(StatusUpdate::failed(e.to_string()));
                Err(e)
            }
        }
    }

    fn run_children(&mut self, ctx: &RunContext, reporter: &Reporter) -> Result<()> {
        let total = self.compute_weight(ctx);
        // A zero total still runs; treat it as 1 for the percentage math.
        let total = if total > 0.0 { total } else { 1.0 };

        let mut progress = 0.0;
        for child in &mut self.children {
            let Some(weight) = child.cached_weight().filter(|w| *w >= 0.0) else {
                continue;
            };

            let percent = (progress * 100.0 / total) as u8;
            reporter.progress(percent, child.description());

            info!(
                "Start step {} '{}' at {}",
                child.step_key(),
                child.description(),
                Utc::now().format("%H:%M:%S")
            );
            child.run(ctx, reporter)?;
            info!(
                "Finished '{}' at {}",
                child.description(),
                Utc::now().format("%H:%M:%S")
            );

            progress += weight;
        }
        Ok(())
    }

    /// Emit a trace line for every non-skipped child, recomputing weights.
    pub fn describe(&mut self, indent: usize, ctx: &RunContext) {
        for child in &mut self.children {
            if runnable(child.compute_weight(ctx)) {
                child.describe(indent, ctx);
            }
        }
    }

    /// Gather descendant label pairs, first seen wins.
    pub fn collect_labels(&self, labels: &mut Vec<Label>) {
        for child in &self.children {
            child.collect_labels(labels);
        }
    }

    /// Stably reorder children ascending by step key, recursing into
    /// nested groups. Sorting an already sorted group is a no-op.
    pub fn sort(&mut self) {
        self.children.sort_by_key(|c| c.step_key());
        for child in &mut self.children {
            child.sort();
        }
    }

    /// Recursive lookup by sequence identifier.
    pub fn find(&self, sequence: &Sequence) -> Option<&StepEntry> {
        self.children.iter().find_map(|c| c.find(sequence))
    }

    /// Recursive removal by sequence identifier; reports whether an entry
    /// was removed.
    pub fn remove(&mut self, sequence: &Sequence) -> bool {
        let direct = self
            .children
            .iter()
            .position(|c| matches!(c, TaskNode::Step(entry) if entry.sequence() == sequence));
        if let Some(index) = direct {
            self.children.remove(index);
            return true;
        }
        self.children.iter_mut().any(|child| match child {
            TaskNode::Parallel(group) => group.remove(sequence),
            TaskNode::Step(_) => false,
        })
    }
}
