//! Composite tree node: a leaf step or a parallel group.

use crate::context::RunContext;
use crate::error::Result;
use crate::status::Reporter;

use super::parallel::ParallelGroup;
use super::step::{Label, Sequence, SequenceKey, StepEntry};

/// One child of a sequential group.
#[derive(Debug)]
pub enum TaskNode {
    Step(StepEntry),
    Parallel(ParallelGroup),
}

/// Whether a computed weight allows the node to run.
pub(crate) fn runnable(weight: Option<f64>) -> bool {
    weight.is_some_and(|w| w >= 0.0)
}

impl TaskNode {
    /// The key this node sorts on within its sequential group.
    pub fn step_key(&self) -> SequenceKey {
        match self {
            TaskNode::Step(entry) => entry.step_key(),
            TaskNode::Parallel(group) => group.main_key(),
        }
    }

    /// The description shown in progress messages for this node.
    pub fn description(&self) -> &str {
        match self {
            TaskNode::Step(entry) => entry.description(),
            TaskNode::Parallel(group) => group.header(),
        }
    }

    /// Recompute and cache this node's weight for the current run.
    pub fn compute_weight(&mut self, ctx: &RunContext) -> Option<f64> {
        match self {
            TaskNode::Step(entry) => entry.compute_weight(ctx),
            TaskNode::Parallel(group) => group.compute_weight(ctx),
        }
    }

    /// The weight cached by the last weight pass.
    pub fn cached_weight(&self) -> Option<f64> {
        match self {
            TaskNode::Step(entry) => entry.cached_weight(),
            TaskNode::Parallel(group) => group.cached_weight(),
        }
    }

    /// Execute this node. The owning group has already reported progress
    /// and checked the cached weight.
    pub fn run(&mut self, ctx: &RunContext, reporter: &Reporter) -> Result<()> {
        match self {
            TaskNode::Step(entry) => entry.run(ctx),
            TaskNode::Parallel(group) => group.run(ctx, reporter),
        }
    }

    /// Emit plan-preview trace lines for this node.
    pub fn describe(&mut self, indent: usize, ctx: &RunContext) {
        match self {
            TaskNode::Step(entry) => entry.describe(indent, ctx),
            TaskNode::Parallel(group) => group.describe(indent, ctx),
        }
    }

    /// Gather label pairs, first seen wins.
    pub fn collect_labels(&self, labels: &mut Vec<Label>) {
        match self {
            TaskNode::Step(entry) => {
                if let Some(label) = entry.label() {
                    if !labels.contains(label) {
                        labels.push(label.clone());
                    }
                }
            }
            TaskNode::Parallel(group) => group.collect_labels(labels),
        }
    }

    /// Stably reorder descendants by step key.
    pub fn sort(&mut self) {
        if let TaskNode::Parallel(group) = self {
            group.sort();
        }
    }

    /// Recursive lookup by sequence identifier.
    pub fn find(&self, sequence: &Sequence) -> Option<&StepEntry> {
        match self {
            TaskNode::Step(entry) => (entry.sequence() == sequence).then_some(entry),
            TaskNode::Parallel(group) => group.find(sequence),
        }
    }
}
