//! Concurrent execution of named lanes.

use std::thread;

use tracing::{error, info};

use crate::context::RunContext;
use crate::error::{CadenceError, Result};
use crate::status::Reporter;

use super::node::{runnable, TaskNode};
use super::sequential::SequentialGroup;
use super::step::{Label, Sequence, SequenceKey, StepEntry};

/// One independently schedulable execution track within a parallel group.
#[derive(Debug)]
struct TrackLane {
    name: String,
    weight: Option<f64>,
    steps: SequentialGroup,
}

/// Runs named lanes concurrently, one worker per lane, and joins them all
/// before completing.
///
/// The group's weight is the critical-path length: the maximum among lanes
/// with a non-negative weight.
#[derive(Debug)]
pub struct ParallelGroup {
    main_key: SequenceKey,
    header: String,
    weight: Option<f64>,
    lanes: Vec<TrackLane>,
}

impl ParallelGroup {
    pub fn new(main_key: SequenceKey, header: impl Into<String>) -> Self {
        Self {
            main_key,
            header: header.into(),
            weight: None,
            lanes: Vec::new(),
        }
    }

    pub fn main_key(&self) -> SequenceKey {
        self.main_key
    }

    /// The text shown for this group's slot in progress messages.
    pub fn header(&self) -> &str {
        &self.header
    }

    pub fn lane_count(&self) -> usize {
        self.lanes.len()
    }

    /// Route a step into the sequential group for its lane, creating the
    /// lane on first use. Lane order is registration order.
    pub fn add(&mut self, entry: StepEntry) {
        let index = match self.lanes.iter().position(|l| l.name == entry.lane_name()) {
            Some(index) => index,
            None => {
                self.lanes.push(TrackLane {
                    name: entry.lane_name().to_string(),
                    weight: None,
                    steps: SequentialGroup::new(),
                });
                self.lanes.len() - 1
            }
        };
        self.lanes[index].steps.push(TaskNode::Step(entry));
    }

    /// Recompute and cache every lane's weight; the group weight is the
    /// maximum non-negative lane weight, or a skip when no lane qualifies.
    pub fn compute_weight(&mut self, ctx: &RunContext) -> Option<f64> {
        let mut longest = None;
        for lane in &mut self.lanes {
            let weight = lane.steps.compute_weight(ctx);
            lane.weight = Some(weight);
            if weight >= 0.0 && longest.is_none_or(|l| weight > l) {
                longest = Some(weight);
            }
        }
        self.weight = longest;
        self.weight
    }

    pub fn cached_weight(&self) -> Option<f64> {
        self.weight
    }

    /// Start one worker per runnable lane and join them all.
    ///
    /// Lane weights are cached by the owning group's weight pass. Every
    /// lane runs to completion regardless of sibling failures; afterwards
    /// each captured failure is logged and the first one in lane
    /// registration order is returned. A worker that dies without a result
    /// surfaces as [`CadenceError::LanePanic`].
    pub fn run(&mut self, ctx: &RunContext, reporter: &Reporter) -> Result<()> {
        let mut first_error = None;
        thread::scope(|scope| {
            let workers: Vec<_> = self
                .lanes
                .iter_mut()
                .filter(|lane| runnable(lane.weight))
                .map(|lane| {
                    let name = lane.name.clone();
                    let reporter = reporter.clone();
                    info!("Starting lane '{}'", name);
                    let handle = scope.spawn(move || lane.steps.run(ctx, &reporter));
                    (name, handle)
                })
                .collect();

            for (name, handle) in workers {
                let result = handle
                    .join()
                    .unwrap_or_else(|_| Err(CadenceError::LanePanic { lane: name.clone() }));
                if let Err(e) = result {
                    error!("Lane '{}' failed: {}", name, e);
                    if first_error.is_none() {
                        first_error = Some(e);
                    }
                }
            }
        });

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Emit trace lines for every runnable lane and its steps.
    pub fn describe(&mut self, indent: usize, ctx: &RunContext) {
        for lane in &mut self.lanes {
            let weight = lane.steps.compute_weight(ctx);
            lane.weight = Some(weight);
            if weight >= 0.0 {
                info!(
                    "{:indent$}{} lane '{}' (weight {}):",
                    "",
                    self.main_key,
                    lane.name,
                    weight,
                    indent = indent
                );
            }
            lane.steps.describe(indent + 2, ctx);
        }
    }

    /// Gather label pairs across all lanes, first seen wins.
    pub fn collect_labels(&self, labels: &mut Vec<Label>) {
        for lane in &self.lanes {
            lane.steps.collect_labels(labels);
        }
    }

    /// Sort every lane's steps by step key.
    pub fn sort(&mut self) {
        for lane in &mut self.lanes {
            lane.steps.sort();
        }
    }

    /// Recursive lookup by sequence identifier across lanes.
    pub fn find(&self, sequence: &Sequence) -> Option<&StepEntry> {
        self.lanes.iter().find_map(|l| l.steps.find(sequence))
    }

    /// Recursive removal by sequence identifier across lanes.
    pub fn remove(&mut self, sequence: &Sequence) -> bool {
        self.lanes.iter_mut().any(|l| l.steps.remove(sequence))
    }
}
