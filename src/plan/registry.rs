//! Assembly and execution of the task tree.

use std::thread;

use chrono::Utc;
use tracing::{info, warn};

use crate::context::RunContext;
use crate::error::Result;
use crate::plugins::PluginLoader;
use crate::status::{reporter, Reporter, StatusSink, StatusUpdate, TaskStatus};

use super::node::TaskNode;
use super::parallel::ParallelGroup;
use super::sequential::SequentialGroup;
use super::step::{Label, Sequence, Step, StepEntry, MAIN_LANE};

/// Exit code the process reports when a run is cancelled at entry.
pub const CANCEL_EXIT_CODE: u8 = 2;

/// How a run ended when no error was raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// Every step ran to completion.
    Completed,
    /// A cancellation request was found at run entry; no step executed.
    /// The process entrypoint maps this onto [`CANCEL_EXIT_CODE`].
    Cancelled,
}

/// Builds the execution tree from flat step registrations and drives a
/// full run.
///
/// A registry is an ordinary value: construct one per process and pass it
/// by reference to every module that performs registration.
#[derive(Debug, Default)]
pub struct Registry {
    root: SequentialGroup,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when no step has been registered yet.
    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }

    /// Register a step, replacing any earlier step at the same sequence.
    ///
    /// A candidate without a sequence is logged and skipped; the registry
    /// stays usable. Placement: a step whose main key already holds a
    /// parallel group joins it as a lane member; a main-lane step at a free
    /// key becomes a plain sequential entry; anything else founds a new
    /// parallel group at the key, migrating a plain step already there into
    /// it.
    pub fn register(&mut self, step: Box<dyn Step>) {
        let Some(sequence) = step.sequence() else {
            warn!("Step without a sequence cannot be registered; skipping");
            return;
        };

        // Hot-swap: the newest registration at a sequence wins.
        self.root.remove(&sequence);

        let main = sequence.main_key();
        let lane = sequence.lane_name().to_string();
        let header = step.description().header().to_string();
        let entry = StepEntry::new(sequence, step);

        let occupied = self.root.position_by_step_key(main);
        match occupied {
            Some(index) if self.root.is_parallel_at(index) => {
                if let TaskNode::Parallel(group) = self.root.child_mut(index) {
                    group.add(entry);
                }
            }
            None if lane == MAIN_LANE => {
                self.root.push(TaskNode::Step(entry));
            }
            _ => {
                let mut group = ParallelGroup::new(main, header);
                if let Some(index) = occupied {
                    if let TaskNode::Step(prior) = self.root.remove_child_at(index) {
                        group.add(prior);
                    }
                }
                group.add(entry);
                self.root.push(TaskNode::Parallel(group));
            }
        }
    }

    /// Remove a step by its sequence; a no-op when it is absent.
    pub fn unregister(&mut self, step: &dyn Step) {
        let Some(sequence) = step.sequence() else {
            warn!("Step without a sequence cannot be unregistered; skipping");
            return;
        };
        self.root.remove(&sequence);
    }

    /// Recursive lookup by sequence identifier.
    pub fn get_step(&self, sequence: &Sequence) -> Option<&StepEntry> {
        self.root.find(sequence)
    }

    /// Stabilize ordering for deterministic execution and display.
    pub fn sort(&mut self) {
        self.root.sort();
    }

    /// Total weight of the whole tree for the given context: the sum of
    /// every non-skipped node, with parallel groups counting their longest
    /// lane.
    pub fn total_weight(&mut self, ctx: &RunContext) -> f64 {
        self.root.compute_weight(ctx)
    }

    /// Deduplicated label pairs gathered from the whole tree.
    pub fn labels(&self) -> Vec<Label> {
        let mut labels = Vec::new();
        self.root.collect_labels(&mut labels);
        labels
    }

    /// Log each node's description and resolved weight at increasing
    /// indent. A dry-run preview: neither the tree nor the status sink is
    /// touched.
    pub fn display(&mut self, ctx: &RunContext) {
        info!("Task registry:");
        self.root.describe(1, ctx);
    }

    /// Populate the tree through the loader's registration hooks, then
    /// sort. A registry that already holds steps is left untouched.
    pub fn populate(&mut self, loader: &PluginLoader, modules: &[String]) -> Result<()> {
        if !self.root.is_empty() {
            return Ok(());
        }
        loader.load(modules, self)?;
        self.sort();
        Ok(())
    }

    /// Execute the whole tree.
    ///
    /// The sink, when attached, is consulted exactly once before anything
    /// runs: a `Canceling` status is rewritten to `Cancelled` and the run
    /// returns [`RunOutcome::Cancelled`] without executing a single step.
    /// There is no mid-run preemption. All later sink writes flow through
    /// one writer thread, in order; the tree itself is driven from the
    /// calling thread.
    pub fn run(
        &mut self,
        ctx: &RunContext,
        sink: Option<&mut dyn StatusSink>,
    ) -> Result<RunOutcome> {
        match sink {
            Some(sink) => {
                if sink.status()? == Some(TaskStatus::Canceling) {
                    sink.update(&StatusUpdate::cancelled())?;
                    info!("Cancellation requested; no steps executed");
                    return Ok(RunOutcome::Cancelled);
                }

                let (progress, rx) = Reporter::channel();
                let root = &mut self.root;
                thread::scope(|scope| {
                    let writer = scope.spawn(move || reporter::drain(rx, sink));
                    let result = root.run(ctx, &progress);
                    drop(progress);
                    if writer.join().is_err() {
                        warn!("Status writer terminated abnormally");
                    }
                    result
                })?;
            }
            None => self.root.run(ctx, &Reporter::disabled())?,
        }

        info!("Finished run at {}", Utc::now().format("%H:%M:%S"));
        Ok(RunOutcome::Completed)
    }
}
