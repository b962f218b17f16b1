//! The leaf step contract and its registered form.

use tracing::info;

use crate::context::RunContext;
use crate::error::Result;

/// Name of the lane that plain sequential steps run on.
pub const MAIN_LANE: &str = "main";

/// Totally ordered key used to position steps.
pub type SequenceKey = i64;

/// Position of a step in the execution tree.
///
/// A scalar key places the step directly in the top-level sequence; the
/// 3-part form places it on a named lane of a parallel group anchored at
/// the main key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Sequence {
    /// A single slot in the top-level sequence.
    At(SequenceKey),
    /// A slot within a named lane.
    Lane {
        main: SequenceKey,
        lane: String,
        step: SequenceKey,
    },
}

impl Sequence {
    /// Convenience constructor for the 3-part form.
    pub fn lane(main: SequenceKey, lane: impl Into<String>, step: SequenceKey) -> Self {
        Sequence::Lane {
            main,
            lane: lane.into(),
            step,
        }
    }

    /// The coarse key grouping one or more lanes into one top-level slot.
    pub fn main_key(&self) -> SequenceKey {
        match self {
            Sequence::At(key) => *key,
            Sequence::Lane { main, .. } => *main,
        }
    }

    /// The lane this step runs on; scalar sequences imply the main lane.
    pub fn lane_name(&self) -> &str {
        match self {
            Sequence::At(_) => MAIN_LANE,
            Sequence::Lane { lane, .. } => lane,
        }
    }

    /// The fine key used to sort children within a sequential group.
    pub fn step_key(&self) -> SequenceKey {
        match self {
            Sequence::At(key) => *key,
            Sequence::Lane { step, .. } => *step,
        }
    }
}

/// Human-readable description of a step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepDescription {
    /// A plain description.
    Plain(String),
    /// Two parts: a header for the parallel group this step introduces,
    /// and the step's own text.
    Grouped { header: String, step: String },
}

impl StepDescription {
    pub fn plain(text: impl Into<String>) -> Self {
        StepDescription::Plain(text.into())
    }

    pub fn grouped(header: impl Into<String>, step: impl Into<String>) -> Self {
        StepDescription::Grouped {
            header: header.into(),
            step: step.into(),
        }
    }

    /// The step's own text.
    pub fn step_text(&self) -> &str {
        match self {
            StepDescription::Plain(text) => text,
            StepDescription::Grouped { step, .. } => step,
        }
    }

    /// The text that titles a parallel group founded by this step.
    pub fn header(&self) -> &str {
        match self {
            StepDescription::Plain(text) => text,
            StepDescription::Grouped { header, .. } => header,
        }
    }
}

/// Key/text pair bound to UI elements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Label {
    pub key: String,
    pub text: String,
}

impl Label {
    pub fn new(key: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            text: text.into(),
        }
    }
}

/// A leaf unit of work.
///
/// Implementations are registered with the
/// [`Registry`](crate::plan::Registry) and owned by exactly one group node.
/// A candidate whose `sequence` is `None` is logged and skipped at
/// registration time.
pub trait Step: Send + Sync {
    /// Position in the execution tree; `None` marks an invalid candidate.
    fn sequence(&self) -> Option<Sequence>;

    /// Human-readable description.
    fn description(&self) -> StepDescription;

    /// Optional label pair for UI binding.
    fn label(&self) -> Option<Label> {
        None
    }

    /// Relative cost used for progress percentages, recomputed per run.
    /// `None` or a negative value skips the step entirely.
    fn weight(&self, ctx: &RunContext) -> Option<f64> {
        let _ = ctx;
        Some(1.0)
    }

    /// Perform the work. Must not be called when `weight` returned a skip.
    fn execute(&self, ctx: &RunContext) -> Result<()>;

    /// Emit a trace line for plan previews. Side-effect only.
    fn describe(&self, indent: usize, ctx: &RunContext) {
        let weight = self
            .weight(ctx)
            .map_or_else(|| "skip".to_string(), |w| w.to_string());
        info!(
            "{:indent$}{}: {} (weight {})",
            "",
            self.sequence().map_or(-1, |s| s.main_key()),
            self.description().step_text(),
            weight,
            indent = indent
        );
    }
}

/// A registered step: the decoded sequence, its own description text, and
/// the boxed behavior, plus the weight cached for the current run.
pub struct StepEntry {
    sequence: Sequence,
    description: String,
    label: Option<Label>,
    weight: Option<f64>,
    step: Box<dyn Step>,
}

impl std::fmt::Debug for StepEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StepEntry")
            .field("sequence", &self.sequence)
            .field("description", &self.description)
            .field("weight", &self.weight)
            .finish()
    }
}

impl StepEntry {
    /// Wrap a validated step. The description stored here is the step's own
    /// text; a group header carried by the 2-part form is consumed by the
    /// registry when it founds the parallel group.
    pub fn new(sequence: Sequence, step: Box<dyn Step>) -> Self {
        let description = step.description().step_text().to_string();
        let label = step.label();
        Self {
            sequence,
            description,
            label,
            weight: None,
            step,
        }
    }

    pub fn sequence(&self) -> &Sequence {
        &self.sequence
    }

    pub fn main_key(&self) -> SequenceKey {
        self.sequence.main_key()
    }

    pub fn lane_name(&self) -> &str {
        self.sequence.lane_name()
    }

    pub fn step_key(&self) -> SequenceKey {
        self.sequence.step_key()
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn label(&self) -> Option<&Label> {
        self.label.as_ref()
    }

    /// The weight cached by the last `compute_weight` call.
    pub fn cached_weight(&self) -> Option<f64> {
        self.weight
    }

    /// Recompute and cache the weight for this run.
    pub fn compute_weight(&mut self, ctx: &RunContext) -> Option<f64> {
        self.weight = self.step.weight(ctx);
        self.weight
    }

    /// Execute the underlying step.
    pub fn run(&self, ctx: &RunContext) -> Result<()> {
        self.step.execute(ctx)
    }

    pub fn describe(&self, indent: usize, ctx: &RunContext) {
        self.step.describe(indent, ctx);
    }
}
