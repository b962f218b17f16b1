//! The task tree: step contract, composite nodes, and the registry.
//!
//! Steps register against a [`Registry`] under a [`Sequence`] identifier.
//! The registry assembles them into a tree rooted at a sequential group,
//! with parallel groups holding named lanes wherever registrations share a
//! main key, and drives a full run over the assembled tree.

pub mod node;
pub mod parallel;
pub mod registry;
pub mod sequential;
pub mod step;

pub use node::TaskNode;
pub use parallel::ParallelGroup;
pub use registry::{Registry, RunOutcome, CANCEL_EXIT_CODE};
pub use sequential::SequentialGroup;
pub use step::{Label, Sequence, SequenceKey, Step, StepDescription, StepEntry, MAIN_LANE};
