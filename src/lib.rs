//! Cadence - weighted task orchestration.
//!
//! Cadence organizes named, weighted work units into a tree of sequential
//! and parallel groups, executes them respecting ordering and concurrency
//! constraints, reports fractional progress and failure to a pluggable
//! status sink, and supports cooperative cancellation checked once at run
//! entry.
//!
//! # Modules
//!
//! - [`config`] - Runner configuration loading
//! - [`context`] - Run context shared by every step
//! - [`error`] - Error types and result aliases
//! - [`export`] - Pull-model byte stream over generated rows
//! - [`plan`] - Step contract, group nodes, and the registry
//! - [`plugins`] - Plugin registration hooks
//! - [`status`] - Status contract, sinks, and serialized reporting
//!
//! # Example
//!
//! ```
//! use cadence::context::RunContext;
//! use cadence::error::Result;
//! use cadence::plan::{Registry, Sequence, Step, StepDescription};
//!
//! struct Hello;
//!
//! impl Step for Hello {
//!     fn sequence(&self) -> Option<Sequence> {
//!         Some(Sequence::At(100))
//!     }
//!     fn description(&self) -> StepDescription {
//!         StepDescription::plain("say hello")
//!     }
//!     fn execute(&self, _ctx: &RunContext) -> Result<()> {
//!         println!("hello");
//!         Ok(())
//!     }
//! }
//!
//! let mut registry = Registry::new();
//! registry.register(Box::new(Hello));
//! registry.sort();
//! registry.run(&RunContext::new(), None).unwrap();
//! ```

pub mod config;
pub mod context;
pub mod error;
pub mod export;
pub mod plan;
pub mod plugins;
pub mod status;

pub use error::{CadenceError, Result};
