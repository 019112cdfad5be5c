//! Compile-and-run execution
//!
//! [`Orchestrator`] drives a [`Job`] through compilation and execution;
//! [`ScratchSpace`] owns the temporary files a job needs.

pub mod orchestrator;
pub mod workspace;

pub use orchestrator::{Job, Orchestrator, DIAGNOSTIC_PREFIX};
pub use workspace::ScratchSpace;
