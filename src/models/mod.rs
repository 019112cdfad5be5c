//! Core data models for ckernel
//!
//! Commands handed to a supervisor, output stream identifiers and the
//! accumulated result of one compile-and-run execution.

pub mod command_spec;
pub mod execution_result;
pub mod stream_kind;

// Re-exports for convenience
pub use command_spec::CommandSpec;
pub use execution_result::{ExecutionResult, Outcome};
pub use stream_kind::StreamKind;
