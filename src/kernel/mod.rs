//! Notebook kernel adapter
//!
//! The [`Kernel`] trait is the surface a notebook front end talks to. The
//! supervision core knows nothing about it.

pub mod c_kernel;
pub mod hooks;
pub mod magics;
pub mod wrap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Result;
use crate::models::ExecutionResult;
use crate::supervisor::{InputProvider, OutputSink};

pub use c_kernel::CKernel;
pub use magics::Magics;

/// A language kernel executing one cell at a time
pub trait Kernel {
    /// Execute `code`, streaming output to `sink` and reading input from `input`
    fn execute(
        &mut self,
        code: &str,
        sink: &mut dyn OutputSink,
        input: &mut dyn InputProvider,
    ) -> Result<ExecutionReply>;

    /// Release every resource the kernel holds
    fn shutdown(&mut self) -> Result<()>;

    /// Static description of the kernel's language
    fn language_info(&self) -> LanguageInfo;
}

/// Whether a request was handled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReplyStatus {
    Ok,
    Error,
}

/// Reply to an execute request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionReply {
    pub status: ReplyStatus,

    /// Counter of non-empty executions, starting at 1
    pub execution_count: u64,

    /// Unique id of this request
    pub execution_id: Uuid,

    /// Outcome of the compile-and-run, absent for empty cells and errors
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<ExecutionResult>,

    /// Error message when `status` is `error`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ExecutionReply {
    pub fn ok(execution_count: u64, result: Option<ExecutionResult>) -> Self {
        Self {
            status: ReplyStatus::Ok,
            execution_count,
            execution_id: Uuid::new_v4(),
            result,
            error: None,
        }
    }

    pub fn error(execution_count: u64, message: impl Into<String>) -> Self {
        Self {
            status: ReplyStatus::Error,
            execution_count,
            execution_id: Uuid::new_v4(),
            result: None,
            error: Some(message.into()),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == ReplyStatus::Ok
    }
}

/// Language metadata advertised to front ends
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageInfo {
    pub name: String,
    pub mimetype: String,
    pub file_extension: String,
    pub version: String,
}
