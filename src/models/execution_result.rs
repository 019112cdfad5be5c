//! Execution Result Model
//!
//! Accumulates everything one compile-and-run execution produced. The
//! result is terminal once the supervised process has exited and the final
//! drain was performed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::StreamKind;

/// How an execution ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// Still being assembled
    #[default]
    Pending,
    /// Compiled and exited with code 0
    Success,
    /// Compiler exited non-zero; the executable never ran
    CompileFailed,
    /// Executable exited non-zero
    RuntimeFailed,
    /// Deadline expired and the child was terminated
    TimedOut,
}

/// Composite report of one execution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ExecutionResult {
    /// Exit code of the last process that ran (compiler or executable)
    pub exit_code: Option<i32>,

    /// Everything forwarded to the stdout channel
    pub stdout: String,

    /// Everything forwarded to the stderr channel, diagnostics included
    pub stderr: String,

    /// How the execution ended
    pub outcome: Outcome,

    /// When the execution started
    pub started_at: Option<DateTime<Utc>>,

    /// When the execution finished
    pub finished_at: Option<DateTime<Utc>>,
}

impl ExecutionResult {
    /// Create an empty result stamped with the current time
    pub fn started() -> Self {
        Self {
            started_at: Some(Utc::now()),
            ..Self::default()
        }
    }

    /// Append text to one of the channels
    pub fn append(&mut self, stream: StreamKind, text: &str) {
        match stream {
            StreamKind::Stdout => self.stdout.push_str(text),
            StreamKind::Stderr => self.stderr.push_str(text),
        }
    }

    /// Seal the result with its outcome and exit code
    pub fn finish(&mut self, outcome: Outcome, exit_code: Option<i32>) {
        self.outcome = outcome;
        self.exit_code = exit_code;
        self.finished_at = Some(Utc::now());
    }

    /// Whether the execution compiled and exited cleanly
    pub fn succeeded(&self) -> bool {
        self.outcome == Outcome::Success
    }

    /// Whether the executable was never run because compilation failed
    pub fn compile_failed(&self) -> bool {
        self.outcome == Outcome::CompileFailed
    }

    /// Whether the execution was cut short by its deadline
    pub fn timed_out(&self) -> bool {
        self.outcome == Outcome::TimedOut
    }

    /// Wall-clock duration, once finished
    pub fn duration(&self) -> Option<std::time::Duration> {
        match (self.started_at, self.finished_at) {
            (Some(start), Some(end)) => end.signed_duration_since(start).to_std().ok(),
            _ => None,
        }
    }
}
