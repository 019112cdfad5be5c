//! Configuration management for ckernel
//!
//! Compiler invocation, supervisor timing and interactive input policy.
//! Every section has defaults, so a config file only needs the keys it
//! changes.

pub mod loader;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Default input request token printed by the stdin hooks
pub const DEFAULT_SENTINEL: &str = "<inputRequest>";

/// Main configuration structure for ckernel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Compiler configuration
    pub compiler: CompilerConfig,

    /// Process supervision configuration
    pub supervisor: SupervisorConfig,

    /// Interactive input configuration
    pub input: InputConfig,
}

/// How the C compiler is invoked
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerConfig {
    /// Compiler executable (looked up on PATH when relative)
    pub path: PathBuf,

    /// Language standard passed as `-std=<standard>`
    pub standard: String,

    /// Flags placed after the source file
    pub cflags: Vec<String>,

    /// Linker flags placed after the output path
    pub ldflags: Vec<String>,

    /// Wrap snippets without a `main` in a default one
    pub wrap_main: bool,

    /// Force-include the header that announces stdin reads
    pub input_hooks: bool,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("gcc"),
            standard: "c11".to_string(),
            cflags: Vec::new(),
            ldflags: vec!["-lm".to_string()],
            wrap_main: true,
            input_hooks: true,
        }
    }
}

/// Timing and buffering for the supervision loop
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SupervisorConfig {
    /// Pause between two cycles of the poll loop
    pub cycle_interval_ms: u64,

    /// Size of each read performed by the stream drainers
    pub read_chunk_size: usize,

    /// Deadline applied to the compile and the run phase separately; `None` waits forever
    pub timeout_ms: Option<u64>,

    /// Upper bound on waiting for a drainer to observe end-of-stream
    pub join_timeout_ms: u64,

    /// Time between SIGTERM and SIGKILL when terminating a child
    pub terminate_grace_ms: u64,

    /// Token on stdout that requests a line of input
    pub sentinel: String,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            cycle_interval_ms: 10,
            read_chunk_size: 4096,
            timeout_ms: None,
            join_timeout_ms: 2000,
            terminate_grace_ms: 200,
            sentinel: DEFAULT_SENTINEL.to_string(),
        }
    }
}

impl SupervisorConfig {
    pub fn cycle_interval(&self) -> Duration {
        Duration::from_millis(self.cycle_interval_ms)
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }

    pub fn join_timeout(&self) -> Duration {
        Duration::from_millis(self.join_timeout_ms)
    }

    pub fn terminate_grace(&self) -> Duration {
        Duration::from_millis(self.terminate_grace_ms)
    }
}

/// What to do when the input provider returns an empty line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BlankLinePolicy {
    /// Ask again until a non-empty line arrives
    #[default]
    Retry,
    /// Forward the blank line as-is
    Accept,
}

/// Interactive input configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct InputConfig {
    /// Handling of blank submissions
    pub blank_lines: BlankLinePolicy,
}
