//! Compile-then-run orchestration
//!
//! Runs the compiler under a [`ProcessSupervisor`], and only when it exits
//! with code 0 runs the produced executable under a fresh one. Output of
//! both phases is forwarded live and recorded in an [`ExecutionResult`].

use std::time::{Duration, Instant};

use super::workspace::ScratchSpace;
use crate::config::{BlankLinePolicy, Config, SupervisorConfig};
use crate::error::Result;
use crate::models::{CommandSpec, ExecutionResult, Outcome, StreamKind};
use crate::supervisor::{InputBridge, InputProvider, OutputSink, ProcessSupervisor, RunStatus};

/// Prefix of every message the kernel itself writes to stderr
pub const DIAGNOSTIC_PREFIX: &str = "[C kernel] ";

/// One compile-and-run request
///
/// The optional scratch space holds the job's source and binary; it is
/// removed when the job is consumed, whatever the outcome.
#[derive(Debug)]
pub struct Job {
    pub compile: CommandSpec,
    pub run: CommandSpec,
    scratch: Option<ScratchSpace>,
}

impl Job {
    pub fn new(compile: CommandSpec, run: CommandSpec) -> Self {
        Self {
            compile,
            run,
            scratch: None,
        }
    }

    /// Attach the scratch space whose files the commands refer to
    pub fn with_scratch(mut self, scratch: ScratchSpace) -> Self {
        self.scratch = Some(scratch);
        self
    }

    pub fn scratch(&self) -> Option<&ScratchSpace> {
        self.scratch.as_ref()
    }
}

/// Sequences compilation and execution of a [`Job`]
#[derive(Debug, Clone)]
pub struct Orchestrator {
    supervisor: SupervisorConfig,
    blank_lines: BlankLinePolicy,
}

impl Orchestrator {
    pub fn new(config: &Config) -> Self {
        Self::with_settings(config.supervisor.clone(), config.input.blank_lines)
    }

    pub fn with_settings(supervisor: SupervisorConfig, blank_lines: BlankLinePolicy) -> Self {
        Self {
            supervisor,
            blank_lines,
        }
    }

    pub fn supervisor_config(&self) -> &SupervisorConfig {
        &self.supervisor
    }

    /// Compile, then run if compilation succeeded
    ///
    /// Non-zero exit codes are reported through the result's outcome and a
    /// diagnostic on stderr. Only a failure to launch a process is an error.
    pub fn execute(
        &self,
        job: Job,
        sink: &mut dyn OutputSink,
        input: &mut dyn InputProvider,
    ) -> Result<ExecutionResult> {
        // Dropped on every return path below, removing the job's files.
        let Job {
            compile,
            run,
            scratch: _scratch,
        } = job;

        let mut recorder = Recorder::new(sink);
        let mut bridge = InputBridge::new(input, self.blank_lines);

        debug!("Compiling with: {}", compile);
        let compiled = self.supervise(compile, &mut recorder, &mut bridge)?;
        info!("Compiler exited with code {}", compiled.exit_code);

        if compiled.timed_out {
            recorder.diagnostic(&format!(
                "compilation timed out after {}s",
                self.timeout_secs()
            ));
            return Ok(recorder.finish(Outcome::TimedOut, Some(compiled.exit_code)));
        }

        if compiled.exit_code != 0 {
            recorder.diagnostic(&format!(
                "compilation failed with exit code {}, the executable will not be executed",
                compiled.exit_code
            ));
            return Ok(recorder.finish(Outcome::CompileFailed, Some(compiled.exit_code)));
        }

        debug!("Running: {}", run);
        let ran = self.supervise(run, &mut recorder, &mut bridge)?;
        info!(
            "Executable exited with code {} ({} input line(s))",
            ran.exit_code,
            bridge.lines_forwarded()
        );

        let outcome = if ran.timed_out {
            recorder.diagnostic(&format!(
                "executable timed out after {}s",
                self.timeout_secs()
            ));
            Outcome::TimedOut
        } else if ran.exit_code != 0 {
            recorder.diagnostic(&format!("executable exited with code {}", ran.exit_code));
            Outcome::RuntimeFailed
        } else {
            Outcome::Success
        };

        Ok(recorder.finish(outcome, Some(ran.exit_code)))
    }

    fn supervise(
        &self,
        command: CommandSpec,
        sink: &mut dyn OutputSink,
        bridge: &mut InputBridge<'_>,
    ) -> Result<RunStatus> {
        let deadline = self.supervisor.timeout().map(|limit| Instant::now() + limit);
        let mut supervisor = ProcessSupervisor::spawn(command, &self.supervisor)?;
        supervisor.run_to_completion(sink, bridge, deadline)
    }

    fn timeout_secs(&self) -> f64 {
        self.supervisor
            .timeout()
            .unwrap_or(Duration::ZERO)
            .as_secs_f64()
    }
}

/// Forwards to the caller's sink and keeps a copy in the result
struct Recorder<'a> {
    inner: &'a mut dyn OutputSink,
    result: ExecutionResult,
}

impl<'a> Recorder<'a> {
    fn new(inner: &'a mut dyn OutputSink) -> Self {
        Self {
            inner,
            result: ExecutionResult::started(),
        }
    }

    /// Emit a kernel message on stderr, on a line of its own
    fn diagnostic(&mut self, message: &str) {
        let mut text = String::new();
        if !self.result.stderr.is_empty() && !self.result.stderr.ends_with('\n') {
            text.push('\n');
        }
        text.push_str(DIAGNOSTIC_PREFIX);
        text.push_str(message);
        text.push('\n');
        self.forward(StreamKind::Stderr, &text);
    }

    fn finish(mut self, outcome: Outcome, exit_code: Option<i32>) -> ExecutionResult {
        self.result.finish(outcome, exit_code);
        self.result
    }
}

impl OutputSink for Recorder<'_> {
    fn forward(&mut self, stream: StreamKind, text: &str) {
        self.result.append(stream, text);
        self.inner.forward(stream, text);
    }
}
