//! Process Supervisor
//!
//! Owns one child process from launch to joined exit. Each call to
//! [`ProcessSupervisor::cycle`] drains both output streams and, for
//! interactive children, answers input requests announced on stdout.

use std::process::{Child, ChildStdin};
use std::thread;
use std::time::{Duration, Instant};

use super::input::InputBridge;
use super::protocol::{SentinelScanner, Utf8Decoder};
use super::signals::{exit_code_of, terminate_child};
use super::sink::OutputSink;
use super::streams::StreamDrainer;
use crate::config::SupervisorConfig;
use crate::error::{Error, Result};
use crate::models::{CommandSpec, StreamKind};

/// Termination attempts after a missed deadline before giving up
const MAX_TERMINATION_ATTEMPTS: u32 = 3;

/// Lifecycle of a supervised child
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SupervisorState {
    /// Command prepared, nothing spawned yet
    #[default]
    Created,
    /// Child spawned and drainers running
    Running,
    /// The OS reported the child's termination
    Exited,
}

impl std::fmt::Display for SupervisorState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SupervisorState::Created => "created",
            SupervisorState::Running => "running",
            SupervisorState::Exited => "exited",
        };
        f.write_str(name)
    }
}

/// What a single cycle moved
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Bytes drained from stdout (sentinels included)
    pub stdout_bytes: usize,
    /// Bytes drained from stderr
    pub stderr_bytes: usize,
    /// Whether an input request was seen this cycle
    pub input_requested: bool,
}

/// How a supervised run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunStatus {
    /// Exit code, `128 + signal` for signal deaths
    pub exit_code: i32,
    /// The deadline expired and the child was terminated
    pub timed_out: bool,
}

/// Supervises exactly one child process
pub struct ProcessSupervisor {
    command: CommandSpec,
    config: SupervisorConfig,
    state: SupervisorState,
    child: Option<Child>,
    stdin: Option<ChildStdin>,
    stdout: Option<StreamDrainer>,
    stderr: Option<StreamDrainer>,
    scanner: SentinelScanner,
    stdout_text: Utf8Decoder,
    stderr_text: Utf8Decoder,
    pid: Option<u32>,
    exit_code: Option<i32>,
    started_at: Option<Instant>,
}

impl ProcessSupervisor {
    /// Prepare a supervisor; nothing is spawned until [`launch`](Self::launch)
    pub fn new(command: CommandSpec, config: &SupervisorConfig) -> Self {
        Self {
            scanner: SentinelScanner::new(&config.sentinel),
            command,
            config: config.clone(),
            state: SupervisorState::Created,
            child: None,
            stdin: None,
            stdout: None,
            stderr: None,
            stdout_text: Utf8Decoder::new(),
            stderr_text: Utf8Decoder::new(),
            pid: None,
            exit_code: None,
            started_at: None,
        }
    }

    /// Prepare and launch in one step
    pub fn spawn(command: CommandSpec, config: &SupervisorConfig) -> Result<Self> {
        let mut supervisor = Self::new(command, config);
        supervisor.launch()?;
        Ok(supervisor)
    }

    /// Spawn the child and start both drainers
    pub fn launch(&mut self) -> Result<()> {
        self.expect_state(SupervisorState::Created)?;

        let mut child = self
            .command
            .to_command()
            .spawn()
            .map_err(|e| Error::LaunchFailed {
                command: self.command.display_string(),
                reason: e.to_string(),
            })?;

        let chunk_size = self.config.read_chunk_size;
        self.stdout = child
            .stdout
            .take()
            .map(|out| StreamDrainer::start(StreamKind::Stdout, out, chunk_size));
        self.stderr = child
            .stderr
            .take()
            .map(|err| StreamDrainer::start(StreamKind::Stderr, err, chunk_size));
        self.stdin = child.stdin.take();

        let pid = child.id();
        debug!("Launched '{}' as pid {}", self.command, pid);

        self.pid = Some(pid);
        self.child = Some(child);
        self.started_at = Some(Instant::now());
        self.state = SupervisorState::Running;
        Ok(())
    }

    /// Check whether the child has terminated, without blocking
    pub fn poll_exit(&mut self) -> Result<Option<i32>> {
        match self.state {
            SupervisorState::Created => Err(self.invalid_state(SupervisorState::Running)),
            SupervisorState::Exited => Ok(self.exit_code),
            SupervisorState::Running => {
                let Some(child) = self.child.as_mut() else {
                    return Err(self.invalid_state(SupervisorState::Running));
                };

                match child.try_wait() {
                    Ok(Some(status)) => {
                        let code = exit_code_of(status);
                        self.mark_exited(code);
                        Ok(Some(code))
                    }
                    Ok(None) => Ok(None),
                    Err(e) => Err(Error::WaitFailed {
                        command: self.command.display_string(),
                        reason: e.to_string(),
                    }),
                }
            }
        }
    }

    /// Drain both streams once and handle at most one input request
    ///
    /// Stderr is drained before stdout. Input is only requested while the
    /// child is still running.
    pub fn cycle(
        &mut self,
        sink: &mut dyn OutputSink,
        bridge: &mut InputBridge<'_>,
    ) -> Result<CycleReport> {
        if self.state == SupervisorState::Created {
            return Err(self.invalid_state(SupervisorState::Running));
        }

        let mut report = CycleReport::default();

        if let Some(stderr) = self.stderr.as_mut() {
            let bytes = stderr.drain_all();
            report.stderr_bytes = bytes.len();
            let text = self.stderr_text.decode(&bytes);
            forward(sink, StreamKind::Stderr, &text);
        }

        let bytes = match self.stdout.as_mut() {
            Some(stdout) => stdout.drain_all(),
            None => Vec::new(),
        };
        report.stdout_bytes = bytes.len();

        if !self.command.interactive {
            let text = self.stdout_text.decode(&bytes);
            forward(sink, StreamKind::Stdout, &text);
            return Ok(report);
        }

        self.scanner.push(&bytes);
        let mut step = self.scanner.step();
        if bytes.is_empty() && !step.input_requested {
            // Sentinels arrive in one flush; an idle prefix is plain output.
            step.output.extend(self.scanner.release_partial());
        }
        let mut text = self.stdout_text.decode(&step.output);

        if step.input_requested {
            // The sentinel is ASCII; nothing before it can still be mid-character.
            text.push_str(&self.stdout_text.finish());
            forward(sink, StreamKind::Stdout, &text);
            report.input_requested = true;
            self.relay_input(bridge)?;
        } else {
            forward(sink, StreamKind::Stdout, &text);
        }

        Ok(report)
    }

    /// Final drain after exit: last cycle, join, flush held-back bytes
    pub fn finish(
        &mut self,
        sink: &mut dyn OutputSink,
        bridge: &mut InputBridge<'_>,
    ) -> Result<i32> {
        self.expect_state(SupervisorState::Exited)?;

        self.cycle(sink, bridge)?;

        let join_timeout = self.config.join_timeout();
        for drainer in [self.stderr.as_mut(), self.stdout.as_mut()]
            .into_iter()
            .flatten()
        {
            drainer.join(join_timeout);
        }

        if let Some(stderr) = self.stderr.as_mut() {
            let mut text = self.stderr_text.decode(&stderr.drain_all());
            text.push_str(&self.stderr_text.finish());
            forward(sink, StreamKind::Stderr, &text);
        }

        let bytes = match self.stdout.as_mut() {
            Some(stdout) => stdout.drain_all(),
            None => Vec::new(),
        };
        let output = if self.command.interactive {
            self.scanner.push(&bytes);
            let (output, stripped) = self.scanner.finish();
            if stripped > 0 {
                debug!("Dropped {} input request(s) raised after exit", stripped);
            }
            output
        } else {
            bytes
        };
        let mut text = self.stdout_text.decode(&output);
        text.push_str(&self.stdout_text.finish());
        forward(sink, StreamKind::Stdout, &text);

        self.stdin = None;
        self.exit_code
            .ok_or_else(|| self.invalid_state(SupervisorState::Exited))
    }

    /// Cycle until the child exits, then finish
    ///
    /// When `deadline` passes the child is terminated and the run is
    /// reported as timed out. A cycle blocked waiting for input is not
    /// interrupted; the deadline is checked once it returns.
    pub fn run_to_completion(
        &mut self,
        sink: &mut dyn OutputSink,
        bridge: &mut InputBridge<'_>,
        deadline: Option<Instant>,
    ) -> Result<RunStatus> {
        let interval = self.config.cycle_interval();
        let mut timed_out = false;
        let mut termination_attempts = 0;

        loop {
            let exited = self.poll_exit()?.is_some();
            self.cycle(sink, bridge)?;
            if exited {
                break;
            }

            if let Some(deadline) = deadline {
                if Instant::now() >= deadline {
                    if !timed_out {
                        warn!("'{}' exceeded its deadline, terminating", self.command);
                        timed_out = true;
                    }
                    self.terminate_after_deadline(&mut termination_attempts)?;
                    continue;
                }
            }

            thread::sleep(interval);
        }

        let exit_code = self.finish(sink, bridge)?;
        Ok(RunStatus {
            exit_code,
            timed_out,
        })
    }

    /// Best-effort termination of a running child
    pub fn terminate(&mut self) {
        if self.state != SupervisorState::Running {
            return;
        }

        // Closing stdin first unblocks children waiting on input.
        self.stdin = None;

        if let Some(child) = self.child.as_mut() {
            match terminate_child(child, self.config.terminate_grace()) {
                Some(status) => self.mark_exited(exit_code_of(status)),
                None => warn!("Could not confirm termination of '{}'", self.command),
            }
        }
    }

    /// One termination attempt past the deadline, failing once they run out
    fn terminate_after_deadline(&mut self, attempts: &mut u32) -> Result<()> {
        if *attempts >= MAX_TERMINATION_ATTEMPTS {
            return Err(Error::WaitFailed {
                command: self.command.display_string(),
                reason: format!(
                    "child still running after {} termination attempts",
                    attempts
                ),
            });
        }

        *attempts += 1;
        self.terminate();
        if self.state == SupervisorState::Running {
            thread::sleep(self.config.cycle_interval());
        }
        Ok(())
    }

    pub fn state(&self) -> SupervisorState {
        self.state
    }

    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    /// Exit code, once [`SupervisorState::Exited`]
    pub fn exit_code(&self) -> Option<i32> {
        self.exit_code
    }

    pub fn command(&self) -> &CommandSpec {
        &self.command
    }

    /// Time since launch
    pub fn elapsed(&self) -> Option<Duration> {
        self.started_at.map(|start| start.elapsed())
    }

    /// Whether the child's stdin is still open
    pub fn accepts_input(&self) -> bool {
        self.stdin.is_some()
    }

    fn relay_input(&mut self, bridge: &mut InputBridge<'_>) -> Result<()> {
        if self.state == SupervisorState::Exited {
            debug!("Input request from '{}' after exit, ignoring", self.command);
            return Ok(());
        }

        let Some(stdin) = self.stdin.as_mut() else {
            debug!("Input request from '{}' but stdin is closed", self.command);
            return Ok(());
        };

        match bridge.forward_to(stdin) {
            Ok(_) => Ok(()),
            Err(Error::InputUnavailable { reason }) => {
                // The child sees EOF instead of waiting forever.
                warn!("No input for '{}': {}, closing its stdin", self.command, reason);
                self.stdin = None;
                Ok(())
            }
            Err(Error::InputWriteFailed { reason }) => {
                debug!("'{}' closed its stdin: {}", self.command, reason);
                self.stdin = None;
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    fn mark_exited(&mut self, code: i32) {
        self.state = SupervisorState::Exited;
        self.exit_code = Some(code);
        debug!(
            "'{}' exited with code {} after {:?}",
            self.command,
            code,
            self.elapsed().unwrap_or_default()
        );
    }

    fn expect_state(&self, expected: SupervisorState) -> Result<()> {
        if self.state == expected {
            Ok(())
        } else {
            Err(self.invalid_state(expected))
        }
    }

    fn invalid_state(&self, expected: SupervisorState) -> Error {
        Error::InvalidState {
            command: self.command.display_string(),
            state: self.state.to_string(),
            expected: expected.to_string(),
        }
    }
}

impl Drop for ProcessSupervisor {
    fn drop(&mut self) {
        if self.state == SupervisorState::Running {
            debug!("Supervisor for '{}' dropped while running", self.command);
            self.terminate();
        }
    }
}

fn forward(sink: &mut dyn OutputSink, stream: StreamKind, text: &str) {
    if !text.is_empty() {
        sink.forward(stream, text);
    }
}
