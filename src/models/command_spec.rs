//! Command Specification Model
//!
//! Describes one process launch: program, arguments, environment and
//! whether the child participates in the interactive input protocol.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// A command to be launched under a [`ProcessSupervisor`](crate::supervisor::ProcessSupervisor)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandSpec {
    /// Program to execute
    pub program: PathBuf,

    /// Arguments passed to the program
    pub args: Vec<String>,

    /// Working directory (inherits the caller's when `None`)
    pub working_directory: Option<PathBuf>,

    /// Extra environment variables layered on the inherited environment
    pub env: HashMap<String, String>,

    /// Pipe stdin and scan stdout for input requests
    pub interactive: bool,
}

impl CommandSpec {
    /// Create a non-interactive command
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            working_directory: None,
            env: HashMap::new(),
            interactive: false,
        }
    }

    /// Append a single argument
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append several arguments
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Set the working directory
    pub fn current_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.working_directory = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Set an environment variable
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Mark the command as interactive
    pub fn interactive(mut self, interactive: bool) -> Self {
        self.interactive = interactive;
        self
    }

    /// Human-readable command line, used in logs and diagnostics
    pub fn display_string(&self) -> String {
        let program = self.program.to_string_lossy();
        if self.args.is_empty() {
            program.to_string()
        } else {
            format!("{} {}", program, self.args.join(" "))
        }
    }

    /// Build the `std::process::Command` with all three standard streams wired
    pub(crate) fn to_command(&self) -> Command {
        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .envs(&self.env)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .stdin(if self.interactive {
                Stdio::piped()
            } else {
                Stdio::null()
            });

        if let Some(dir) = &self.working_directory {
            command.current_dir(dir);
        }

        command
    }
}

impl std::fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_string())
    }
}
