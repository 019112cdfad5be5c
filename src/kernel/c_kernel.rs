//! C kernel
//!
//! Turns a cell into a [`Job`]: magics are parsed, the code is wrapped in a
//! `main` when it has none, written to a fresh scratch space and compiled
//! with the stdin hooks force-included.

use std::path::{Path, PathBuf};

use super::hooks::{hooks_header, HOOKS_HEADER_NAME};
use super::magics::Magics;
use super::wrap::wrap_main;
use super::{ExecutionReply, Kernel, LanguageInfo};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::execution::{Job, Orchestrator, ScratchSpace, DIAGNOSTIC_PREFIX};
use crate::models::{CommandSpec, StreamKind};
use crate::supervisor::{InputProvider, OutputSink};

const SOURCE_FILE_NAME: &str = "source.c";
const BINARY_FILE_NAME: &str = "program.out";

/// Kernel compiling and running C cells
pub struct CKernel {
    config: Config,
    orchestrator: Orchestrator,
    support: Option<ScratchSpace>,
    hooks_header: Option<PathBuf>,
    program_args: Vec<String>,
    execution_count: u64,
    shut_down: bool,
}

impl CKernel {
    /// Create a kernel, writing the stdin hooks header if enabled
    pub fn new(config: Config) -> Result<Self> {
        let (support, hooks_header) = if config.compiler.input_hooks {
            let support = ScratchSpace::new()?;
            let header = support.write_file(
                HOOKS_HEADER_NAME,
                hooks_header(&config.supervisor.sentinel),
            )?;
            debug!("Wrote stdin hooks to {}", header.display());
            (Some(support), Some(header))
        } else {
            (None, None)
        };

        Ok(Self {
            orchestrator: Orchestrator::new(&config),
            config,
            support,
            hooks_header,
            program_args: Vec::new(),
            execution_count: 0,
            shut_down: false,
        })
    }

    /// Arguments passed to every executable after the cell's `//%args`
    pub fn with_program_args(mut self, args: Vec<String>) -> Self {
        self.program_args = args;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Number of non-empty cells executed so far
    pub fn execution_count(&self) -> u64 {
        self.execution_count
    }

    /// Path of the force-included header, when hooks are enabled
    pub fn hooks_header_path(&self) -> Option<&Path> {
        self.hooks_header.as_deref()
    }

    pub fn banner(&self) -> String {
        format!(
            "C kernel.\nUses {}, compiles in {}, and creates source code files and executables in a temporary folder.\n",
            self.config.compiler.path.display(),
            self.language_info().version
        )
    }

    /// Write `code` to a new scratch space and build its commands
    pub fn prepare(&self, code: &str) -> Result<Job> {
        let magics = Magics::parse(code);
        let source = if self.config.compiler.wrap_main {
            wrap_main(code)
        } else {
            code.to_string()
        };

        let scratch = ScratchSpace::new()?;
        let source_path = scratch.write_file(SOURCE_FILE_NAME, source)?;
        let binary_path = scratch.file_path(BINARY_FILE_NAME);

        let compile = self.compile_command(&source_path, &binary_path, &magics);
        let run = self.run_command(&binary_path, &magics);
        Ok(Job::new(compile, run).with_scratch(scratch))
    }

    /// `compiler source -std=.. cflags [-include hooks] -o binary ldflags`
    pub fn compile_command(&self, source: &Path, binary: &Path, magics: &Magics) -> CommandSpec {
        let compiler = &self.config.compiler;
        let mut command = CommandSpec::new(&compiler.path).arg(source.to_string_lossy());

        let user_standard = magics.standard_override().is_some()
            || compiler.cflags.iter().any(|flag| flag.starts_with("-std="));
        if !user_standard {
            command = command.arg(format!("-std={}", compiler.standard));
        }

        command = command
            .args(compiler.cflags.iter().cloned())
            .args(magics.cflags.iter().cloned());

        if let Some(header) = &self.hooks_header {
            command = command.arg("-include").arg(header.to_string_lossy());
        }

        command
            .arg("-o")
            .arg(binary.to_string_lossy())
            .args(compiler.ldflags.iter().cloned())
            .args(magics.ldflags.iter().cloned())
    }

    pub fn run_command(&self, binary: &Path, magics: &Magics) -> CommandSpec {
        CommandSpec::new(binary)
            .args(magics.args.iter().cloned())
            .args(self.program_args.iter().cloned())
            .interactive(true)
    }
}

impl Kernel for CKernel {
    fn execute(
        &mut self,
        code: &str,
        sink: &mut dyn OutputSink,
        input: &mut dyn InputProvider,
    ) -> Result<ExecutionReply> {
        if self.shut_down {
            return Err(Error::Other("kernel has been shut down".to_string()));
        }

        if code.trim().is_empty() {
            return Ok(ExecutionReply::ok(self.execution_count, None));
        }

        self.execution_count += 1;
        let job = self.prepare(code)?;

        match self.orchestrator.execute(job, sink, input) {
            Ok(result) => {
                info!(
                    "Execution {} finished: {:?}",
                    self.execution_count, result.outcome
                );
                Ok(ExecutionReply::ok(self.execution_count, Some(result)))
            }
            Err(err @ Error::LaunchFailed { .. }) => {
                error!("{}", err);
                sink.forward(
                    StreamKind::Stderr,
                    &format!("{}{}\n", DIAGNOSTIC_PREFIX, err),
                );
                Ok(ExecutionReply::error(self.execution_count, err.to_string()))
            }
            Err(err) => Err(err),
        }
    }

    fn shutdown(&mut self) -> Result<()> {
        self.shut_down = true;
        self.hooks_header = None;
        if let Some(support) = self.support.take() {
            support.close()?;
        }
        debug!("Kernel shut down after {} execution(s)", self.execution_count);
        Ok(())
    }

    fn language_info(&self) -> LanguageInfo {
        LanguageInfo {
            name: "c".to_string(),
            mimetype: "text/plain".to_string(),
            file_extension: ".c".to_string(),
            version: self.config.compiler.standard.to_uppercase(),
        }
    }
}
