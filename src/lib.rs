//! ckernel - a compile-and-run C kernel for notebooks
//!
//! This library runs C snippets the way a notebook cell expects: the cell is
//! compiled with the system compiler, and only if that succeeds the program
//! is executed, with its stdout and stderr streamed while it runs and its
//! stdin reads answered interactively.
//!
//! ## Module Organization
//!
//! - [`supervisor`] - Child process supervision: stream drainers, the input
//!   request protocol, input bridge and termination
//! - [`execution`] - Compile-then-run orchestration and scratch directories
//! - [`kernel`] - The [`Kernel`](kernel::Kernel) trait and the C kernel
//!   (magics, implicit `main`, stdin hooks)
//! - [`config`] - Configuration structures and the file loader
//! - [`models`] - Commands, stream identifiers and execution results
//! - [`mod@error`] - Error types and Result aliases
//!
//! ## Quick Start
//!
//! ```no_run
//! use ckernel::kernel::{CKernel, Kernel};
//! use ckernel::supervisor::{ConsoleSink, StdinProvider};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ckernel::init()?;
//! let mut kernel = CKernel::new(config)?;
//!
//! let reply = kernel.execute(
//!     "#include <stdio.h>\nint n; scanf(\"%d\", &n); printf(\"%d\\n\", n * 2);",
//!     &mut ConsoleSink,
//!     &mut StdinProvider,
//! )?;
//! println!("{}", serde_json::to_string(&reply)?);
//! kernel.shutdown()?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - **Caller thread:** runs the poll loop, one cycle every
//!   `cycle_interval_ms`, and blocks while an input line is requested
//! - **Reader threads:** one per child output pipe, reading fixed-size
//!   chunks into an unbounded `tokio::mpsc` channel
//!
//! Programs announce that they want input by printing `<inputRequest>` on
//! stdout; the force-included stdin hooks header does this for `scanf`,
//! `getchar` and `fgets(.., stdin)`. The token never reaches the output.

#![allow(unexpected_cfgs)]

#[macro_use]
extern crate tracing;

pub mod config;
pub mod error;
pub mod execution;
pub mod kernel;
pub mod models;
pub mod supervisor;

use std::path::{Path, PathBuf};

// Re-exports for core functionality
pub use config::Config;
pub use error::{Error, Result};

// Convenience re-exports for common types
pub use config::loader::ConfigLoader;
pub use execution::{Job, Orchestrator, ScratchSpace};
pub use kernel::{CKernel, ExecutionReply, Kernel};
pub use models::{CommandSpec, ExecutionResult, Outcome, StreamKind};
pub use supervisor::{InputProvider, OutputSink, ProcessSupervisor};

// Version information
/// The current version of ckernel from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// The package name from Cargo.toml
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// The package description from Cargo.toml
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

/// Load configuration from the default locations
///
/// Falls back to defaults when no file is found or the file cannot be
/// loaded. Warns when the configured compiler is not on `PATH`.
pub fn init() -> Result<Config> {
    debug!("Initializing {} v{}", NAME, VERSION);

    let config = match ConfigLoader::load() {
        Ok(config) => config,
        Err(e) => {
            warn!("Failed to load configuration: {}. Using defaults", e);
            Config::default()
        }
    };

    check_compiler(&config);
    Ok(config)
}

/// Load configuration from an explicit file
///
/// Unlike [`init`], a missing or invalid file is an error.
pub fn init_with_config(path: &Path) -> Result<Config> {
    debug!("Initializing {} v{} from {}", NAME, VERSION, path.display());

    let config = ConfigLoader::load_from_path(path)?;
    check_compiler(&config);
    Ok(config)
}

fn check_compiler(config: &Config) {
    let compiler = &config.compiler.path;
    if find_executable(compiler).is_none() {
        warn!(
            "Compiler '{}' not found; cells will fail to compile",
            compiler.display()
        );
    }
}

/// Resolve `program` the way process spawning does
///
/// Paths with a directory component are checked as-is; bare names are
/// looked up in `PATH`.
pub fn find_executable(program: &Path) -> Option<PathBuf> {
    if program.components().count() > 1 {
        return program.is_file().then(|| program.to_path_buf());
    }

    let path_var = std::env::var_os("PATH")?;
    std::env::split_paths(&path_var)
        .map(|dir| dir.join(program))
        .find(|candidate| candidate.is_file())
}
