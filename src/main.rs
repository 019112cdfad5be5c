//! ckernel - compile and run a C file the way a notebook cell runs
//!
//! Output is streamed to the terminal while the program runs and its reads
//! from stdin are answered from the terminal.

use std::env;
use std::io::Read;
use std::path::PathBuf;
use std::process;

use anyhow::{bail, Context};
use tracing::{debug, error, warn};

use ckernel::config::loader::ConfigLoader;
use ckernel::kernel::{CKernel, ExecutionReply, Kernel};
use ckernel::supervisor::{ConsoleSink, InputProvider, ReaderProvider, StdinProvider};
use ckernel::{Config, Outcome};

/// Command line arguments
#[derive(Debug, Default, PartialEq)]
struct AppArgs {
    /// Configuration file path
    config_path: Option<PathBuf>,
    /// Enable debug logging
    debug: bool,
    /// Deadline for each phase, in seconds
    timeout: Option<f64>,
    /// Source file, `-` for stdin
    source: Option<String>,
    /// Arguments passed to the program
    program_args: Vec<String>,
    /// Print help and exit
    help: bool,
}

impl AppArgs {
    /// Parse the process's command line
    fn parse() -> anyhow::Result<Self> {
        Self::parse_from(env::args().skip(1))
    }

    fn parse_from<I>(args: I) -> anyhow::Result<Self>
    where
        I: IntoIterator<Item = String>,
    {
        let mut app_args = AppArgs::default();
        let mut args = args.into_iter();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--config" | "-c" => {
                    let path = args.next().context("Missing config file path")?;
                    app_args.config_path = Some(PathBuf::from(path));
                }
                "--debug" | "-d" => {
                    app_args.debug = true;
                }
                "--timeout" | "-t" => {
                    let value = args.next().context("Missing timeout value")?;
                    let secs: f64 = value
                        .parse()
                        .with_context(|| format!("Invalid timeout: {}", value))?;
                    if !secs.is_finite() || secs <= 0.0 {
                        bail!("Timeout must be a positive number of seconds");
                    }
                    app_args.timeout = Some(secs);
                }
                "--help" | "-h" => {
                    app_args.help = true;
                }
                "--" => {
                    app_args.program_args.extend(args.by_ref());
                }
                "-" if app_args.source.is_none() => {
                    app_args.source = Some(arg);
                }
                other if other.starts_with('-') => {
                    bail!("Unknown option: {}", other);
                }
                _ if app_args.source.is_none() => {
                    app_args.source = Some(arg);
                }
                _ => {
                    app_args.program_args.push(arg);
                }
            }
        }

        Ok(app_args)
    }
}

/// Print help information
fn print_help() {
    println!("ckernel - compile and run C code with live output and interactive input");
    println!();
    println!("USAGE:");
    println!("    ckernel [OPTIONS] <FILE|-> [-- ARGS...]");
    println!();
    println!("    With FILE, the program's input is read from stdin. With -, the");
    println!("    source is read from stdin and input from the terminal (/dev/tty).");
    println!();
    println!("OPTIONS:");
    println!("    -c, --config <PATH>    Path to configuration file");
    println!("    -d, --debug            Enable debug logging");
    println!("    -t, --timeout <SECS>   Terminate the compiler or program after SECS");
    println!("    -h, --help             Print this help message");
    println!();
    println!("CONFIGURATION:");
    println!("    ckernel looks for configuration files in the following order:");
    println!("    1. Path specified with --config");
    println!("    2. $CKERNEL_CONFIG");
    println!("    3. <config dir>/ckernel/config.toml (or .json)");
    println!("    4. ~/.ckernel/config.toml (or .json)");
    println!("    5. ./.ckernel/config.toml (or .json)");
    println!("    6. Built-in defaults");
    println!();
    println!("ENVIRONMENT:");
    println!("    CKERNEL_CONFIG     Path to configuration file");
    println!("    CKERNEL_DEBUG      Enable debug logging (1 or true)");
    println!("    RUST_LOG           Set logging level (error, warn, info, debug, trace)");
}

fn init_logging(debug: bool) {
    let debug_env = env::var("CKERNEL_DEBUG")
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false);
    let log_level = if debug || debug_env { "debug" } else { "info" };

    let env_filter = env::var("RUST_LOG").unwrap_or_else(|_| log_level.to_string());
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(env_filter))
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .init();
}

fn load_configuration(args: &AppArgs) -> anyhow::Result<Config> {
    let mut config = match &args.config_path {
        Some(path) => ckernel::init_with_config(path)
            .with_context(|| format!("Failed to load {}", path.display()))?,
        None => ckernel::init()?,
    };

    if let Some(secs) = args.timeout {
        config.supervisor.timeout_ms = Some((secs * 1000.0).ceil() as u64);
        ConfigLoader::new().validate_config(&config)?;
    }

    Ok(config)
}

fn read_source(source: &str) -> anyhow::Result<String> {
    if source == "-" {
        let mut code = String::new();
        std::io::stdin()
            .read_to_string(&mut code)
            .context("Failed to read source from stdin")?;
        return Ok(code);
    }

    std::fs::read_to_string(source).with_context(|| format!("Failed to read {}", source))
}

/// Where the program's input lines come from
///
/// A cell read from stdin has used it up, so input then comes from the
/// controlling terminal.
fn input_provider(source: &str) -> Box<dyn InputProvider> {
    if source != "-" {
        return Box::new(StdinProvider);
    }

    match ReaderProvider::terminal() {
        Ok(tty) => Box::new(tty),
        Err(e) => {
            warn!("{}; the program will see end of input", e);
            Box::new(StdinProvider)
        }
    }
}

/// Exit code reported for a reply
fn exit_code_for(reply: &ExecutionReply) -> i32 {
    match &reply.result {
        Some(result) => match (result.outcome, result.exit_code) {
            (Outcome::Success, _) => 0,
            (Outcome::CompileFailed, _) => 1,
            (_, Some(code)) if code != 0 => code,
            _ => 1,
        },
        None if reply.is_ok() => 0,
        None => 1,
    }
}

fn run(args: AppArgs) -> anyhow::Result<i32> {
    let Some(source) = args.source.as_deref() else {
        print_help();
        return Ok(2);
    };

    let config = load_configuration(&args)?;
    let code = read_source(source)?;

    let mut kernel = CKernel::new(config)?.with_program_args(args.program_args.clone());
    debug!("{}", kernel.banner().trim_end());

    let mut input = input_provider(source);
    let reply = kernel.execute(&code, &mut ConsoleSink, input.as_mut());
    if let Err(e) = kernel.shutdown() {
        warn!("Failed to clean up kernel files: {}", e);
    }

    let reply = reply?;
    debug!(
        "Reply: {}",
        serde_json::to_string(&reply).unwrap_or_else(|e| e.to_string())
    );
    Ok(exit_code_for(&reply))
}

fn main() {
    let args = AppArgs::parse().unwrap_or_else(|e| {
        eprintln!("error: {:#}", e);
        print_help();
        process::exit(2);
    });

    if args.help {
        print_help();
        return;
    }

    init_logging(args.debug);

    match run(args) {
        Ok(code) => process::exit(code),
        Err(e) => {
            error!("{:#}", e);
            process::exit(1);
        }
    }
}
