//! Contract Tests for Compile-then-Run Orchestration
//!
//! Shell scripts stand in for the compiler and the executable so the
//! sequencing rules can be checked without a C toolchain.

#![cfg(unix)]

#[path = "../test_utils/mod.rs"]
mod test_utils;

use ckernel::execution::{Job, Orchestrator, ScratchSpace};
use ckernel::supervisor::{CollectingSink, ScriptedInput};
use ckernel::{Error, Outcome, StreamKind};
use test_utils::{interactive_sh, sh, test_config};

fn execute(job: Job, input: &mut ScriptedInput) -> (ckernel::ExecutionResult, CollectingSink) {
    let orchestrator = Orchestrator::new(&test_config());
    let mut sink = CollectingSink::new();
    let result = orchestrator.execute(job, &mut sink, input).unwrap();
    (result, sink)
}

#[test]
fn test_compile_failure_never_launches_run() {
    let marker_dir = tempfile::tempdir().unwrap();
    let marker = marker_dir.path().join("ran");
    let run = sh(&format!("touch '{}'", marker.display()));
    let job = Job::new(sh("echo 'source.c:1: error' >&2; exit 1"), run);

    let mut input = ScriptedInput::default();
    let (result, sink) = execute(job, &mut input);

    assert_eq!(result.outcome, Outcome::CompileFailed);
    assert_eq!(result.exit_code, Some(1));
    assert!(!marker.exists());
    assert!(result.stderr.contains("source.c:1: error"));
    assert!(result
        .stderr
        .contains("[C kernel] compilation failed with exit code 1, the executable will not be executed"));
    assert_eq!(sink.stderr(), result.stderr);
}

#[test]
fn test_compile_success_runs_executable() {
    let marker_dir = tempfile::tempdir().unwrap();
    let marker = marker_dir.path().join("ran");
    let run = sh(&format!("touch '{}'; echo done", marker.display()));
    let job = Job::new(sh("echo 'warning: unused' >&2"), run);

    let mut input = ScriptedInput::default();
    let (result, _) = execute(job, &mut input);

    assert!(result.succeeded());
    assert!(marker.exists());
    assert_eq!(result.stdout, "done\n");
    assert_eq!(result.stderr, "warning: unused\n");
}

#[test]
fn test_exit_two_without_output() {
    let job = Job::new(sh("exit 0"), sh("exit 2"));
    let mut input = ScriptedInput::default();
    let (result, sink) = execute(job, &mut input);

    assert_eq!(result.outcome, Outcome::RuntimeFailed);
    assert_eq!(result.exit_code, Some(2));
    assert!(result.stdout.is_empty());
    assert_eq!(result.stderr, "[C kernel] executable exited with code 2\n");
    assert_eq!(
        sink.chunks,
        vec![(
            StreamKind::Stderr,
            "[C kernel] executable exited with code 2\n".to_string()
        )]
    );
}

#[test]
fn test_input_scenario() {
    let job = Job::new(
        sh("exit 0"),
        interactive_sh("printf 'Enter:<inputRequest>'; read x; echo \"got $x\""),
    );
    let mut input = ScriptedInput::new(["5"]);
    let (result, sink) = execute(job, &mut input);

    assert!(result.succeeded());
    assert_eq!(sink.chunks[0], (StreamKind::Stdout, "Enter:".to_string()));
    assert_eq!(result.stdout, "Enter:got 5\n");
    assert!(!result.stdout.contains("<inputRequest>"));
}

#[test]
fn test_timeout_terminates_endless_child() {
    let mut config = test_config();
    config.supervisor.timeout_ms = Some(300);
    let orchestrator = Orchestrator::new(&config);
    let job = Job::new(sh("exit 0"), sh("echo tick; exec sleep 60"));
    let mut sink = CollectingSink::new();
    let mut input = ScriptedInput::default();

    let start = std::time::Instant::now();
    let result = orchestrator.execute(job, &mut sink, &mut input).unwrap();

    assert!(start.elapsed() < std::time::Duration::from_secs(10));
    assert_eq!(result.outcome, Outcome::TimedOut);
    assert_eq!(result.stdout, "tick\n");
    assert!(result.stderr.contains("[C kernel] executable timed out after 0.3s"));
}

#[test]
fn test_scratch_released_after_success_and_launch_error() {
    let scratch = ScratchSpace::new().unwrap();
    let dir = scratch.path().to_path_buf();
    let job = Job::new(sh("exit 0"), sh("exit 0")).with_scratch(scratch);
    let mut input = ScriptedInput::default();
    execute(job, &mut input);
    assert!(!dir.exists());

    let scratch = ScratchSpace::new().unwrap();
    let dir = scratch.path().to_path_buf();
    let job = Job::new(sh("exit 0"), ckernel::CommandSpec::new(dir.join("missing")))
        .with_scratch(scratch);
    let orchestrator = Orchestrator::new(&test_config());
    let mut sink = CollectingSink::new();
    let result = orchestrator.execute(job, &mut sink, &mut input);

    assert!(matches!(result, Err(Error::LaunchFailed { .. })));
    assert!(!dir.exists());
}
