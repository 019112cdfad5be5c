//! Contract Tests for Process Supervision
//!
//! Launch, cycle, finish and terminate a real child through
//! `ProcessSupervisor`, observing only what reaches the sink and the child.

#![cfg(unix)]

#[path = "../test_utils/mod.rs"]
mod test_utils;

use std::time::{Duration, Instant};

use ckernel::config::BlankLinePolicy;
use ckernel::supervisor::{
    CollectingSink, InputBridge, ProcessSupervisor, ScriptedInput, SupervisorState,
};
use ckernel::{Error, StreamKind};
use test_utils::{interactive_sh, sh, test_config};

fn supervise(
    spec: ckernel::CommandSpec,
    input: &mut ScriptedInput,
    policy: BlankLinePolicy,
) -> (CollectingSink, i32) {
    let config = test_config();
    let mut supervisor = ProcessSupervisor::spawn(spec, &config.supervisor).unwrap();
    let mut sink = CollectingSink::new();
    let mut bridge = InputBridge::new(input, policy);

    let status = supervisor
        .run_to_completion(&mut sink, &mut bridge, None)
        .unwrap();
    assert_eq!(supervisor.state(), SupervisorState::Exited);
    (sink, status.exit_code)
}

#[test]
fn test_output_arrives_while_child_runs() {
    let config = test_config();
    let mut supervisor =
        ProcessSupervisor::spawn(sh("echo first; sleep 2; echo second"), &config.supervisor).unwrap();
    let mut sink = CollectingSink::new();
    let mut input = ScriptedInput::default();
    let mut bridge = InputBridge::new(&mut input, BlankLinePolicy::Retry);

    let deadline = Instant::now() + Duration::from_secs(1);
    while sink.stdout().is_empty() && Instant::now() < deadline {
        supervisor.cycle(&mut sink, &mut bridge).unwrap();
        std::thread::sleep(Duration::from_millis(5));
    }

    assert_eq!(sink.stdout(), "first\n");
    assert_eq!(supervisor.poll_exit().unwrap(), None);
    supervisor.terminate();
}

#[test]
fn test_large_output_is_preserved_in_order() {
    let mut input = ScriptedInput::default();
    let (sink, code) = supervise(
        sh("i=0; while [ $i -lt 2000 ]; do echo line$i; i=$((i+1)); done"),
        &mut input,
        BlankLinePolicy::Retry,
    );

    let expected: String = (0..2000).map(|i| format!("line{}\n", i)).collect();
    assert_eq!(code, 0);
    assert_eq!(sink.stdout(), expected);
}

#[test]
fn test_stderr_forwarded_before_stdout_within_cycle() {
    let config = test_config();
    let mut supervisor =
        ProcessSupervisor::spawn(sh("echo out; echo err >&2"), &config.supervisor).unwrap();
    while supervisor.poll_exit().unwrap().is_none() {
        std::thread::sleep(Duration::from_millis(5));
    }
    // Let both reader threads queue their output
    std::thread::sleep(Duration::from_millis(200));

    let mut sink = CollectingSink::new();
    let mut input = ScriptedInput::default();
    let mut bridge = InputBridge::new(&mut input, BlankLinePolicy::Retry);
    supervisor.finish(&mut sink, &mut bridge).unwrap();

    let kinds: Vec<StreamKind> = sink.chunks.iter().map(|(kind, _)| *kind).collect();
    assert_eq!(kinds, vec![StreamKind::Stderr, StreamKind::Stdout]);
}

#[test]
fn test_input_scenario() {
    let mut input = ScriptedInput::new(["5"]);
    let (sink, code) = supervise(
        interactive_sh("printf 'Enter:<inputRequest>'; read x; echo \"got $x\""),
        &mut input,
        BlankLinePolicy::Retry,
    );

    assert_eq!(code, 0);
    assert_eq!(sink.chunks[0], (StreamKind::Stdout, "Enter:".to_string()));
    assert_eq!(sink.stdout(), "Enter:got 5\n");
    assert_eq!(input.requests(), 1);
}

#[test]
fn test_multiple_requests_in_one_burst() {
    let mut input = ScriptedInput::new(["a", "b"]);
    let (sink, _) = supervise(
        interactive_sh(
            "printf '1<inputRequest>'; read x; printf '2<inputRequest>'; read y; echo \"$x$y\"",
        ),
        &mut input,
        BlankLinePolicy::Retry,
    );

    assert_eq!(sink.stdout(), "12ab\n");
    assert_eq!(input.requests(), 2);
}

#[test]
fn test_blank_lines_retried_by_default() {
    let mut input = ScriptedInput::new(["", "x"]);
    let (sink, _) = supervise(
        interactive_sh("printf '<inputRequest>'; read v; echo \"[$v]\""),
        &mut input,
        BlankLinePolicy::Retry,
    );
    assert_eq!(sink.stdout(), "[x]\n");
}

#[test]
fn test_blank_lines_accepted_when_configured() {
    let mut input = ScriptedInput::new(["", "x"]);
    let (sink, _) = supervise(
        interactive_sh("printf '<inputRequest>'; read v; echo \"[$v]\""),
        &mut input,
        BlankLinePolicy::Accept,
    );
    assert_eq!(sink.stdout(), "[]\n");
    assert_eq!(input.remaining(), 1);
}

#[test]
fn test_signal_death_maps_to_exit_code() {
    let mut input = ScriptedInput::default();
    let (_, code) = supervise(sh("kill -9 $$"), &mut input, BlankLinePolicy::Retry);
    assert_eq!(code, 128 + 9);
}

#[test]
fn test_orphaned_grandchild_does_not_hang_finish() {
    let mut config = test_config();
    config.supervisor.join_timeout_ms = 200;
    let mut supervisor =
        ProcessSupervisor::spawn(sh("echo parent; (sleep 5; echo late) &"), &config.supervisor)
            .unwrap();
    let mut sink = CollectingSink::new();
    let mut input = ScriptedInput::default();
    let mut bridge = InputBridge::new(&mut input, BlankLinePolicy::Retry);

    let start = Instant::now();
    let status = supervisor
        .run_to_completion(&mut sink, &mut bridge, None)
        .unwrap();

    assert_eq!(status.exit_code, 0);
    assert!(start.elapsed() < Duration::from_secs(4));
    assert_eq!(sink.stdout(), "parent\n");
}

#[test]
fn test_launch_failure() {
    let config = test_config();
    let result = ProcessSupervisor::spawn(
        ckernel::CommandSpec::new("/nonexistent/program"),
        &config.supervisor,
    );
    match result {
        Err(Error::LaunchFailed { command, .. }) => assert_eq!(command, "/nonexistent/program"),
        Err(other) => panic!("unexpected error: {}", other),
        Ok(_) => panic!("launch should fail"),
    }
}
