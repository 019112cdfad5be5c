//! Integration Tests for Interactive Input
//!
//! C programs reading stdin through the force-included hooks. Skipped when
//! gcc is not installed.

#![cfg(unix)]

#[macro_use]
#[path = "../test_utils/mod.rs"]
mod test_utils;

use ckernel::kernel::{CKernel, Kernel};
use ckernel::supervisor::{CollectingSink, ScriptedInput};
use ckernel::{ExecutionResult, Outcome, StreamKind};
use test_utils::{test_config, C_ECHO_DOUBLE};

fn run_with_input(code: &str, lines: &[&str]) -> (ExecutionResult, CollectingSink, ScriptedInput) {
    let mut kernel = CKernel::new(test_config()).unwrap();
    let mut sink = CollectingSink::new();
    let mut input = ScriptedInput::new(lines.iter().copied());
    let reply = kernel.execute(code, &mut sink, &mut input).unwrap();
    kernel.shutdown().unwrap();
    (reply.result.unwrap(), sink, input)
}

#[test]
fn test_scanf_prompt_and_answer() {
    require_gcc!();
    let (result, sink, input) = run_with_input(C_ECHO_DOUBLE, &["5"]);

    assert!(result.succeeded(), "stderr: {}", result.stderr);
    assert_eq!(sink.chunks[0], (StreamKind::Stdout, "Enter:".to_string()));
    assert_eq!(result.stdout, "Enter:double=10\n");
    assert_eq!(input.requests(), 1);
}

#[test]
fn test_getchar_and_fgets() {
    require_gcc!();
    let code = r#"#include <stdio.h>
#include <string.h>
int main(void) {
    char line[64];
    int c = getchar();
    while (getchar() != '\n') {}
    if (!fgets(line, sizeof line, stdin)) {
        return 4;
    }
    line[strcspn(line, "\n")] = '\0';
    printf("%c|%s\n", c, line);
    return 0;
}
"#;
    // Every call announces itself, including the getchar that only
    // consumes the buffered newline.
    let (result, _, input) = run_with_input(code, &["x", "hello world"]);

    assert!(result.succeeded(), "stderr: {}", result.stderr);
    assert_eq!(result.stdout, "x|hello world\n");
    assert!(!result.stdout.contains("<inputRequest>"));
    assert_eq!(input.remaining(), 0);
}

#[test]
fn test_missing_input_gives_eof() {
    require_gcc!();
    let (result, _, _) = run_with_input(C_ECHO_DOUBLE, &[]);

    assert_eq!(result.outcome, Outcome::RuntimeFailed);
    assert_eq!(result.exit_code, Some(3));
    assert_eq!(result.stdout, "Enter:");
}

#[test]
fn test_hooks_disabled_reads_without_request() {
    require_gcc!();
    let mut config = test_config();
    config.compiler.input_hooks = false;
    config.supervisor.timeout_ms = Some(500);
    let mut kernel = CKernel::new(config).unwrap();
    let mut sink = CollectingSink::new();
    let mut input = ScriptedInput::new(["7"]);

    let reply = kernel.execute(C_ECHO_DOUBLE, &mut sink, &mut input).unwrap();
    let result = reply.result.unwrap();

    // Without the hooks nobody asks for input and scanf blocks until the deadline.
    assert_eq!(input.requests(), 0);
    assert_eq!(result.outcome, Outcome::TimedOut);
}
