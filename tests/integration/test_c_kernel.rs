//! Integration Tests for the C Kernel
//!
//! Real compile-and-run round trips. Skipped when gcc is not installed.

#![cfg(unix)]

#[macro_use]
#[path = "../test_utils/mod.rs"]
mod test_utils;

use ckernel::kernel::{CKernel, Kernel, ReplyStatus};
use ckernel::supervisor::{CollectingSink, ScriptedInput};
use ckernel::Outcome;
use test_utils::{test_config, C_RETURN_ZERO, C_SYNTAX_ERROR};

fn run_cell(kernel: &mut CKernel, code: &str) -> (ckernel::ExecutionReply, CollectingSink) {
    let mut sink = CollectingSink::new();
    let mut input = ScriptedInput::default();
    let reply = kernel.execute(code, &mut sink, &mut input).unwrap();
    (reply, sink)
}

#[test]
fn test_return_zero_has_no_output() {
    require_gcc!();
    let mut kernel = CKernel::new(test_config()).unwrap();
    let (reply, sink) = run_cell(&mut kernel, C_RETURN_ZERO);

    assert_eq!(reply.status, ReplyStatus::Ok);
    let result = reply.result.unwrap();
    assert_eq!(result.outcome, Outcome::Success);
    assert_eq!(result.exit_code, Some(0));
    assert!(result.stdout.is_empty());
    assert!(result.stderr.is_empty());
    assert!(sink.chunks.is_empty());
}

#[test]
fn test_syntax_error_is_not_run() {
    require_gcc!();
    let mut kernel = CKernel::new(test_config()).unwrap();
    let (reply, _) = run_cell(&mut kernel, C_SYNTAX_ERROR);

    let result = reply.result.unwrap();
    assert_eq!(result.outcome, Outcome::CompileFailed);
    assert!(result.stderr.contains("error"));
    assert!(result.stderr.contains("the executable will not be executed"));
    assert!(result.stdout.is_empty());
}

#[test]
fn test_runtime_exit_code_reported() {
    require_gcc!();
    let mut kernel = CKernel::new(test_config()).unwrap();
    let (reply, _) = run_cell(&mut kernel, "int main(void) { return 2; }");

    let result = reply.result.unwrap();
    assert_eq!(result.outcome, Outcome::RuntimeFailed);
    assert_eq!(result.exit_code, Some(2));
    assert!(result.stderr.ends_with("executable exited with code 2\n"));
}

#[test]
fn test_snippet_without_main_is_wrapped() {
    require_gcc!();
    let mut kernel = CKernel::new(test_config()).unwrap();
    let (reply, _) = run_cell(
        &mut kernel,
        "#include <stdio.h>\nint a = 20, b = 22;\nprintf(\"%d\\n\", a + b);",
    );

    let result = reply.result.unwrap();
    assert!(result.succeeded(), "stderr: {}", result.stderr);
    assert_eq!(result.stdout, "42\n");
}

#[test]
fn test_magics_reach_compiler_and_program() {
    require_gcc!();
    let mut kernel = CKernel::new(test_config()).unwrap();
    let code = r#"//%cflags: -DGREETING="\"hi\""
//%ldflags: -lm
//%args: "two words" 3
#include <math.h>
#include <stdio.h>
int main(int argc, char **argv) {
    printf("%s %d %s %.0f\n", GREETING, argc, argv[1], sqrt(16.0));
    return 0;
}
"#;
    let (reply, _) = run_cell(&mut kernel, code);

    let result = reply.result.unwrap();
    assert!(result.succeeded(), "stderr: {}", result.stderr);
    assert_eq!(result.stdout, "hi 3 two words 4\n");
}

#[test]
fn test_stderr_and_stdout_separated() {
    require_gcc!();
    let mut kernel = CKernel::new(test_config()).unwrap();
    let (reply, sink) = run_cell(
        &mut kernel,
        "#include <stdio.h>\nint main(void) { fprintf(stderr, \"oops\\n\"); puts(\"fine\"); return 0; }",
    );

    let result = reply.result.unwrap();
    assert_eq!(result.stdout, "fine\n");
    assert_eq!(result.stderr, "oops\n");
    assert_eq!(sink.stdout(), "fine\n");
}

#[test]
fn test_execution_count_and_shutdown() {
    require_gcc!();
    let mut kernel = CKernel::new(test_config()).unwrap();
    let (first, _) = run_cell(&mut kernel, C_RETURN_ZERO);
    let (blank, _) = run_cell(&mut kernel, "\n");
    let (second, _) = run_cell(&mut kernel, C_RETURN_ZERO);

    assert_eq!(first.execution_count, 1);
    assert_eq!(blank.execution_count, 1);
    assert_eq!(second.execution_count, 2);
    assert_ne!(first.execution_id, second.execution_id);

    let header = kernel.hooks_header_path().unwrap().to_path_buf();
    kernel.shutdown().unwrap();
    assert!(!header.exists());
}
