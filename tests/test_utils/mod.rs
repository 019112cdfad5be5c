//! Test Utilities
//!
//! Shared helpers for the contract, integration and property tests. Each
//! test target includes this module with `#[path]`, so not every helper is
//! used by every target.

#![allow(dead_code, unused_macros)]


use std::path::Path;

pub use fixtures::{interactive_sh, sh, test_config, C_ECHO_DOUBLE, C_RETURN_ZERO, C_SYNTAX_ERROR};

/// Whether a C compiler is available for the compile-and-run tests
pub fn gcc_available() -> bool {
    ckernel::find_executable(Path::new("gcc")).is_some()
}

/// Skip the calling test when gcc is missing
macro_rules! require_gcc {
    () => {
        if !crate::test_utils::gcc_available() {
            eprintln!("skipping: gcc not found on PATH");
            return;
        }
    };
}
