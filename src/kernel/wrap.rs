//! Implicit `main` for snippets
//!
//! Cells made only of statements are wrapped in a `main` function so they
//! compile as a program. Preprocessor lines at the top stay outside.

use once_cell::sync::Lazy;
use regex::Regex;

static MAIN_DEFINITION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^[ \t]*(?:static[ \t]+)?(?:int|void)\s+main\s*\(")
        .expect("main definition pattern is valid")
});

/// Whether `code` already defines `main`
///
/// Only definitions starting a line count, so mentions in comments and
/// string literals are ignored.
pub fn has_main(code: &str) -> bool {
    MAIN_DEFINITION.is_match(code)
}

/// Wrap `code` in `int main(void)` unless it already has a `main`
///
/// A `#line` directive keeps compiler diagnostics pointing at the cell's
/// own line numbers.
pub fn wrap_main(code: &str) -> String {
    if has_main(code) {
        return code.to_string();
    }

    let lines: Vec<&str> = code.lines().collect();
    let mut header_len = 0;
    let mut continued = false;
    for line in &lines {
        let trimmed = line.trim_start();
        let is_header = continued
            || trimmed.is_empty()
            || trimmed.starts_with('#')
            || trimmed.starts_with("//");
        if !is_header {
            break;
        }
        // A directive ending in a backslash continues on the next line.
        continued = trimmed.starts_with('#') || continued;
        continued = continued && line.ends_with('\\');
        header_len += 1;
    }

    let mut wrapped = String::with_capacity(code.len() + 64);
    for line in &lines[..header_len] {
        wrapped.push_str(line);
        wrapped.push('\n');
    }
    wrapped.push_str("int main(void) {\n");
    wrapped.push_str(&format!("#line {}\n", header_len + 1));
    for line in &lines[header_len..] {
        wrapped.push_str(line);
        wrapped.push('\n');
    }
    wrapped.push_str("return 0;\n}\n");
    wrapped
}
