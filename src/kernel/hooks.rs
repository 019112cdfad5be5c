//! stdin hooks
//!
//! A header force-included into every cell. It redefines the common stdin
//! readers so each one prints the input request token (and flushes stdout)
//! before blocking, which lets the supervisor know a line is wanted.

/// File name of the generated header
pub const HOOKS_HEADER_NAME: &str = "stdio_wrap.h";

/// Header text announcing reads with `sentinel`
///
/// The sentinel is written as a C string literal with octal escapes for
/// everything but letters, digits and a few plain symbols, so quotes,
/// backslashes and `??` trigraphs cannot break the header.
pub fn hooks_header(sentinel: &str) -> String {
    let sentinel = c_string_literal(sentinel);
    format!(
        r#"#ifndef CKERNEL_STDIO_WRAP_H
#define CKERNEL_STDIO_WRAP_H

#include <stdio.h>
#include <stdarg.h>

static __inline__ void ckernel_request_input(void) {{
  fputs({sentinel}, stdout);
  fflush(stdout);
}}

static __inline__ int ckernel_scanf(const char *format, ...) {{
  va_list args;
  int result;
  ckernel_request_input();
  va_start(args, format);
  result = vscanf(format, args);
  va_end(args);
  return result;
}}

static __inline__ int ckernel_getchar(void) {{
  ckernel_request_input();
  return getchar();
}}

static __inline__ char *ckernel_fgets(char *s, int size, FILE *stream) {{
  if (stream == stdin) {{
    ckernel_request_input();
  }}
  return fgets(s, size, stream);
}}

#define scanf(...) ckernel_scanf(__VA_ARGS__)
#define getchar() ckernel_getchar()
#define fgets(s, size, stream) ckernel_fgets(s, size, stream)

#endif /* CKERNEL_STDIO_WRAP_H */
"#
    )
}

/// Quote `text` as a C string literal
fn c_string_literal(text: &str) -> String {
    let mut literal = String::with_capacity(text.len() + 2);
    literal.push('"');
    for byte in text.bytes() {
        if byte.is_ascii_alphanumeric() || b"<>_-:@ ".contains(&byte) {
            literal.push(byte as char);
        } else {
            // Octal escapes stop after three digits, unlike `\x`.
            literal.push_str(&format!("\\{:03o}", byte));
        }
    }
    literal.push('"');
    literal
}
