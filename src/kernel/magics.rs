//! `//%` magic comments
//!
//! A cell can tune its own build with lines such as
//! `//%cflags: -O2 -Wall`, `//%ldflags: -lpthread` or `//%args: one "two words"`.

use once_cell::sync::Lazy;
use regex::Regex;

static MAGIC_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*//%\s*([A-Za-z_]+)\s*:(.*)$").expect("magic line pattern is valid")
});

/// Per-cell build and run settings
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Magics {
    /// Extra compiler flags
    pub cflags: Vec<String>,
    /// Extra linker flags
    pub ldflags: Vec<String>,
    /// Command-line arguments for the executable
    pub args: Vec<String>,
}

impl Magics {
    /// Collect every magic line of `code`
    ///
    /// Repeated keys accumulate. Unknown keys are ignored.
    pub fn parse(code: &str) -> Self {
        let mut magics = Self::default();

        for line in code.lines() {
            let Some(caps) = MAGIC_LINE.captures(line) else {
                continue;
            };
            let key = caps[1].to_ascii_lowercase();
            let words = split_words(&caps[2]);

            match key.as_str() {
                "cflags" => magics.cflags.extend(words),
                "ldflags" => magics.ldflags.extend(words),
                "args" => magics.args.extend(words),
                other => warn!("Ignoring unknown magic '{}'", other),
            }
        }

        magics
    }

    /// The `-std=` flag among the cflags, if the cell sets one
    pub fn standard_override(&self) -> Option<&str> {
        self.cflags
            .iter()
            .rev()
            .find(|flag| flag.starts_with("-std="))
            .map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.cflags.is_empty() && self.ldflags.is_empty() && self.args.is_empty()
    }
}

/// Split `input` into words the way a POSIX shell would
///
/// Single quotes are literal, double quotes allow `\"` and `\\`, and a
/// backslash outside quotes escapes the next character. An unterminated
/// quote runs to the end of the input.
pub fn split_words(input: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut chars = input.chars();

    while let Some(c) = chars.next() {
        match c {
            c if c.is_whitespace() => {
                if in_word {
                    words.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            '\'' => {
                in_word = true;
                for q in chars.by_ref() {
                    if q == '\'' {
                        break;
                    }
                    current.push(q);
                }
            }
            '"' => {
                in_word = true;
                while let Some(q) = chars.next() {
                    match q {
                        '"' => break,
                        '\\' => match chars.next() {
                            Some(escaped @ ('"' | '\\')) => current.push(escaped),
                            Some(other) => {
                                current.push('\\');
                                current.push(other);
                            }
                            None => current.push('\\'),
                        },
                        _ => current.push(q),
                    }
                }
            }
            '\\' => {
                in_word = true;
                if let Some(escaped) = chars.next() {
                    current.push(escaped);
                }
            }
            _ => {
                in_word = true;
                current.push(c);
            }
        }
    }

    if in_word {
        words.push(current);
    }
    words
}
