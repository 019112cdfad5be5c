//! Interactive Input Bridge
//!
//! Obtains a line from whoever drives the execution (a human at a notebook,
//! a terminal, a test script) and forwards it, newline-terminated, to the
//! child's stdin.

use std::collections::VecDeque;
use std::io::{BufRead, Write};

use crate::config::BlankLinePolicy;
use crate::error::{Error, Result};

/// Source of interactive input lines
///
/// `read_line` may block indefinitely. Returned lines carry no trailing
/// newline; one is added before the line reaches the child.
pub trait InputProvider {
    fn read_line(&mut self) -> Result<String>;
}

impl<F> InputProvider for F
where
    F: FnMut() -> Result<String>,
{
    fn read_line(&mut self) -> Result<String> {
        self()
    }
}

/// Reads lines from the current process's stdin
#[derive(Debug, Default)]
pub struct StdinProvider;

impl InputProvider for StdinProvider {
    fn read_line(&mut self) -> Result<String> {
        read_trimmed_line(&mut std::io::stdin().lock(), "stdin")
    }
}

/// Reads lines from any buffered reader, such as the controlling terminal
pub struct ReaderProvider<R> {
    reader: R,
    name: String,
}

impl<R: BufRead> ReaderProvider<R> {
    /// `name` identifies the source in error messages
    pub fn new(reader: R, name: impl Into<String>) -> Self {
        Self {
            reader,
            name: name.into(),
        }
    }
}

impl ReaderProvider<std::io::BufReader<std::fs::File>> {
    /// Open the controlling terminal, for when stdin is already taken
    pub fn terminal() -> Result<Self> {
        let tty = std::fs::File::open("/dev/tty").map_err(|e| Error::InputUnavailable {
            reason: format!("cannot open /dev/tty: {}", e),
        })?;
        Ok(Self::new(std::io::BufReader::new(tty), "/dev/tty"))
    }
}

impl<R: BufRead> InputProvider for ReaderProvider<R> {
    fn read_line(&mut self) -> Result<String> {
        read_trimmed_line(&mut self.reader, &self.name)
    }
}

fn read_trimmed_line(reader: &mut dyn BufRead, name: &str) -> Result<String> {
    let mut line = String::new();
    let read = reader
        .read_line(&mut line)
        .map_err(|e| Error::InputUnavailable {
            reason: e.to_string(),
        })?;

    if read == 0 {
        return Err(Error::InputUnavailable {
            reason: format!("{} reached end of file", name),
        });
    }

    Ok(line.trim_end_matches(['\n', '\r']).to_string())
}

/// Hands out a fixed list of lines, then fails
#[derive(Debug, Clone, Default)]
pub struct ScriptedInput {
    lines: VecDeque<String>,
    requests: usize,
}

impl ScriptedInput {
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
            requests: 0,
        }
    }

    /// How many times a line was asked for
    pub fn requests(&self) -> usize {
        self.requests
    }

    /// Lines not consumed yet
    pub fn remaining(&self) -> usize {
        self.lines.len()
    }
}

impl InputProvider for ScriptedInput {
    fn read_line(&mut self) -> Result<String> {
        self.requests += 1;
        self.lines.pop_front().ok_or_else(|| Error::InputUnavailable {
            reason: "scripted input exhausted".to_string(),
        })
    }
}

/// Relays lines from an [`InputProvider`] to a child's stdin
pub struct InputBridge<'a> {
    provider: &'a mut dyn InputProvider,
    policy: BlankLinePolicy,
    lines_forwarded: usize,
}

impl<'a> InputBridge<'a> {
    pub fn new(provider: &'a mut dyn InputProvider, policy: BlankLinePolicy) -> Self {
        Self {
            provider,
            policy,
            lines_forwarded: 0,
        }
    }

    /// Ask the provider for one line, applying the blank-line policy
    pub fn request_line(&mut self) -> Result<String> {
        loop {
            let line = self.provider.read_line()?;
            if line.is_empty() && self.policy == BlankLinePolicy::Retry {
                debug!("Blank input line, asking again");
                continue;
            }
            return Ok(line);
        }
    }

    /// Request a line and write it, newline-terminated, to `stdin`
    ///
    /// Returns the line as entered (without the newline).
    pub fn forward_to(&mut self, stdin: &mut dyn Write) -> Result<String> {
        let line = self.request_line()?;

        let mut payload = Vec::with_capacity(line.len() + 1);
        payload.extend_from_slice(line.as_bytes());
        payload.push(b'\n');

        stdin
            .write_all(&payload)
            .and_then(|_| stdin.flush())
            .map_err(|e| Error::InputWriteFailed {
                reason: e.to_string(),
            })?;

        self.lines_forwarded += 1;
        trace!("Forwarded {} bytes of input", payload.len());
        Ok(line)
    }

    /// Number of lines written so far
    pub fn lines_forwarded(&self) -> usize {
        self.lines_forwarded
    }

    pub fn policy(&self) -> BlankLinePolicy {
        self.policy
    }
}
