//! Output Sinks
//!
//! Destinations for text forwarded by the supervisor. Delivery is
//! append-only and ordered per channel; sinks never push back.

use std::io::Write;

use crate::models::StreamKind;

/// Receives output from the supervised child as it is produced
pub trait OutputSink {
    /// Append `text` to the `stream` channel
    fn forward(&mut self, stream: StreamKind, text: &str);
}

impl<F> OutputSink for F
where
    F: FnMut(StreamKind, &str),
{
    fn forward(&mut self, stream: StreamKind, text: &str) {
        self(stream, text)
    }
}

/// Writes to the current process's stdout and stderr, flushing each chunk
///
/// Prompts printed without a trailing newline still show up before the
/// child blocks on input.
#[derive(Debug, Default)]
pub struct ConsoleSink;

impl OutputSink for ConsoleSink {
    fn forward(&mut self, stream: StreamKind, text: &str) {
        let result = match stream {
            StreamKind::Stdout => {
                let mut out = std::io::stdout().lock();
                out.write_all(text.as_bytes()).and_then(|_| out.flush())
            }
            StreamKind::Stderr => {
                let mut err = std::io::stderr().lock();
                err.write_all(text.as_bytes()).and_then(|_| err.flush())
            }
        };

        if let Err(e) = result {
            debug!("Console {} write failed: {}", stream, e);
        }
    }
}

/// Keeps every forwarded chunk in memory, in delivery order
#[derive(Debug, Clone, Default)]
pub struct CollectingSink {
    /// Chunks in the order they were forwarded
    pub chunks: Vec<(StreamKind, String)>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Concatenated text of one channel
    pub fn text(&self, stream: StreamKind) -> String {
        self.chunks
            .iter()
            .filter(|(kind, _)| *kind == stream)
            .map(|(_, text)| text.as_str())
            .collect()
    }

    pub fn stdout(&self) -> String {
        self.text(StreamKind::Stdout)
    }

    pub fn stderr(&self) -> String {
        self.text(StreamKind::Stderr)
    }
}

impl OutputSink for CollectingSink {
    fn forward(&mut self, stream: StreamKind, text: &str) {
        self.chunks.push((stream, text.to_string()));
    }
}

/// Discards everything
#[derive(Debug, Default)]
pub struct NullSink;

impl OutputSink for NullSink {
    fn forward(&mut self, _stream: StreamKind, _text: &str) {}
}
