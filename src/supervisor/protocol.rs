//! Stdout Input-Request Protocol
//!
//! The child announces that it is about to read stdin by printing a sentinel
//! token inline on stdout. [`SentinelScanner`] separates user-visible output
//! from those control events, and [`Utf8Decoder`] turns the byte stream into
//! text without splitting multi-byte characters across cycles.

/// Result of one scanning step over the pending stdout bytes
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanStep {
    /// Bytes to forward to the output sink
    pub output: Vec<u8>,
    /// A sentinel was consumed right after `output`
    pub input_requested: bool,
}

/// Splits stdout bytes at input-request sentinels
///
/// Bytes after a sentinel stay pending for the next step, so each sentinel
/// triggers exactly one request. A trailing partial sentinel is held back
/// until more bytes arrive, [`release_partial`](Self::release_partial) is
/// called or the stream ends.
#[derive(Debug, Clone)]
pub struct SentinelScanner {
    sentinel: Vec<u8>,
    pending: Vec<u8>,
}

impl SentinelScanner {
    /// Create a scanner for `sentinel`
    pub fn new(sentinel: &str) -> Self {
        Self {
            sentinel: sentinel.as_bytes().to_vec(),
            pending: Vec::new(),
        }
    }

    /// The token this scanner looks for
    pub fn sentinel(&self) -> &[u8] {
        &self.sentinel
    }

    /// Queue freshly drained bytes behind whatever is still pending
    pub fn push(&mut self, bytes: &[u8]) {
        self.pending.extend_from_slice(bytes);
    }

    /// Whether bytes are waiting for a later step
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Release output up to the first sentinel, or all safe output if none
    pub fn step(&mut self) -> ScanStep {
        if let Some(pos) = find(&self.pending, &self.sentinel) {
            let output = self.pending[..pos].to_vec();
            self.pending.drain(..pos + self.sentinel.len());
            return ScanStep {
                output,
                input_requested: true,
            };
        }

        let held = partial_suffix_len(&self.pending, &self.sentinel);
        let cut = self.pending.len() - held;
        ScanStep {
            output: self.pending.drain(..cut).collect(),
            input_requested: false,
        }
    }

    /// Give up on a held-back partial sentinel and return it as output
    ///
    /// Returns nothing while a complete sentinel is still pending.
    pub fn release_partial(&mut self) -> Vec<u8> {
        if find(&self.pending, &self.sentinel).is_some() {
            return Vec::new();
        }
        std::mem::take(&mut self.pending)
    }

    /// Flush everything at end of stream
    ///
    /// Remaining sentinels are stripped without raising requests since
    /// nobody is left to read the answer. Returns the output and the number
    /// of sentinels dropped.
    pub fn finish(&mut self) -> (Vec<u8>, usize) {
        let mut output = Vec::with_capacity(self.pending.len());
        let mut stripped = 0;

        loop {
            let step = self.step();
            output.extend_from_slice(&step.output);
            if step.input_requested {
                stripped += 1;
            } else {
                break;
            }
        }

        // Whatever remains is a partial sentinel that never completed.
        output.append(&mut self.pending);
        (output, stripped)
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// Length of the longest proper sentinel prefix that ends `bytes`
fn partial_suffix_len(bytes: &[u8], sentinel: &[u8]) -> usize {
    let max = sentinel.len().saturating_sub(1).min(bytes.len());
    (1..=max)
        .rev()
        .find(|&len| bytes.ends_with(&sentinel[..len]))
        .unwrap_or(0)
}

/// Incremental UTF-8 decoder
///
/// Invalid sequences are replaced with U+FFFD; an incomplete sequence at the
/// end of a chunk is carried into the next call.
#[derive(Debug, Clone, Default)]
pub struct Utf8Decoder {
    carry: Vec<u8>,
}

impl Utf8Decoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode `bytes`, holding back a trailing partial character
    pub fn decode(&mut self, bytes: &[u8]) -> String {
        self.carry.extend_from_slice(bytes);
        let cut = self.carry.len() - incomplete_tail_len(&self.carry);
        let text = String::from_utf8_lossy(&self.carry[..cut]).into_owned();
        self.carry.drain(..cut);
        text
    }

    /// Decode whatever is left, lossily
    pub fn finish(&mut self) -> String {
        let text = String::from_utf8_lossy(&self.carry).into_owned();
        self.carry.clear();
        text
    }
}

fn incomplete_tail_len(bytes: &[u8]) -> usize {
    for i in 1..=bytes.len().min(3) {
        let b = bytes[bytes.len() - i];
        if b & 0xC0 == 0x80 {
            continue;
        }
        let needed = match b {
            0xF0..=0xF7 => 4,
            0xE0..=0xEF => 3,
            0xC0..=0xDF => 2,
            _ => 1,
        };
        return if needed > i { i } else { 0 };
    }
    0
}
