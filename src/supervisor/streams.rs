//! Child Output Streams
//!
//! Bridges a blocking child pipe to the supervision loop: a reader thread
//! pulls fixed-size chunks off the pipe and queues them in a
//! [`StreamBuffer`], which the supervisor drains without ever blocking.

use std::io::{ErrorKind, Read};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

use crate::models::StreamKind;

/// Ordered queue of byte chunks produced by one drainer
///
/// Single producer (the reader thread), single consumer (the supervisor).
pub struct StreamBuffer {
    rx: UnboundedReceiver<Vec<u8>>,
}

impl StreamBuffer {
    /// Create a buffer and the sender its producer writes to
    pub fn channel() -> (UnboundedSender<Vec<u8>>, Self) {
        let (tx, rx) = unbounded_channel::<Vec<u8>>();
        (tx, Self { rx })
    }

    /// Remove and concatenate every queued chunk, in order
    ///
    /// Returns an empty vector when nothing is queued; never waits.
    pub fn drain_all(&mut self) -> Vec<u8> {
        let mut drained = Vec::new();
        while let Ok(chunk) = self.rx.try_recv() {
            drained.extend_from_slice(&chunk);
        }
        drained
    }

    /// Whether the producer is gone and nothing is left to drain
    pub fn is_exhausted(&self) -> bool {
        self.rx.is_closed() && self.rx.is_empty()
    }
}

/// Read statistics reported by a drainer thread when it stops
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DrainStats {
    /// Total bytes read
    pub bytes_read: u64,
    /// Number of non-empty reads
    pub read_operations: u64,
    /// Whether the loop stopped on a read error instead of EOF
    pub ended_on_error: bool,
}

impl DrainStats {
    /// Average bytes per read
    pub fn read_throughput(&self) -> f64 {
        if self.read_operations == 0 {
            0.0
        } else {
            self.bytes_read as f64 / self.read_operations as f64
        }
    }
}

/// Background reader for one child output stream
pub struct StreamDrainer {
    kind: StreamKind,
    buffer: StreamBuffer,
    handle: Option<JoinHandle<DrainStats>>,
    stats: Option<DrainStats>,
}

impl StreamDrainer {
    /// Start reading `reader` in chunks of at most `chunk_size` bytes
    pub fn start<R>(kind: StreamKind, reader: R, chunk_size: usize) -> Self
    where
        R: Read + Send + 'static,
    {
        let (tx, buffer) = StreamBuffer::channel();
        let handle = thread::Builder::new()
            .name(format!("ckernel-{}", kind))
            .spawn(move || read_loop(kind, reader, chunk_size.max(1), tx));

        let handle = match handle {
            Ok(handle) => Some(handle),
            Err(e) => {
                // No thread means no data; the buffer reads as closed.
                error!("Failed to spawn {} drainer thread: {}", kind, e);
                None
            }
        };

        Self {
            kind,
            buffer,
            handle,
            stats: None,
        }
    }

    /// Which stream this drainer reads
    pub fn kind(&self) -> StreamKind {
        self.kind
    }

    /// Remove and return everything read so far
    pub fn drain_all(&mut self) -> Vec<u8> {
        self.buffer.drain_all()
    }

    /// Whether the read loop has stopped
    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map_or(true, |h| h.is_finished())
    }

    /// Wait for the read loop to observe end-of-stream
    ///
    /// Only call this once the child has terminated. Returns `false` if the
    /// loop is still running after `timeout`, which happens when a
    /// grandchild inherited the pipe; the thread is then left detached.
    pub fn join(&mut self, timeout: Duration) -> bool {
        let Some(handle) = self.handle.take() else {
            return true;
        };

        let deadline = Instant::now() + timeout;
        while !handle.is_finished() {
            if Instant::now() >= deadline {
                warn!(
                    "{} drainer still open after {:?}, detaching it",
                    self.kind, timeout
                );
                return false;
            }
            thread::sleep(Duration::from_millis(1));
        }

        match handle.join() {
            Ok(stats) => {
                debug!(
                    "{} drainer joined: {} bytes in {} reads",
                    self.kind, stats.bytes_read, stats.read_operations
                );
                self.stats = Some(stats);
            }
            Err(_) => error!("{} drainer thread panicked", self.kind),
        }
        true
    }

    /// Statistics of a joined drainer
    pub fn stats(&self) -> Option<&DrainStats> {
        self.stats.as_ref()
    }
}

fn read_loop<R: Read>(
    kind: StreamKind,
    mut reader: R,
    chunk_size: usize,
    tx: UnboundedSender<Vec<u8>>,
) -> DrainStats {
    let mut buf = vec![0u8; chunk_size];
    let mut stats = DrainStats::default();

    loop {
        match reader.read(&mut buf) {
            Ok(0) => {
                trace!("{} read EOF", kind);
                break;
            }
            Ok(n) => {
                stats.bytes_read += n as u64;
                stats.read_operations += 1;

                if tx.send(buf[..n].to_vec()).is_err() {
                    debug!("{} buffer dropped, stopping drainer", kind);
                    break;
                }
            }
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => {
                // Indistinguishable from EOF for the consumer.
                debug!("{} read error ({}): {}", kind, e.kind(), e);
                stats.ended_on_error = true;
                break;
            }
        }
    }

    stats
}
