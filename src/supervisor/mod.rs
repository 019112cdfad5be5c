//! Real-time process supervision
//!
//! A [`ProcessSupervisor`] launches one child, keeps its pipes drained
//! through background [`StreamDrainer`]s, forwards decoded output to an
//! [`OutputSink`] and answers `<inputRequest>` markers on stdout through an
//! [`InputBridge`].

pub mod input;
pub mod process;
pub mod protocol;
pub mod signals;
pub mod sink;
pub mod streams;

pub use input::{InputBridge, InputProvider, ReaderProvider, ScriptedInput, StdinProvider};
pub use process::{CycleReport, ProcessSupervisor, RunStatus, SupervisorState};
pub use protocol::{ScanStep, SentinelScanner, Utf8Decoder};
pub use signals::{exit_code_of, send_signal_to_pid, terminate_child, Signal};
pub use sink::{CollectingSink, ConsoleSink, NullSink, OutputSink};
pub use streams::{DrainStats, StreamBuffer, StreamDrainer};
