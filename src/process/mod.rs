//! # Process Module
//!
//! Running commands and routing their output.
//!
//! - [`runner::ProcessRunner`] spawns children and emits [`runner::StreamEvent`]s
//! - [`sink::RollingLogSink`] and [`sink::ReplaceSink`] turn those events into
//!   on-screen text

pub mod runner;
pub mod sink;

pub use runner::{
    OutputTarget, ProcessId, ProcessRunner, StreamEvent, StreamKind, EVENT_CHANNEL_CAPACITY,
};
pub use sink::{ReplaceSink, RollingLogSink, HISTORY_LINES};
