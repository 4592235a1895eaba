//! # Process Runner
//!
//! Spawns commands with piped output and forwards that output to the UI
//! loop without ever blocking it.
//!
//! ## Architecture
//!
//! - Each child gets its stdin connected to `/dev/null`; commands are
//!   fire-and-forget and never interactive
//! - stdout and stderr are each read by their own tokio task, which sends
//!   every chunk as a [`StreamEvent`] over a bounded channel; a child that
//!   writes faster than the UI consumes is held back by its full pipe
//! - Chunks end on a UTF-8 character boundary; an incomplete trailing
//!   sequence waits for the next read
//! - A waiter task reports the exit status once both readers are done, or
//!   kills the child when [`ProcessRunner::shutdown`] asks it to
//! - The UI loop drains at most [`EVENT_CHANNEL_CAPACITY`] events between
//!   frames, so all state mutation happens on the loop's own thread and a
//!   frame is never starved

use std::collections::HashMap;
use std::process::Stdio;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::command::ExecSpec;
use crate::error::SpawnError;

pub type ProcessId = u64;

const READ_BUFFER_SIZE: usize = 4096;

/// Events buffered between the reader tasks and the UI loop. Also the most
/// [`ProcessRunner::drain`] returns in one call.
pub const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Where the output of a process should be shown.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum OutputTarget {
    /// The shared command-output log, tagged with the button label.
    CommandLog { label: String },
    /// A dynamic label, by index into the controller's registry.
    DynamicLabel { index: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    Stdout,
    Stderr,
}

/// Something that happened to a spawned process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// New bytes arrived on one of the output streams.
    Chunk {
        id: ProcessId,
        target: OutputTarget,
        stream: StreamKind,
        bytes: Vec<u8>,
    },
    /// An output stream reached end-of-file.
    Closed {
        id: ProcessId,
        target: OutputTarget,
        stream: StreamKind,
    },
    /// The process exited. `code` is `None` when it was killed by a signal
    /// or its status could not be collected.
    Exited {
        id: ProcessId,
        target: OutputTarget,
        code: Option<i32>,
    },
}

impl StreamEvent {
    pub fn id(&self) -> ProcessId {
        match self {
            StreamEvent::Chunk { id, .. }
            | StreamEvent::Closed { id, .. }
            | StreamEvent::Exited { id, .. } => *id,
        }
    }

    pub fn target(&self) -> &OutputTarget {
        match self {
            StreamEvent::Chunk { target, .. }
            | StreamEvent::Closed { target, .. }
            | StreamEvent::Exited { target, .. } => target,
        }
    }
}

struct RunningProcess {
    kill: oneshot::Sender<()>,
    waiter: JoinHandle<()>,
}

/// Spawns processes and collects their output events.
///
/// Must be used from within a tokio runtime.
pub struct ProcessRunner {
    events_tx: mpsc::Sender<StreamEvent>,
    events_rx: mpsc::Receiver<StreamEvent>,
    running: HashMap<ProcessId, RunningProcess>,
    next_id: ProcessId,
}

impl Default for ProcessRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessRunner {
    pub fn new() -> Self {
        let (events_tx, events_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            events_tx,
            events_rx,
            running: HashMap::new(),
            next_id: 1,
        }
    }

    /// Start `exec` and stream its output towards `target`.
    ///
    /// Every call starts a new, independent process, even when the same
    /// command is already running.
    pub fn spawn(&mut self, exec: &ExecSpec, target: OutputTarget) -> Result<ProcessId, SpawnError> {
        let mut command = build_command(exec)?;
        command
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = command.spawn().map_err(|source| SpawnError::Io {
            program: program_name(exec),
            source,
        })?;

        let id = self.next_id;
        self.next_id += 1;

        let mut readers = Vec::with_capacity(2);
        if let Some(stdout) = child.stdout.take() {
            readers.push(tokio::spawn(forward_output(
                stdout,
                id,
                target.clone(),
                StreamKind::Stdout,
                self.events_tx.clone(),
            )));
        }
        if let Some(stderr) = child.stderr.take() {
            readers.push(tokio::spawn(forward_output(
                stderr,
                id,
                target.clone(),
                StreamKind::Stderr,
                self.events_tx.clone(),
            )));
        }

        let (kill_tx, kill_rx) = oneshot::channel();
        let waiter = tokio::spawn(wait_for_exit(
            child,
            readers,
            id,
            target.clone(),
            kill_rx,
            self.events_tx.clone(),
        ));
        self.running.insert(
            id,
            RunningProcess {
                kill: kill_tx,
                waiter,
            },
        );

        tracing::info!(id, ?target, command = %exec, "spawned process");
        Ok(id)
    }

    /// Next pending event, if any, without waiting.
    pub fn try_next(&mut self) -> Option<StreamEvent> {
        let event = self.events_rx.try_recv().ok()?;
        self.observe(&event);
        Some(event)
    }

    /// Pending events, without waiting. Returns at most
    /// [`EVENT_CHANNEL_CAPACITY`] events; the rest stay queued for the next
    /// call.
    pub fn drain(&mut self) -> Vec<StreamEvent> {
        (0..EVENT_CHANNEL_CAPACITY)
            .map_while(|_| self.try_next())
            .collect()
    }

    /// Wait for the next event.
    pub async fn next_event(&mut self) -> Option<StreamEvent> {
        let event = self.events_rx.recv().await?;
        self.observe(&event);
        Some(event)
    }

    fn observe(&mut self, event: &StreamEvent) {
        if let StreamEvent::Exited { id, .. } = event {
            self.running.remove(id);
        }
    }

    /// Number of spawned processes whose exit has not been observed yet.
    pub fn running_count(&self) -> usize {
        self.running.len()
    }

    /// Kill every process still running and wait for them to be reaped.
    ///
    /// Closes the event channel first, so readers blocked on a full channel
    /// give up. No events are delivered afterwards.
    pub async fn shutdown(&mut self) {
        self.events_rx.close();
        let running: Vec<(ProcessId, RunningProcess)> = self.running.drain().collect();
        if !running.is_empty() {
            tracing::info!(count = running.len(), "terminating child processes");
        }
        for (id, process) in running {
            // The waiter may already have finished on its own.
            let _ = process.kill.send(());
            if let Err(e) = process.waiter.await {
                tracing::debug!(id, error = %e, "waiter task did not complete cleanly");
            }
        }
    }
}

/// Build the OS command for an exec spec. Strings go through the shell;
/// argument vectors are executed as-is.
fn build_command(exec: &ExecSpec) -> Result<Command, SpawnError> {
    match exec {
        ExecSpec::Shell(line) => {
            let (shell, flag) = shell();
            let mut command = Command::new(shell);
            command.arg(flag).arg(line);
            Ok(command)
        }
        ExecSpec::Args(args) => {
            let (program, rest) = args.split_first().ok_or(SpawnError::EmptyCommand)?;
            let mut command = Command::new(program);
            command.args(rest);
            Ok(command)
        }
    }
}

fn shell() -> (&'static str, &'static str) {
    if cfg!(windows) {
        ("cmd", "/C")
    } else {
        ("/bin/sh", "-c")
    }
}

fn program_name(exec: &ExecSpec) -> String {
    match exec {
        ExecSpec::Shell(_) => shell().0.to_string(),
        ExecSpec::Args(args) => args.first().cloned().unwrap_or_default(),
    }
}

async fn forward_output<R: AsyncRead + Unpin>(
    mut reader: R,
    id: ProcessId,
    target: OutputTarget,
    stream: StreamKind,
    events: mpsc::Sender<StreamEvent>,
) {
    let mut buf = [0u8; READ_BUFFER_SIZE];
    let mut pending: Vec<u8> = Vec::new();
    loop {
        let n = match reader.read(&mut buf).await {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) => {
                tracing::debug!(id, ?stream, error = %e, "output stream read failed");
                break;
            }
        };
        pending.extend_from_slice(&buf[..n]);
        let complete = complete_prefix_len(&pending);
        if complete == 0 {
            continue;
        }
        let tail = pending.split_off(complete);
        let bytes = std::mem::replace(&mut pending, tail);
        let chunk = StreamEvent::Chunk {
            id,
            target: target.clone(),
            stream,
            bytes,
        };
        if events.send(chunk).await.is_err() {
            return;
        }
    }
    if !pending.is_empty() {
        let chunk = StreamEvent::Chunk {
            id,
            target: target.clone(),
            stream,
            bytes: pending,
        };
        if events.send(chunk).await.is_err() {
            return;
        }
    }
    let _ = events.send(StreamEvent::Closed { id, target, stream }).await;
}

/// Length of the longest prefix of `bytes` that does not stop in the middle
/// of a UTF-8 sequence. Invalid bytes count as complete so they are never
/// held back.
fn complete_prefix_len(bytes: &[u8]) -> usize {
    let mut start = 0;
    loop {
        match std::str::from_utf8(&bytes[start..]) {
            Ok(_) => return bytes.len(),
            Err(e) => match e.error_len() {
                Some(invalid) => start += e.valid_up_to() + invalid,
                None => return start + e.valid_up_to(),
            },
        }
    }
}

/// Wait for the child to exit, then for its output to be fully forwarded,
/// so `Exited` is the last event of a process that ends on its own.
async fn wait_for_exit(
    mut child: Child,
    readers: Vec<JoinHandle<()>>,
    id: ProcessId,
    target: OutputTarget,
    mut kill: oneshot::Receiver<()>,
    events: mpsc::Sender<StreamEvent>,
) {
    // A dropped sender means the runner itself is gone; treat it as a kill.
    let finished = tokio::select! {
        status = child.wait() => Some(status),
        _ = &mut kill => None,
    };
    let status = match finished {
        Some(status) => {
            // Background jobs may keep the pipes open after the child is
            // gone; a kill request stops waiting for them.
            tokio::select! {
                _ = join_readers(readers) => {}
                _ = &mut kill => {}
            }
            status
        }
        None => {
            if let Err(e) = child.start_kill() {
                tracing::debug!(id, error = %e, "failed to kill child");
            }
            child.wait().await
        }
    };

    let code = match status {
        Ok(status) => {
            tracing::info!(id, ?target, %status, "process exited");
            status.code()
        }
        Err(e) => {
            tracing::warn!(id, ?target, error = %e, "failed to collect exit status");
            None
        }
    };
    let _ = events.send(StreamEvent::Exited { id, target, code }).await;
}

async fn join_readers(readers: Vec<JoinHandle<()>>) {
    for reader in readers {
        if let Err(e) = reader.await {
            tracing::debug!(error = %e, "output reader task failed");
        }
    }
}
