//! Concurrent draining of a subprocess's output channels.
//!
//! A process writing to both stdout and stderr can deadlock its parent: the
//! child blocks on a full diagnostic pipe while the parent blocks reading
//! the data pipe. [`StreamMultiplexer`] avoids this by giving each channel a
//! dedicated [`LineReader`] thread that continuously drains it into an
//! unbounded queue, so neither channel's backpressure can stall the other.
//!
//! The control thread owns the consuming side: it polls
//! [`LineReader::drain_available`] and [`LineReader::eof`] without ever
//! blocking on a queue, and joins every reader before its scope exits.

use std::collections::VecDeque;
use std::io::{BufRead, BufReader, Read};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, TryRecvError};
use std::sync::{mpsc, Arc};
use std::thread::JoinHandle;

use tracing::debug;

/// A dedicated reader thread draining one byte channel into a queue of
/// newline-delimited records.
///
/// The thread runs until its source reaches end-of-data or [`stop`] is
/// requested. Stopping is cooperative: a read already in flight completes
/// (and its line is still queued) before the flag is honored, so
/// cancellation latency is bounded by one read.
///
/// [`stop`]: LineReader::stop
pub struct LineReader {
    rx: Receiver<Vec<u8>>,
    pending: VecDeque<Vec<u8>>,
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
    disconnected: bool,
}

impl LineReader {
    /// Spawn a reader thread over the given byte source.
    ///
    /// The source moves into the thread; its handle is closed when the
    /// thread exits.
    pub fn spawn<R>(label: &'static str, source: R) -> Self
    where
        R: Read + Send + 'static,
    {
        let (tx, rx) = mpsc::channel();
        let stop = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&stop);

        let handle = std::thread::spawn(move || {
            let mut reader = BufReader::new(source);
            loop {
                let mut line = Vec::new();
                match reader.read_until(b'\n', &mut line) {
                    Ok(0) => break,
                    Ok(_) => {
                        // Receiver gone means nobody wants the rest.
                        if tx.send(line).is_err() {
                            break;
                        }
                    }
                    Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                    Err(e) => {
                        debug!(channel = label, error = %e, "reader stopping on read error");
                        break;
                    }
                }
                // Checked after the in-flight read completes.
                if flag.load(Ordering::Relaxed) {
                    break;
                }
            }
            debug!(channel = label, "reader finished");
        });

        Self {
            rx,
            pending: VecDeque::new(),
            stop,
            handle: Some(handle),
            disconnected: false,
        }
    }

    /// Pull everything currently queued into the pending buffer.
    fn poll_queue(&mut self) {
        loop {
            match self.rx.try_recv() {
                Ok(line) => self.pending.push_back(line),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    self.disconnected = true;
                    break;
                }
            }
        }
    }

    /// The complete lines currently available, without blocking for more.
    /// Returns an empty vec if none are ready.
    pub fn drain_available(&mut self) -> Vec<Vec<u8>> {
        self.poll_queue();
        self.pending.drain(..).collect()
    }

    /// True once the reader thread has terminated and its queue is empty.
    pub fn eof(&mut self) -> bool {
        self.poll_queue();
        self.disconnected && self.pending.is_empty()
    }

    /// Ask the reader to stop after the read currently in flight.
    pub fn stop(&self) {
        self.stop.store(true, Ordering::Relaxed);
    }

    /// Wait for the reader thread to terminate.
    pub fn join(&mut self) {
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl std::fmt::Debug for LineReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LineReader")
            .field("pending", &self.pending.len())
            .field("disconnected", &self.disconnected)
            .finish()
    }
}

/// The paired readers for one subprocess: a primary data channel and a
/// diagnostic channel.
#[derive(Debug)]
pub struct StreamMultiplexer {
    /// Reader over the process's data channel (stdout).
    pub data: LineReader,
    /// Reader over the process's diagnostic channel (stderr).
    pub diag: LineReader,
}

impl StreamMultiplexer {
    /// Spawn both reader threads.
    pub fn start<D, G>(data: D, diag: G) -> Self
    where
        D: Read + Send + 'static,
        G: Read + Send + 'static,
    {
        Self {
            data: LineReader::spawn("data", data),
            diag: LineReader::spawn("diag", diag),
        }
    }

    /// Ask both readers to stop.
    pub fn stop_all(&self) {
        self.data.stop();
        self.diag.stop();
    }

    /// True once both readers have terminated with empty queues.
    pub fn both_eof(&mut self) -> bool {
        // Evaluate both: eof() also advances each reader's queue state.
        let data_done = self.data.eof();
        let diag_done = self.diag.eof();
        data_done && diag_done
    }

    /// Join both reader threads. Every reader is joined before the
    /// extraction scope exits; no thread outlives the call that spawned it.
    pub fn join_all(&mut self) {
        self.data.join();
        self.diag.join();
    }
}
