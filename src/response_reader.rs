//! Per-connection response reading.

use crate::connection::{read_full, Connection};
use crate::error::EngineError;
use crate::events::ResponseEvent;
use crossbeam::channel::{Receiver, Sender};
use std::io;
use std::net::TcpStream;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Shared, lock-free progress counters. The orchestrator polls these to
/// decide whether a response-count goal has been reached; the reader
/// threads are the only writers.
#[derive(Default)]
pub struct ResponseCounters {
    total_read: AtomicU64,
    total_successful: AtomicU64,
}

impl ResponseCounters {
    pub fn new() -> ResponseCounters {
        ResponseCounters::default()
    }

    pub fn total_read(&self) -> u64 {
        self.total_read.load(Ordering::Relaxed)
    }

    pub fn total_successful(&self) -> u64 {
        self.total_successful.load(Ordering::Relaxed)
    }
}

/// Configuration shared by every `ResponseReader` in a run.
#[derive(Clone, Copy)]
pub struct ResponseReaderConfig {
    pub response_payload_size_bytes: usize,
    /// `None` means no read deadline.
    pub read_deadline: Option<Duration>,
}

/// Reads fixed-size framed responses off one connection in a tight loop
/// until the connection is closed or the stop signal fires.
pub struct ResponseReader {
    config: ResponseReaderConfig,
    counters: Arc<ResponseCounters>,
    events: Sender<ResponseEvent>,
    stop: Receiver<()>,
}

impl ResponseReader {
    pub fn new(
        config: ResponseReaderConfig,
        counters: Arc<ResponseCounters>,
        events: Sender<ResponseEvent>,
        stop: Receiver<()>,
    ) -> ResponseReader {
        ResponseReader {
            config,
            counters,
            events,
            stop,
        }
    }

    /// Runs the read loop against `connection` to completion. Intended to be
    /// called on a dedicated thread, one per successfully opened connection.
    pub fn run(self, connection: Arc<Connection>) {
        let mut stream = match connection.try_clone_for_reading() {
            Ok(stream) => stream,
            Err(_) => return,
        };

        loop {
            if should_stop(&self.stop) {
                return;
            }

            let event = self.read_one(&mut stream);
            let is_success = event.error.is_none();
            self.counters.total_read.fetch_add(1, Ordering::Relaxed);
            if is_success {
                self.counters
                    .total_successful
                    .fetch_add(1, Ordering::Relaxed);
            }

            if self.events.send(event).is_err() {
                return;
            }

            if !is_success && connection_is_gone(&stream) {
                return;
            }
        }
    }

    fn read_one(&self, stream: &mut TcpStream) -> ResponseEvent {
        if let Some(deadline) = self.config.read_deadline {
            let _ = stream.set_read_timeout(Some(deadline));
        }

        let mut buf = vec![0u8; self.config.response_payload_size_bytes];
        match read_full(stream, &mut buf) {
            Ok(()) => ResponseEvent::success(buf.len() as i64),
            Err(e) => ResponseEvent::failure(classify_read_error(&e)),
        }
    }
}

/// Spawns a reader thread for `connection`, named so it shows up clearly in
/// a thread dump. One such thread exists per successfully opened connection.
pub fn spawn_reader(
    config: ResponseReaderConfig,
    counters: Arc<ResponseCounters>,
    events: Sender<ResponseEvent>,
    stop: Receiver<()>,
    connection: Arc<Connection>,
) -> io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name(format!("blast-reader-{}", connection.id))
        .spawn(move || {
            let reader = ResponseReader::new(config, counters, events, stop);
            reader.run(connection);
        })
}

fn should_stop(stop: &Receiver<()>) -> bool {
    match stop.try_recv() {
        Ok(()) => true,
        Err(crossbeam::channel::TryRecvError::Disconnected) => true,
        Err(crossbeam::channel::TryRecvError::Empty) => false,
    }
}

fn classify_read_error(error: &io::Error) -> EngineError {
    match error.kind() {
        io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut => EngineError::DeadlineExceeded,
        io::ErrorKind::UnexpectedEof => EngineError::ShortRead,
        _ => EngineError::ReadFailed(error.to_string()),
    }
}

/// Best-effort check for whether the peer has gone away entirely, to avoid
/// a tight error loop once the connection has been shut down by the group.
fn connection_is_gone(stream: &TcpStream) -> bool {
    stream.peer_addr().is_err()
}
