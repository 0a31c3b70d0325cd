//! A single worker: drives one (possibly shared) connection at a configured
//! rate, emitting a `LoadEvent` per send attempt.

use crate::connection::Connection;
use crate::error::EngineError;
use crate::events::LoadEvent;
use crate::ids::RequestIdSource;
use crate::payload::PayloadGenerator;
use crossbeam::channel::{Receiver, Sender};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Configuration for a single worker. Shared handles only; a worker owns no
/// resource of its own beyond this struct.
pub struct WorkerOptions {
    pub connection: Option<Arc<Connection>>,
    pub request_id_source: Arc<RequestIdSource>,
    pub payload_generator: Arc<dyn PayloadGenerator>,
    pub requests_per_second: f64,
    pub max_duration: Duration,
    pub stop: Receiver<()>,
    pub load_events: Sender<LoadEvent>,
}

pub struct Worker {
    options: WorkerOptions,
}

impl Worker {
    pub fn new(options: WorkerOptions) -> Worker {
        Worker { options }
    }

    /// Runs the worker's loop to completion. Intended to be called on a
    /// dedicated thread; blocks the calling thread until termination.
    pub fn run(self) {
        let options = self.options;
        let tick = if options.requests_per_second > 0.0 {
            Some(Duration::from_secs_f64(1.0 / options.requests_per_second))
        } else {
            None
        };
        let deadline = Instant::now() + options.max_duration;

        loop {
            if should_stop(&options.stop) {
                return;
            }
            if Instant::now() >= deadline {
                return;
            }

            if let Some(period) = tick {
                if !sleep_or_stop(period, &options.stop) {
                    return;
                }
            }

            let request_id = options.request_id_source.next();

            let connection = match &options.connection {
                Some(connection) => connection,
                None => {
                    let event =
                        LoadEvent::failure(-1, request_id, EngineError::NoConnection);
                    if options.load_events.send(event).is_err() {
                        return;
                    }
                    if tick.is_none() {
                        // Unthrottled null-connection worker: emit once and
                        // exit rather than spin against a dead slot.
                        return;
                    }
                    continue;
                }
            };

            let payload = options.payload_generator.generate(request_id);
            let event = match connection.write_once(&payload) {
                Ok(written) if written == payload.len() => LoadEvent::success(
                    connection.id as i64,
                    request_id,
                    payload.len() as i64,
                ),
                Ok(_) => LoadEvent::failure(
                    connection.id as i64,
                    request_id,
                    EngineError::WriteIncomplete,
                ),
                Err(e) => LoadEvent::failure(
                    connection.id as i64,
                    request_id,
                    EngineError::WriteFailed(e.to_string()),
                ),
            };

            if options.load_events.send(event).is_err() {
                return;
            }
        }
    }
}

fn should_stop(stop: &Receiver<()>) -> bool {
    match stop.try_recv() {
        Ok(()) => true,
        Err(crossbeam::channel::TryRecvError::Disconnected) => true,
        Err(crossbeam::channel::TryRecvError::Empty) => false,
    }
}

/// Sleeps for `period`, waking early if the stop signal fires. Returns
/// `false` if the worker should terminate instead of continuing its loop.
fn sleep_or_stop(period: Duration, stop: &Receiver<()>) -> bool {
    match stop.recv_timeout(period) {
        Ok(()) => false,
        Err(crossbeam::channel::RecvTimeoutError::Disconnected) => false,
        Err(crossbeam::channel::RecvTimeoutError::Timeout) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::ConstantPayloadGenerator;
    use std::io::Read;
    use std::net::TcpListener;

    fn spawn_echo_listener() -> (TcpListener, u16) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        (listener, port)
    }

    #[test]
    fn emits_load_event_on_nil_connection_with_connection_id_minus_one() {
        let (load_tx, load_rx) = crossbeam::channel::unbounded();
        let (_stop_tx, stop_rx) = crossbeam::channel::bounded(1);

        let worker = Worker::new(WorkerOptions {
            connection: None,
            request_id_source: Arc::new(RequestIdSource::new()),
            payload_generator: Arc::new(ConstantPayloadGenerator::new(b"payload".to_vec())),
            requests_per_second: 0.0,
            max_duration: Duration::from_millis(50),
            stop: stop_rx,
            load_events: load_tx,
        });
        worker.run();

        let event = load_rx.recv().unwrap();
        assert_eq!(-1, event.connection_id);
        assert_eq!(Some(EngineError::NoConnection), event.error);
        assert!(load_rx.try_recv().is_err(), "expected exactly one event");
    }

    #[test]
    fn writes_payload_and_reports_its_length() {
        let (listener, port) = spawn_echo_listener();
        let accept_thread = std::thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut buf = [0u8; 7];
            stream.read_exact(&mut buf).unwrap();
            buf
        });

        let connection = Arc::new(
            Connection::dial(0, &format!("127.0.0.1:{port}"), Duration::from_secs(1)).unwrap(),
        );

        let (load_tx, load_rx) = crossbeam::channel::unbounded();
        let (stop_tx, stop_rx) = crossbeam::channel::bounded(1);

        let worker = Worker::new(WorkerOptions {
            connection: Some(connection),
            request_id_source: Arc::new(RequestIdSource::new()),
            payload_generator: Arc::new(ConstantPayloadGenerator::new(b"payload".to_vec())),
            requests_per_second: 0.0,
            max_duration: Duration::from_secs(10),
            stop: stop_rx,
            load_events: load_tx,
        });

        let handle = std::thread::spawn(move || worker.run());

        let event = load_rx.recv().unwrap();
        assert_eq!(None, event.error);
        assert_eq!(7, event.payload_length_bytes);

        drop(stop_tx);
        handle.join().unwrap();
        assert_eq!(b"payload", &accept_thread.join().unwrap());
    }
}
