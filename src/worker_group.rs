//! Owns the connection pool, instantiates and multiplexes workers onto
//! connections, and aggregates their lifecycle.

use crate::connection::Connection;
use crate::events::LoadEvent;
use crate::ids::RequestIdSource;
use crate::payload::PayloadGenerator;
use crate::response_reader::{self, ResponseCounters, ResponseReaderConfig};
use crate::worker::{Worker, WorkerOptions};
use crossbeam::channel::{Receiver, Sender};
use log::warn;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Fixed at construction, never mutated afterward.
pub struct GroupOptions {
    pub concurrency: usize,
    pub connections: usize,
    pub target_address: String,
    pub dial_timeout: Duration,
    pub requests_per_second: f64,
    pub max_duration: Duration,
    pub payload_generator: Arc<dyn PayloadGenerator>,
}

impl GroupOptions {
    fn workers_per_connection(&self) -> usize {
        self.concurrency / self.connections
    }

    /// Capacity for the LoadEvent channel: the expected total load across
    /// the whole run, with a floor so an unthrottled (rps = 0) run still
    /// gets a reasonably sized buffer rather than one slot per worker.
    fn expected_load_capacity(&self) -> usize {
        let rps = if self.requests_per_second > 0.0 {
            self.requests_per_second
        } else {
            1000.0
        };
        let expected =
            (rps * self.concurrency as f64 * self.max_duration.as_secs_f64()).ceil() as usize;
        expected.max(self.concurrency).min(10_000_000)
    }
}

/// Bundles what a `WorkerGroup` needs to also spawn a `ResponseReader` per
/// opened connection. Constructed by the orchestrator, which owns the
/// response event channel the reporter drains.
#[derive(Clone)]
pub struct ResponseReading {
    pub config: ResponseReaderConfig,
    pub counters: Arc<ResponseCounters>,
    pub events: Sender<crate::events::ResponseEvent>,
}

pub struct WorkerGroup {
    options: GroupOptions,
    response_reading: Mutex<Option<ResponseReading>>,
    request_id_source: Arc<RequestIdSource>,
    stop_tx: Mutex<Option<Sender<()>>>,
    stop_rx: Receiver<()>,
    done_rx: Mutex<Option<Receiver<()>>>,
    connections: Mutex<Vec<Arc<Connection>>>,
    closed: AtomicBool,
}

impl WorkerGroup {
    pub fn new(options: GroupOptions, response_reading: Option<ResponseReading>) -> Arc<WorkerGroup> {
        let (stop_tx, stop_rx) = crossbeam::channel::unbounded();
        Arc::new(WorkerGroup {
            options,
            response_reading: Mutex::new(response_reading),
            request_id_source: Arc::new(RequestIdSource::new()),
            stop_tx: Mutex::new(Some(stop_tx)),
            stop_rx,
            done_rx: Mutex::new(None),
            connections: Mutex::new(Vec::new()),
            closed: AtomicBool::new(false),
        })
    }

    /// Opens connections, spawns readers and workers, and returns the
    /// LoadEvent channel. Begins execution on a dedicated supervisor thread;
    /// safe to call once per group.
    pub fn run(self: &Arc<Self>) -> Receiver<LoadEvent> {
        let capacity = self.options.expected_load_capacity();
        let (load_tx, load_rx) = crossbeam::channel::bounded(capacity);
        let (done_tx, done_rx) = crossbeam::channel::bounded(1);
        *self.done_rx.lock() = Some(done_rx);

        let group = self.clone();
        thread::Builder::new()
            .name("blast-group".to_string())
            .spawn(move || {
                group.run_workers(load_tx);
                let _ = done_tx.send(());
            })
            .expect("failed to spawn worker group supervisor thread");

        load_rx
    }

    /// Fires when all workers have terminated. Safe to call after `run`.
    pub fn done_signal(&self) -> Receiver<()> {
        self.done_rx
            .lock()
            .clone()
            .expect("done_signal called before run")
    }

    /// Broadcasts stop to all workers and readers, closes every owned
    /// connection, and drops the group's own retained `ResponseEvent`
    /// sender. Safe to call more than once; only the first call acts.
    pub fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        // Dropping the sender closes the channel, which every worker and
        // reader observes as a broadcast disconnect on their stop receiver.
        self.stop_tx.lock().take();
        for connection in self.connections.lock().iter() {
            connection.close();
        }
        // The per-reader sender clones drop when their reader thread exits,
        // but this group-owned sender outlives every reader; without
        // dropping it here the ResponseEvent channel never disconnects and
        // the reporter's response-draining thread blocks forever.
        self.response_reading.lock().take();
    }

    fn run_workers(&self, load_events: Sender<LoadEvent>) {
        let workers_per_connection = self.options.workers_per_connection();
        let mut reader_handles = Vec::new();
        let mut worker_handles: Vec<JoinHandle<()>> = Vec::new();

        let mut connection_for_slot: Option<Arc<Connection>> = None;
        let mut next_connection_id = 0usize;

        for index in 0..self.options.concurrency {
            if index % workers_per_connection == 0 {
                connection_for_slot = self.dial_next_connection(next_connection_id);
                if connection_for_slot.is_some() {
                    if let Some(reader) = self.spawn_reader_for(connection_for_slot.as_ref().unwrap())
                    {
                        reader_handles.push(reader);
                    }
                    next_connection_id += 1;
                }
            }

            let worker = Worker::new(WorkerOptions {
                connection: connection_for_slot.clone(),
                request_id_source: self.request_id_source.clone(),
                payload_generator: self.options.payload_generator.clone(),
                requests_per_second: self.options.requests_per_second,
                max_duration: self.options.max_duration,
                stop: self.stop_rx.clone(),
                load_events: load_events.clone(),
            });

            worker_handles.push(
                thread::Builder::new()
                    .name(format!("blast-worker-{index}"))
                    .spawn(move || worker.run())
                    .expect("failed to spawn worker thread"),
            );
        }

        for handle in worker_handles {
            let _ = handle.join();
        }
        // Readers keep running past worker completion (they stop only on
        // the stop signal or connection close); the group does not wait for
        // them here, only on `close`.
        drop(reader_handles);
    }

    fn dial_next_connection(&self, connection_id: usize) -> Option<Arc<Connection>> {
        match Connection::dial(
            connection_id,
            &self.options.target_address,
            self.options.dial_timeout,
        ) {
            Ok(connection) => {
                let connection = Arc::new(connection);
                self.connections.lock().push(connection.clone());
                Some(connection)
            }
            Err(e) => {
                warn!(
                    "[WorkerGroup] failed to dial {}: {}",
                    self.options.target_address, e
                );
                None
            }
        }
    }

    fn spawn_reader_for(&self, connection: &Arc<Connection>) -> Option<JoinHandle<()>> {
        let reading = self.response_reading.lock().clone()?;
        response_reader::spawn_reader(
            reading.config,
            reading.counters,
            reading.events,
            self.stop_rx.clone(),
            connection.clone(),
        )
        .ok()
    }
}
