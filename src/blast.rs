//! The orchestrator. Wires a `WorkerGroup` and a `Reporter`, and owns the
//! three independent termination triggers: duration elapsed, response-count
//! goal reached, and external stop.

use crate::report::Reporter;
use crate::response_reader::{ResponseCounters, ResponseReaderConfig};
use crate::worker_group::{GroupOptions, ResponseReading, WorkerGroup};
use crossbeam::channel::{bounded, Receiver, Sender};
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Which counter a response-reading run watches to decide it has seen
/// enough responses.
#[derive(Clone, Copy, Debug)]
pub enum ResponseGoal {
    TotalResponses(u64),
    SuccessfulResponses(u64),
}

/// Options for reading responses from the target, mirroring the `-Rr*` CLI
/// flags.
pub struct ResponseOptions {
    pub response_payload_size_bytes: usize,
    pub read_deadline: Option<Duration>,
    pub goal: ResponseGoal,
}

/// How often the orchestrator polls response counters against the goal.
const GOAL_POLL_PERIOD: Duration = Duration::from_millis(5);

pub struct Blast {
    group: Arc<WorkerGroup>,
    reporter: Reporter,
    max_duration: Duration,
    response_counters: Option<Arc<ResponseCounters>>,
    response_goal: Option<ResponseGoal>,
    keep_connections_alive: bool,
    stop_tx: Sender<()>,
    stop_rx: Receiver<()>,
    stopped: Arc<AtomicBool>,
}

impl Blast {
    /// Builds a `Blast` that does not read responses from the target.
    pub fn without_response_reading(
        group_options: GroupOptions,
        keep_connections_alive: bool,
    ) -> Blast {
        let max_duration = group_options.max_duration;
        let group = WorkerGroup::new(group_options, None);
        let load_events = group.run();
        let reporter = Reporter::spawn(load_events, None);

        Blast::assemble(group, reporter, max_duration, None, None, keep_connections_alive)
    }

    /// Builds a `Blast` that also reads responses from the target.
    pub fn with_response_reading(
        group_options: GroupOptions,
        response_options: ResponseOptions,
        keep_connections_alive: bool,
    ) -> Blast {
        let max_duration = group_options.max_duration;
        let counters = Arc::new(ResponseCounters::new());
        let (response_tx, response_rx) = crossbeam::channel::bounded(1_000_000);

        let reading = ResponseReading {
            config: ResponseReaderConfig {
                response_payload_size_bytes: response_options.response_payload_size_bytes,
                read_deadline: response_options.read_deadline,
            },
            counters: counters.clone(),
            events: response_tx,
        };

        let group = WorkerGroup::new(group_options, Some(reading));
        let load_events = group.run();
        let reporter = Reporter::spawn(load_events, Some(response_rx));

        Blast::assemble(
            group,
            reporter,
            max_duration,
            Some(counters),
            Some(response_options.goal),
            keep_connections_alive,
        )
    }

    fn assemble(
        group: Arc<WorkerGroup>,
        reporter: Reporter,
        max_duration: Duration,
        response_counters: Option<Arc<ResponseCounters>>,
        response_goal: Option<ResponseGoal>,
        keep_connections_alive: bool,
    ) -> Blast {
        let (stop_tx, stop_rx) = bounded(1);
        Blast {
            group,
            reporter,
            max_duration,
            response_counters,
            response_goal,
            keep_connections_alive,
            stop_tx,
            stop_rx,
            stopped: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Requests termination. Idempotent: safe to call more than once, and
    /// safe to call from a signal handler on another thread.
    pub fn stop(&self) {
        if !self.stopped.swap(true, Ordering::SeqCst) {
            let _ = self.stop_tx.try_send(());
        }
    }

    /// Returns a cheaply cloneable handle whose `stop` forwards to this
    /// `Blast`, for wiring up an OS signal handler.
    pub fn stop_handle(&self) -> BlastStopHandle {
        BlastStopHandle {
            stopped: self.stopped.clone(),
            stop_tx: self.stop_tx.clone(),
        }
    }

    /// Blocks until one of the termination triggers fires, then shuts
    /// everything down in producer-before-consumer order and prints the
    /// report to `out`.
    pub fn wait_for_completion(self, out: &mut impl Write) {
        if self.keep_connections_alive {
            let _ = self.stop_rx.recv();
        } else {
            self.wait_for_duration_or_goal_or_stop();
        }

        self.group.close();
        let report = self.reporter.finish();
        let _ = writeln!(out, "{report}");
    }

    /// A single multi-way wait over the duration timer, the goal poller's
    /// tick, and the stop signal, mirroring the "one orchestrator task, one
    /// shutdown" design (see the design notes on overlapping termination
    /// paths).
    fn wait_for_duration_or_goal_or_stop(&self) {
        let deadline_rx = after(self.max_duration);
        let poll_rx = tick(GOAL_POLL_PERIOD);

        loop {
            crossbeam::channel::select! {
                recv(self.stop_rx) -> _ => return,
                recv(deadline_rx) -> _ => return,
                recv(poll_rx) -> _ => {
                    if self.response_goal.is_some() && self.response_goal_reached() {
                        return;
                    }
                }
            }
        }
    }

    fn response_goal_reached(&self) -> bool {
        let counters = match &self.response_counters {
            Some(counters) => counters,
            None => return false,
        };
        match self.response_goal {
            Some(ResponseGoal::TotalResponses(n)) => counters.total_read() >= n,
            Some(ResponseGoal::SuccessfulResponses(n)) => counters.total_successful() >= n,
            None => false,
        }
    }
}

/// A cloneable handle that can request `Blast::stop` from outside, e.g. from
/// a `ctrlc` signal handler thread.
#[derive(Clone)]
pub struct BlastStopHandle {
    stopped: Arc<AtomicBool>,
    stop_tx: Sender<()>,
}

impl BlastStopHandle {
    pub fn stop(&self) {
        if !self.stopped.swap(true, Ordering::SeqCst) {
            let _ = self.stop_tx.try_send(());
        }
    }
}

fn after(duration: Duration) -> Receiver<()> {
    let (tx, rx) = bounded(1);
    thread::spawn(move || {
        thread::sleep(duration);
        let _ = tx.send(());
    });
    rx
}

fn tick(period: Duration) -> Receiver<()> {
    let (tx, rx) = bounded(1);
    thread::spawn(move || loop {
        thread::sleep(period);
        if tx.send(()).is_err() {
            return;
        }
    });
    rx
}
