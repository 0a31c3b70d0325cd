//! Consumes `LoadEvent`s and (optionally) `ResponseEvent`s and produces the
//! final textual summary report.

use crate::events::{LoadEvent, ResponseEvent};
use chrono::{DateTime, Local};
use crossbeam::channel::Receiver;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::thread::{self, JoinHandle};
use std::time::SystemTime;

#[derive(Default)]
struct LoadMetrics {
    total_requests: u64,
    success_count: u64,
    error_count: u64,
    error_count_by_kind: BTreeMap<&'static str, u64>,
    total_payload_length_bytes: i64,
    earliest_send_time: Option<SystemTime>,
    latest_send_time: Option<SystemTime>,
    /// Distinct connection ids seen on successful sends; its length is the
    /// number of connections that actually carried load, as opposed to the
    /// number the group was asked to open.
    connection_ids: BTreeSet<i64>,
}

#[derive(Default)]
struct ResponseMetrics {
    total_responses: u64,
    success_count: u64,
    error_count: u64,
    error_count_by_kind: BTreeMap<&'static str, u64>,
    total_payload_length_bytes: i64,
    earliest_receive_time: Option<SystemTime>,
    latest_receive_time: Option<SystemTime>,
}

/// A fully aggregated report, ready to render.
pub struct Report {
    load: LoadMetrics,
    response: Option<ResponseMetrics>,
}

impl Report {
    fn record_load_event(&mut self, event: LoadEvent) {
        self.load.total_requests += 1;
        match &event.error {
            Some(error) => {
                self.load.error_count += 1;
                *self.load.error_count_by_kind.entry(error.kind()).or_insert(0) += 1;
            }
            None => {
                self.load.success_count += 1;
                if event.connection_id >= 0 {
                    self.load.connection_ids.insert(event.connection_id);
                }
            }
        }
        self.load.total_payload_length_bytes += event.payload_length_bytes;
        update_earliest_latest(
            &mut self.load.earliest_send_time,
            &mut self.load.latest_send_time,
            event.sent_at,
        );
    }

    fn record_response_event(&mut self, event: ResponseEvent) {
        let response = self.response.get_or_insert_with(ResponseMetrics::default);
        response.total_responses += 1;
        match &event.error {
            Some(error) => {
                response.error_count += 1;
                *response
                    .error_count_by_kind
                    .entry(error.kind())
                    .or_insert(0) += 1;
            }
            None => response.success_count += 1,
        }
        response.total_payload_length_bytes += event.payload_length_bytes;
        update_earliest_latest(
            &mut response.earliest_receive_time,
            &mut response.latest_receive_time,
            event.received_at,
        );
    }
}

fn update_earliest_latest(
    earliest: &mut Option<SystemTime>,
    latest: &mut Option<SystemTime>,
    at: SystemTime,
) {
    if earliest.is_none_or_after(at) {
        *earliest = Some(at);
    }
    if latest.is_none_or_before(at) {
        *latest = Some(at);
    }
}

trait OptionTimeExt {
    fn is_none_or_after(&self, at: SystemTime) -> bool;
    fn is_none_or_before(&self, at: SystemTime) -> bool;
}

impl OptionTimeExt for Option<SystemTime> {
    fn is_none_or_after(&self, at: SystemTime) -> bool {
        match self {
            None => true,
            Some(existing) => at < *existing,
        }
    }

    fn is_none_or_before(&self, at: SystemTime) -> bool {
        match self {
            None => true,
            Some(existing) => at > *existing,
        }
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Summary:")?;
        writeln!(f, "  LoadMetrics:")?;
        writeln!(f, "    TotalConnections: {}", self.load.connection_ids.len())?;
        writeln!(f, "    TotalRequests: {}", self.load.total_requests)?;
        writeln!(f, "    SuccessCount: {}", self.load.success_count)?;
        writeln!(f, "    ErrorCount: {}", self.load.error_count)?;
        writeln!(
            f,
            "    TotalPayloadSize: {} bytes",
            self.load.total_payload_length_bytes
        )?;
        writeln!(
            f,
            "    AveragePayloadSize: {:.4} bytes",
            average(
                self.load.total_payload_length_bytes,
                self.load.total_requests
            )
        )?;
        writeln!(
            f,
            "    EarliestLoadSendTime: {}",
            format_time(self.load.earliest_send_time)
        )?;
        writeln!(
            f,
            "    LatestLoadSendTime: {}",
            format_time(self.load.latest_send_time)
        )?;
        writeln!(
            f,
            "    TimeToCompleteLoad: {}",
            format_elapsed(self.load.earliest_send_time, self.load.latest_send_time)
        )?;
        write_error_distribution(f, &self.load.error_count_by_kind)?;

        if let Some(response) = &self.response {
            writeln!(f)?;
            writeln!(f, "  ResponseMetrics:")?;
            writeln!(f, "    TotalResponses: {}", response.total_responses)?;
            writeln!(f, "    SuccessCount: {}", response.success_count)?;
            writeln!(f, "    ErrorCount: {}", response.error_count)?;
            writeln!(
                f,
                "    TotalResponsePayloadSize: {} bytes",
                response.total_payload_length_bytes
            )?;
            writeln!(
                f,
                "    AverageResponsePayloadSize: {:.4} bytes",
                average(response.total_payload_length_bytes, response.total_responses)
            )?;
            writeln!(
                f,
                "    EarliestResponseReceivedTime: {}",
                format_time(response.earliest_receive_time)
            )?;
            writeln!(
                f,
                "    LatestResponseReceivedTime: {}",
                format_time(response.latest_receive_time)
            )?;
            writeln!(
                f,
                "    TimeToGetResponses: {}",
                format_elapsed(response.earliest_receive_time, response.latest_receive_time)
            )?;
            write_error_distribution(f, &response.error_count_by_kind)?;
        }
        Ok(())
    }
}

fn average(total: i64, count: u64) -> f64 {
    if count == 0 {
        0.0
    } else {
        total as f64 / count as f64
    }
}

fn format_time(at: Option<SystemTime>) -> String {
    match at {
        Some(at) => DateTime::<Local>::from(at)
            .format("%B %d, %Y %H:%M:%S %Z")
            .to_string(),
        None => "-".to_string(),
    }
}

fn format_elapsed(earliest: Option<SystemTime>, latest: Option<SystemTime>) -> String {
    match (earliest, latest) {
        (Some(earliest), Some(latest)) => match latest.duration_since(earliest) {
            Ok(elapsed) => humantime::format_duration(elapsed).to_string(),
            Err(_) => "0s".to_string(),
        },
        _ => "0s".to_string(),
    }
}

fn write_error_distribution(
    f: &mut fmt::Formatter<'_>,
    errors: &BTreeMap<&'static str, u64>,
) -> fmt::Result {
    if errors.is_empty() {
        return Ok(());
    }
    writeln!(f, "  Error distribution:")?;
    for (kind, count) in errors {
        writeln!(f, "  [{count}]   {kind}")?;
    }
    Ok(())
}

/// Drains the LoadEvent channel (and the ResponseEvent channel, if present)
/// on dedicated threads and aggregates a `Report`. The sole consumer of both
/// channels.
pub struct Reporter {
    load_handle: JoinHandle<LoadMetrics>,
    response_handle: Option<JoinHandle<Option<ResponseMetrics>>>,
}

impl Reporter {
    pub fn spawn(
        load_events: Receiver<LoadEvent>,
        response_events: Option<Receiver<ResponseEvent>>,
    ) -> Reporter {
        let load_handle = thread::Builder::new()
            .name("blast-reporter-load".to_string())
            .spawn(move || {
                let mut report = Report {
                    load: LoadMetrics::default(),
                    response: None,
                };
                for event in load_events.iter() {
                    report.record_load_event(event);
                }
                report.load
            })
            .expect("failed to spawn load reporter thread");

        let response_handle = response_events.map(|response_events| {
            thread::Builder::new()
                .name("blast-reporter-response".to_string())
                .spawn(move || {
                    let mut report = Report {
                        load: LoadMetrics::default(),
                        response: None,
                    };
                    for event in response_events.iter() {
                        report.record_response_event(event);
                    }
                    report.response
                })
                .expect("failed to spawn response reporter thread")
        });

        Reporter {
            load_handle,
            response_handle,
        }
    }

    /// Waits for both channels to reach end-of-stream and returns the final
    /// report. The caller (the orchestrator) must have already closed both
    /// channels, or this blocks forever.
    pub fn finish(self) -> Report {
        let load = self.load_handle.join().expect("load reporter thread panicked");
        let response = self
            .response_handle
            .map(|handle| handle.join().expect("response reporter thread panicked"))
            .flatten();
        Report { load, response }
    }
}
