//! End-to-end response-reading scenarios, mirroring the upstream project's
//! `tests/response_reader_integration_test.go`.

mod common;

use blast::{Blast, ConstantPayloadGenerator, GroupOptions, ResponseGoal, ResponseOptions};
use std::sync::Arc;
use std::time::Duration;

#[test]
fn run_ends_on_total_response_goal() {
    let target = common::echo_server();
    let options = GroupOptions {
        concurrency: 10,
        connections: 1,
        target_address: target,
        dial_timeout: Duration::from_secs(1),
        requests_per_second: 10.0,
        max_duration: Duration::from_secs(2),
        payload_generator: Arc::new(ConstantPayloadGenerator::new(vec![0u8; 10])),
    };
    let response_options = ResponseOptions {
        response_payload_size_bytes: 10,
        read_deadline: Some(Duration::from_millis(200)),
        goal: ResponseGoal::TotalResponses(20),
    };

    let blast = Blast::with_response_reading(options, response_options, false);
    let mut out = Vec::new();
    blast.wait_for_completion(&mut out);
    let report = String::from_utf8(out).unwrap();

    assert!(report.contains("ResponseMetrics"));
    assert!(report.contains("ErrorCount: 0"));
}

#[test]
fn deadline_exceeded_dominates_when_server_answers_only_a_fraction_of_requests() {
    let target = common::partial_responder(10, 10, 5);
    let options = GroupOptions {
        concurrency: 10,
        connections: 1,
        target_address: target,
        dial_timeout: Duration::from_secs(1),
        requests_per_second: 10.0,
        max_duration: Duration::from_secs(5),
        payload_generator: Arc::new(ConstantPayloadGenerator::new(vec![0u8; 10])),
    };
    let response_options = ResponseOptions {
        response_payload_size_bytes: 10,
        read_deadline: Some(Duration::from_millis(100)),
        goal: ResponseGoal::TotalResponses(50),
    };

    let blast = Blast::with_response_reading(options, response_options, false);
    let mut out = Vec::new();
    blast.wait_for_completion(&mut out);
    let report = String::from_utf8(out).unwrap();

    assert!(report.contains("ResponseMetrics"));
    assert!(report.contains("DeadlineExceeded"));
}
