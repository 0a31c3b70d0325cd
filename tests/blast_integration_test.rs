//! End-to-end scenarios driving a real `Blast` against in-process TCP
//! servers, mirroring the upstream project's `tests/blast_integration_test.go`.

mod common;

use blast::{Blast, ConstantPayloadGenerator, GroupOptions};
use std::sync::Arc;
use std::time::Duration;

fn base_options(target: String) -> GroupOptions {
    GroupOptions {
        concurrency: 10,
        connections: 1,
        target_address: target,
        dial_timeout: Duration::from_secs(1),
        requests_per_second: 10.0,
        max_duration: Duration::from_secs(2),
        payload_generator: Arc::new(ConstantPayloadGenerator::new(b"HelloWorld".to_vec())),
    }
}

#[test]
fn load_generation_against_an_echo_server() {
    let target = common::echo_server();
    let options = base_options(target);

    let blast = Blast::without_response_reading(options, false);
    let mut out = Vec::new();
    blast.wait_for_completion(&mut out);
    let report = String::from_utf8(out).unwrap();

    assert!(report.contains("TotalConnections: 1"));
    assert!(report.contains("ErrorCount: 0"));
    assert!(!report.contains("SuccessCount: 0"));
}

#[test]
fn load_generation_ends_on_duration_with_a_large_worker_pool() {
    let target = common::echo_server();
    let mut options = base_options(target);
    options.concurrency = 1000;
    options.connections = 10;
    options.requests_per_second = 10.0;
    options.max_duration = Duration::from_millis(10);

    let started = std::time::Instant::now();
    let blast = Blast::without_response_reading(options, false);
    let mut out = Vec::new();
    blast.wait_for_completion(&mut out);
    let elapsed = started.elapsed();
    let report = String::from_utf8(out).unwrap();

    assert!(report.contains("ErrorCount: 0"));
    assert!(elapsed < Duration::from_secs(5), "run took {elapsed:?}, expected to end near the 10ms duration");
}

#[test]
fn unreachable_target_still_produces_a_report() {
    let options = base_options(common::unreachable_address());

    let blast = Blast::without_response_reading(options, false);
    let mut out = Vec::new();
    blast.wait_for_completion(&mut out);
    let report = String::from_utf8(out).unwrap();

    assert!(report.contains("TotalConnections: 0"));
    assert!(report.contains("NoConnection"));
}

#[test]
fn external_stop_terminates_the_run_promptly() {
    let target = common::echo_server();
    let mut options = base_options(target);
    options.concurrency = 1000;
    options.connections = 1;
    options.requests_per_second = 10.0;
    options.max_duration = Duration::from_secs(50);

    let blast = Blast::without_response_reading(options, false);
    let stop_handle = blast.stop_handle();

    std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(10));
        stop_handle.stop();
    });

    let started = std::time::Instant::now();
    let mut out = Vec::new();
    blast.wait_for_completion(&mut out);
    let elapsed = started.elapsed();

    assert!(
        elapsed < Duration::from_secs(2),
        "expected stop to end the run quickly, took {elapsed:?}"
    );
}

#[test]
fn keep_alive_mode_ignores_the_duration_timer() {
    let target = common::echo_server();
    let mut options = base_options(target);
    options.max_duration = Duration::from_millis(1);
    options.requests_per_second = 50.0;

    let blast = Blast::without_response_reading(options, true);
    let stop_handle = blast.stop_handle();

    std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(200));
        stop_handle.stop();
    });

    let started = std::time::Instant::now();
    let mut out = Vec::new();
    blast.wait_for_completion(&mut out);
    let elapsed = started.elapsed();
    let report = String::from_utf8(out).unwrap();

    assert!(
        elapsed >= Duration::from_millis(190),
        "keep-alive run ended before the external stop fired: {elapsed:?}"
    );
    assert!(report.contains("ErrorCount: 0"));
}
