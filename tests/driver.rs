//! Full-run integration tests over the loopback device.
//!
//! These drive the public `run_suite` entry point end to end with the paused
//! tokio clock, so watchdog windows elapse instantly and runs are
//! deterministic.

use std::time::Duration;

use seriatim_core::{
    cli::{code_for, ExitCodes},
    conformance_suite, run_suite, DriverError, LoopbackConfig, LoopbackFault, Transport,
};

const TICK: Duration = Duration::from_millis(100);
const WINDOW: Duration = Duration::from_millis(2000);

async fn run(config: LoopbackConfig) -> Result<seriatim_core::RunReport, DriverError> {
    run_suite(
        Transport::Loopback(config),
        conformance_suite(),
        TICK,
        WINDOW,
    )
    .await
}

#[tokio::test(start_paused = true)]
async fn full_suite_passes_on_conforming_device() {
    let report = run(LoopbackConfig::conforming()).await.unwrap();

    assert_eq!(report.passed(), 35);
    assert_eq!(report.cases[0].name, "READY");
    assert_eq!(report.cases[0].command, "");
    assert!(report.cases[0].received.contains("READY"));

    // Execution order matches table order.
    let names: Vec<_> = report.cases.iter().map(|c| c.name.as_str()).collect();
    let expected: Vec<_> = conformance_suite()
        .iter()
        .map(|c| c.name.clone())
        .collect();
    assert_eq!(names, expected);

    // The prefix-fragment cases matched on containment, not equality.
    let ai_read = report
        .cases
        .iter()
        .find(|c| c.command == "a/read/1")
        .unwrap();
    assert!(ai_read.received.len() > ai_read.expected.len());
    assert!(ai_read.received.contains(&ai_read.expected));
}

#[tokio::test(start_paused = true)]
async fn rerun_produces_identical_pass_sequence() {
    let first = run(LoopbackConfig::conforming()).await.unwrap();
    let second = run(LoopbackConfig::conforming()).await.unwrap();

    let names = |r: &seriatim_core::RunReport| {
        r.cases.iter().map(|c| c.name.clone()).collect::<Vec<_>>()
    };
    assert_eq!(names(&first), names(&second));
}

#[tokio::test(start_paused = true)]
async fn missing_greeting_times_out_on_handshake() {
    let err = run(LoopbackConfig::conforming().greeting(None))
        .await
        .unwrap_err();

    match &err {
        DriverError::Timeout {
            case,
            expected,
            window_ms,
            ..
        } => {
            assert_eq!(case, "READY");
            assert_eq!(expected, "READY");
            assert_eq!(*window_ms, 2000);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(code_for(&err), ExitCodes::TIMEOUT);
}

#[tokio::test(start_paused = true)]
async fn mute_device_times_out_after_handshake() {
    // The greeting still arrives, so the sentinel passes; the first real
    // command then gets no answer.
    let err = run(LoopbackConfig::conforming().fault(LoopbackFault::Mute))
        .await
        .unwrap_err();

    match err {
        DriverError::Timeout { case, received, .. } => {
            assert_eq!(case, "Illegal Command.");
            assert!(received.is_empty());
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn wrong_response_is_dumped_in_diagnostics() {
    let config = LoopbackConfig::conforming().respond("aaaaa", r#"{"msg":"OK"}"#);
    let err = run(config).await.unwrap_err();

    match err {
        DriverError::Timeout {
            case,
            expected,
            received,
            ..
        } => {
            assert_eq!(case, "Illegal Command.");
            assert_eq!(expected, r#"{"msg":"NG","error":"Illegal command."}"#);
            assert!(received.contains(r#"{"msg":"OK"}"#));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn short_write_aborts_the_run() {
    let err = run(LoopbackConfig::conforming().fault(LoopbackFault::ShortWrite))
        .await
        .unwrap_err();

    match &err {
        DriverError::ShortWrite {
            case,
            expected,
            written,
        } => {
            // First case needing a write: "aaaaa" plus terminator.
            assert_eq!(case, "Illegal Command.");
            assert_eq!(*expected, 6);
            assert_eq!(*written, 5);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(code_for(&err), ExitCodes::PROTOCOL_ERROR);
}

#[tokio::test(start_paused = true)]
async fn json_transcript_round_trips_case_count() {
    let report = run(LoopbackConfig::conforming()).await.unwrap();
    let json = report.to_json().unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["cases"].as_array().unwrap().len(), 35);
}
