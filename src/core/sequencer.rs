//! Test sequencer
//!
//! The core state machine. One case is active at a time; each case moves
//! through `PENDING_SEND → AWAITING_MATCH → MATCHED`, or ends the whole run
//! on a short write or watchdog expiry. All three async sources (the poll
//! tick, inbound bytes, the watchdog deadline) are serialized onto this one
//! task, so there is no concurrent mutation of run state and at most one
//! command is ever in flight.
//!
//! The sequencer never touches the process: it returns a [`RunReport`] or a
//! [`DriverError`] and leaves transport release and exit-code mapping to the
//! runner.

use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;

use super::accumulator::ResponseBuffer;
use super::encoder;
use super::report::{CaseRecord, RunReport};
use super::suite::TestCase;
use super::transport::{PortEvent, SharedTransport, TransportError};
use super::watchdog::{Watchdog, DEFAULT_WATCHDOG};

/// Default poll interval. A tunable, not a correctness requirement: it only
/// has to be short relative to the watchdog window.
pub const DEFAULT_TICK: Duration = Duration::from_millis(100);

/// Fatal run outcomes. Nothing here is retryable: the protocol has no
/// resynchronization mechanism, so the first anomaly invalidates every
/// subsequent case.
#[derive(Debug, Error)]
pub enum DriverError {
    /// The transport accepted fewer bytes than the frame holds.
    #[error("short write for '{case}': frame is {expected} bytes, wrote {written}")]
    ShortWrite {
        /// Failing case name.
        case: String,
        /// Frame length in bytes.
        expected: usize,
        /// Bytes the transport reported written.
        written: usize,
    },

    /// No matching response arrived within the watchdog window.
    #[error(
        "timeout in '{case}' after {window_ms} ms: expected {expected:?}, received {received:?}"
    )]
    Timeout {
        /// Failing case name.
        case: String,
        /// Fragment that never appeared.
        expected: String,
        /// Everything accumulated while waiting.
        received: String,
        /// Watchdog window that elapsed.
        window_ms: u64,
    },

    /// The transport closed mid-run.
    #[error("transport closed mid-run")]
    TransportClosed,

    /// The transport reported an asynchronous failure.
    #[error("transport failure: {0}")]
    TransportFailed(String),

    /// A transport operation failed.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Internal usage error: the watchdog was armed twice without a disarm.
    /// Structurally unreachable from the sequencer's state machine.
    #[error("watchdog armed while already armed")]
    WatchdogAlreadyArmed,
}

#[derive(Debug)]
enum Step {
    Continue,
    Finished,
}

/// Sequential protocol test driver.
pub struct Sequencer {
    cases: Vec<TestCase>,
    index: usize,
    buffer: ResponseBuffer,
    watchdog: Watchdog,
    tick: Duration,
    window: Duration,
    report: RunReport,
}

impl Sequencer {
    /// Create a sequencer over an ordered case list with default timings
    /// (100 ms tick, 2000 ms watchdog).
    pub fn new(cases: Vec<TestCase>) -> Self {
        Self {
            cases,
            index: 0,
            buffer: ResponseBuffer::new(),
            watchdog: Watchdog::new(),
            tick: DEFAULT_TICK,
            window: DEFAULT_WATCHDOG,
            report: RunReport::new(),
        }
    }

    /// Set the poll interval.
    #[must_use]
    pub fn tick(mut self, tick: Duration) -> Self {
        self.tick = tick;
        self
    }

    /// Set the per-exchange watchdog window.
    #[must_use]
    pub fn watchdog_window(mut self, window: Duration) -> Self {
        self.window = window;
        self
    }

    /// Drive the whole suite to completion.
    ///
    /// Selects between the poll tick and transport events until every case
    /// has matched or a fatal condition ends the run. The watchdog is
    /// disarmed on every exit path, success or failure.
    pub async fn run(
        &mut self,
        transport: &SharedTransport,
        events: &mut mpsc::Receiver<PortEvent>,
    ) -> Result<RunReport, DriverError> {
        let mut ticker = tokio::time::interval(self.tick);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    match self.step(transport).await {
                        Ok(Step::Finished) => {
                            self.watchdog.disarm();
                            tracing::info!(passed = self.report.passed(), "run finished");
                            return Ok(self.report.clone());
                        }
                        Ok(Step::Continue) => {}
                        Err(e) => {
                            self.watchdog.disarm();
                            return Err(e);
                        }
                    }
                }
                event = events.recv() => match event {
                    Some(PortEvent::Data(bytes)) => self.buffer.append(&bytes),
                    Some(PortEvent::Error(msg)) => {
                        self.watchdog.disarm();
                        return Err(DriverError::TransportFailed(msg));
                    }
                    Some(PortEvent::Closed) | None => {
                        self.watchdog.disarm();
                        return Err(DriverError::TransportClosed);
                    }
                },
            }
        }
    }

    /// One poll tick: send the current case if pending, otherwise check for
    /// a match or an expired watchdog.
    async fn step(&mut self, transport: &SharedTransport) -> Result<Step, DriverError> {
        if self.index >= self.cases.len() {
            return Ok(Step::Finished);
        }

        if !self.cases[self.index].sent {
            return self.send_current(transport).await;
        }

        let case = &self.cases[self.index];
        if self.buffer.contains(&case.expected) {
            self.watchdog.disarm();
            tracing::info!(
                case = %case.name,
                expected = %case.expected.trim(),
                received = %self.buffer.as_str().trim(),
                "pass"
            );
            self.report.record(CaseRecord {
                name: case.name.clone(),
                command: case.command.clone(),
                expected: case.expected.clone(),
                received: self.buffer.as_str().to_string(),
            });
            self.index += 1;
            // The next tick starts the next case from PENDING_SEND.
        } else if self.watchdog.expired() {
            self.watchdog.disarm();
            return Err(DriverError::Timeout {
                case: case.name.clone(),
                expected: case.expected.clone(),
                received: self.buffer.as_str().to_string(),
                window_ms: self.window.as_millis() as u64,
            });
        }

        Ok(Step::Continue)
    }

    async fn send_current(&mut self, transport: &SharedTransport) -> Result<Step, DriverError> {
        // Anything received before this case belongs to the previous one.
        self.buffer.reset();

        let case = &self.cases[self.index];
        tracing::info!(case = %case.name, "start");

        match encoder::encode(&case.command) {
            None => {
                // Sentinel: nothing goes out, the case just waits for an
                // unsolicited message.
                tracing::debug!(case = %case.name, "awaiting unsolicited message");
            }
            Some(frame) => {
                tracing::debug!(command = %case.command, "send");
                let written = transport.lock().await.send(&frame).await?;
                if written != frame.len() {
                    // Do not wait for a response that was never fully sent.
                    return Err(DriverError::ShortWrite {
                        case: case.name.clone(),
                        expected: frame.len(),
                        written,
                    });
                }
            }
        }

        self.cases[self.index].sent = true;
        self.watchdog.arm(self.window)?;
        Ok(Step::Continue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::transport::{
        create_transport, LoopbackConfig, LoopbackFault, Transport, TransportTrait,
    };
    use std::sync::Arc;

    async fn shared(config: LoopbackConfig) -> SharedTransport {
        let mut transport = create_transport(Transport::Loopback(config));
        transport.connect().await.unwrap();
        Arc::new(tokio::sync::Mutex::new(transport))
    }

    fn one_case(command: &str, expected: &str) -> Vec<TestCase> {
        vec![TestCase::new("case", command, expected)]
    }

    #[tokio::test(start_paused = true)]
    async fn test_sentinel_case_sent_without_transmission() {
        let transport = shared(LoopbackConfig::default().greeting(None)).await;
        let mut seq = Sequencer::new(one_case("", "READY"));

        assert!(matches!(seq.step(&transport).await, Ok(Step::Continue)));
        assert!(seq.cases[0].sent);
        assert!(seq.watchdog.is_armed());
        assert!(seq.buffer.is_empty());

        // Nothing matched yet: the cursor stays put.
        assert!(matches!(seq.step(&transport).await, Ok(Step::Continue)));
        assert_eq!(seq.index, 0);

        // The unsolicited message arrives; the case completes.
        seq.buffer.append(b"READY\n");
        assert!(matches!(seq.step(&transport).await, Ok(Step::Continue)));
        assert_eq!(seq.index, 1);
        assert!(!seq.watchdog.is_armed());
        assert!(matches!(seq.step(&transport).await, Ok(Step::Finished)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_match_tolerates_surrounding_noise() {
        let transport = shared(LoopbackConfig::default().greeting(None)).await;
        let mut seq = Sequencer::new(one_case("aaaaa", r#"{"msg":"NG","error":"Illegal command."}"#));

        seq.step(&transport).await.unwrap();
        seq.buffer
            .append(b"junk{\"msg\":\"NG\",\"error\":\"Illegal command.\"}junk");
        seq.step(&transport).await.unwrap();
        assert_eq!(seq.index, 1);
        assert_eq!(seq.report.passed(), 1);
        assert!(seq.report.cases[0].received.contains("junk"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_short_write_aborts_before_arming() {
        let transport = shared(
            LoopbackConfig::default()
                .greeting(None)
                .fault(LoopbackFault::ShortWrite),
        )
        .await;
        let mut seq = Sequencer::new(one_case("a/read/1", "{"));

        let err = seq.step(&transport).await.unwrap_err();
        match err {
            DriverError::ShortWrite { expected, written, .. } => {
                assert_eq!(expected, 9);
                assert_eq!(written, 8);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        // The run died before the watchdog was armed for this case.
        assert!(!seq.watchdog.is_armed());
        assert!(!seq.cases[0].sent);
    }

    #[tokio::test(start_paused = true)]
    async fn test_watchdog_expiry_is_fatal_with_diagnostics() {
        let transport = shared(
            LoopbackConfig::default()
                .greeting(None)
                .fault(LoopbackFault::Mute),
        )
        .await;
        let mut seq = Sequencer::new(one_case("a/read/1", r#"{"msg":"OK","port":1,"#));

        seq.step(&transport).await.unwrap();
        seq.buffer.append(b"garbage");

        tokio::time::advance(DEFAULT_WATCHDOG).await;
        let err = seq.step(&transport).await.unwrap_err();
        match err {
            DriverError::Timeout {
                case,
                expected,
                received,
                window_ms,
            } => {
                assert_eq!(case, "case");
                assert_eq!(expected, r#"{"msg":"OK","port":1,"#);
                assert_eq!(received, "garbage");
                assert_eq!(window_ms, 2000);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_buffer_reset_between_cases() {
        let transport = shared(LoopbackConfig::default().greeting(None)).await;
        let mut seq = Sequencer::new(vec![
            TestCase::new("first", "", "READY"),
            TestCase::new("second", "aaaaa", "NG"),
        ]);

        seq.step(&transport).await.unwrap();
        seq.buffer.append(b"READY leftover");
        seq.step(&transport).await.unwrap();
        assert_eq!(seq.index, 1);

        // Starting the second case clears everything the first one received.
        seq.step(&transport).await.unwrap();
        assert!(seq.buffer.is_empty());
        assert!(seq.watchdog.is_armed());
    }

    #[tokio::test(start_paused = true)]
    async fn test_at_most_one_watchdog_across_whole_run() {
        let transport = shared(LoopbackConfig::default().greeting(None)).await;
        let mut seq = Sequencer::new(vec![
            TestCase::new("a", "x", "ok"),
            TestCase::new("b", "y", "ok"),
        ]);

        // Arming happens once per case; a match disarms before the next arm,
        // so the double-arm usage error can never fire from the sequencer.
        seq.step(&transport).await.unwrap();
        assert!(seq.watchdog.is_armed());
        seq.buffer.append(b"ok");
        seq.step(&transport).await.unwrap();
        assert!(!seq.watchdog.is_armed());
        seq.step(&transport).await.unwrap();
        assert!(seq.watchdog.is_armed());
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_reports_transport_close() {
        let transport = shared(LoopbackConfig::default().greeting(None)).await;
        let (tx, mut rx) = mpsc::channel(8);
        tx.send(PortEvent::Closed).await.unwrap();

        let mut seq = Sequencer::new(one_case("a/read/1", "never"));
        let err = seq.run(&transport, &mut rx).await.unwrap_err();
        assert!(matches!(err, DriverError::TransportClosed));
        assert!(!seq.watchdog.is_armed());
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_reports_transport_failure() {
        let transport = shared(LoopbackConfig::default().greeting(None)).await;
        let (tx, mut rx) = mpsc::channel(8);
        tx.send(PortEvent::Error("device unplugged".into()))
            .await
            .unwrap();

        let mut seq = Sequencer::new(one_case("a/read/1", "never"));
        let err = seq.run(&transport, &mut rx).await.unwrap_err();
        match err {
            DriverError::TransportFailed(msg) => assert_eq!(msg, "device unplugged"),
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(!seq.watchdog.is_armed());
    }
}
