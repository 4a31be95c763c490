//! Run orchestration
//!
//! Opens the transport, wires the reader task to the sequencer, and makes
//! sure the port is released on every path. This is the only layer that
//! touches resources; the sequencer just returns its outcome.

use std::sync::Arc;
use std::time::Duration;

use super::report::RunReport;
use super::sequencer::{DriverError, Sequencer};
use super::suite::TestCase;
use super::transport::{create_transport, spawn_reader, Transport};

/// Run a case list against the configured transport.
///
/// Connects, drives the sequencer to completion, then disconnects whether the
/// run passed or died. The result is handed back untouched so the caller can
/// map it to an exit code.
pub async fn run_suite(
    transport: Transport,
    cases: Vec<TestCase>,
    tick: Duration,
    watchdog_window: Duration,
) -> Result<RunReport, DriverError> {
    let mut transport = create_transport(transport);
    transport.connect().await?;
    tracing::info!(port = %transport.connection_info(), "connected");

    let transport = Arc::new(tokio::sync::Mutex::new(transport));
    let mut events = spawn_reader(transport.clone());

    let mut sequencer = Sequencer::new(cases)
        .tick(tick)
        .watchdog_window(watchdog_window);

    let outcome = sequencer.run(&transport, &mut events).await;

    // Release the port regardless of the outcome; the reader task stops on
    // its own once the transport reports disconnected.
    if let Err(e) = transport.lock().await.disconnect().await {
        tracing::warn!(error = %e, "disconnect failed");
    }

    outcome
}
