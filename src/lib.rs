//! # Seriatim Core Library
//!
//! A conformance-test driver for line-oriented command/response protocols
//! spoken by embedded devices over a serial port. The driver sends one
//! command at a time from a fixed, ordered table, accumulates the response,
//! checks it for an expected substring, and enforces a per-exchange watchdog.
//! Any anomaly (a short write, a timeout, a lost port) ends the run with a
//! distinguishable non-zero outcome; a conformance test never retries.
//!
//! ## Example
//!
//! ```rust,no_run
//! use seriatim_core::{
//!     conformance_suite, run_suite, LoopbackConfig, Transport,
//! };
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() {
//!     let report = run_suite(
//!         Transport::Loopback(LoopbackConfig::conforming()),
//!         conformance_suite(),
//!         Duration::from_millis(100),
//!         Duration::from_millis(2000),
//!     )
//!     .await
//!     .expect("conforming device must pass");
//!
//!     println!("{}", report.transcript());
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod cli;
pub mod config;
pub mod core;

// Re-exports for convenience
pub use crate::cli::{code_for, exit_code_for, ExitCodes};
pub use crate::config::{ConfigError, DriverConfig};
pub use crate::core::accumulator::ResponseBuffer;
pub use crate::core::encoder::{encode, LINE_TERMINATOR};
pub use crate::core::report::{CaseRecord, RunReport};
pub use crate::core::runner::run_suite;
pub use crate::core::sequencer::{DriverError, Sequencer, DEFAULT_TICK};
pub use crate::core::suite::{conformance_suite, TestCase};
pub use crate::core::transport::{
    list_ports, LoopbackConfig, LoopbackFault, SerialConfig, SerialFlowControl, SerialParity,
    Transport, TransportError, TransportType,
};
pub use crate::core::watchdog::{Watchdog, DEFAULT_WATCHDOG};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
