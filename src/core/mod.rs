//! Core driver functionality
//!
//! The sequencer and its collaborators: command encoding, response
//! accumulation, the per-exchange watchdog, the fixed conformance table,
//! transcript reporting, and the transport adapters.

pub mod accumulator;
pub mod encoder;
pub mod report;
pub mod runner;
pub mod sequencer;
pub mod suite;
pub mod transport;
pub mod watchdog;
