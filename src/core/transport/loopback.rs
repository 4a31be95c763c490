//! Loopback transport
//!
//! An in-process stand-in for the device, scripted with canned responses per
//! command. Used by the integration tests and by `run --loopback` as a
//! plumbing self-check that needs no hardware. Fault knobs let tests exercise
//! the driver's failure paths (short writes, a device that never answers).

use super::{TransportError, TransportTrait, TransportType};
use crate::core::encoder::LINE_TERMINATOR;
use crate::core::suite::conformance_suite;
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::{HashMap, VecDeque};

/// Fault injection modes for the loopback device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoopbackFault {
    /// Behave normally.
    #[default]
    None,
    /// Report one byte fewer written than requested, responding to nothing.
    ShortWrite,
    /// Accept writes but never respond.
    Mute,
}

/// Loopback device configuration.
#[derive(Debug, Clone)]
pub struct LoopbackConfig {
    /// Unsolicited text emitted as soon as the port opens.
    pub greeting: Option<String>,
    /// Canned response per bare command (no terminators on either side).
    pub script: HashMap<String, String>,
    /// Fault injection mode.
    pub fault: LoopbackFault,
}

impl Default for LoopbackConfig {
    fn default() -> Self {
        Self {
            greeting: Some("READY".to_string()),
            script: HashMap::new(),
            fault: LoopbackFault::None,
        }
    }
}

impl LoopbackConfig {
    /// A device that answers the whole conformance suite correctly.
    ///
    /// Most responses are taken straight from the suite's expected fragments;
    /// the two read commands answer with full JSON (the suite only checks a
    /// prefix of those, because the value depends on the pin).
    pub fn conforming() -> Self {
        let mut script: HashMap<String, String> = conformance_suite()
            .into_iter()
            .filter(|case| !case.is_sentinel())
            .map(|case| (case.command, case.expected))
            .collect();

        script.insert(
            "a/read/1".to_string(),
            r#"{"msg":"OK","port":1,"val":512}"#.to_string(),
        );
        script.insert(
            "d/read/0".to_string(),
            r#"{"msg":"OK","port":0,"val":1}"#.to_string(),
        );

        Self::default().script(script)
    }

    /// Replace the response script.
    #[must_use]
    pub fn script(mut self, script: HashMap<String, String>) -> Self {
        self.script = script;
        self
    }

    /// Add one scripted response.
    #[must_use]
    pub fn respond(mut self, command: &str, response: &str) -> Self {
        self.script.insert(command.to_string(), response.to_string());
        self
    }

    /// Set the greeting, or silence it with `None`.
    #[must_use]
    pub fn greeting(mut self, greeting: Option<&str>) -> Self {
        self.greeting = greeting.map(str::to_string);
        self
    }

    /// Set the fault injection mode.
    #[must_use]
    pub fn fault(mut self, fault: LoopbackFault) -> Self {
        self.fault = fault;
        self
    }
}

/// Scripted in-process device.
pub struct LoopbackTransport {
    config: LoopbackConfig,
    connected: bool,
    /// Bytes queued for the driver to read.
    inbound: VecDeque<u8>,
    /// Partial command line received from the driver, pending its terminator.
    line: Vec<u8>,
}

impl LoopbackTransport {
    /// Create a new loopback transport.
    pub fn new(config: LoopbackConfig) -> Self {
        Self {
            config,
            connected: false,
            inbound: VecDeque::new(),
            line: Vec::new(),
        }
    }

    fn respond_to(&mut self, command: &str) {
        if self.config.fault == LoopbackFault::Mute {
            return;
        }

        let response = self
            .config
            .script
            .get(command)
            .cloned()
            .unwrap_or_else(|| r#"{"msg":"NG","error":"Illegal command."}"#.to_string());

        self.inbound.extend(response.as_bytes());
        self.inbound.push_back(LINE_TERMINATOR);
    }
}

#[async_trait]
impl TransportTrait for LoopbackTransport {
    async fn connect(&mut self) -> Result<(), TransportError> {
        self.connected = true;
        self.inbound.clear();
        self.line.clear();
        if let Some(greeting) = self.config.greeting.clone() {
            self.inbound.extend(greeting.as_bytes());
            self.inbound.push_back(LINE_TERMINATOR);
        }
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<(), TransportError> {
        self.connected = false;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    async fn send(&mut self, data: &[u8]) -> Result<usize, TransportError> {
        if !self.connected {
            return Err(TransportError::NotConnected);
        }

        if self.config.fault == LoopbackFault::ShortWrite {
            return Ok(data.len().saturating_sub(1));
        }

        for &byte in data {
            if byte == LINE_TERMINATOR {
                let command = String::from_utf8_lossy(&self.line).into_owned();
                self.line.clear();
                self.respond_to(&command);
            } else {
                self.line.push(byte);
            }
        }

        Ok(data.len())
    }

    async fn receive(&mut self) -> Result<Bytes, TransportError> {
        if !self.connected {
            return Err(TransportError::NotConnected);
        }

        if self.inbound.is_empty() {
            return Ok(Bytes::new());
        }

        let drained: Vec<u8> = self.inbound.drain(..).collect();
        Ok(Bytes::from(drained))
    }

    fn transport_type(&self) -> TransportType {
        TransportType::Loopback
    }

    fn connection_info(&self) -> String {
        format!("loopback ({} scripted responses)", self.config.script.len())
    }
}
