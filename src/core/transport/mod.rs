//! Transport layer
//!
//! The driver core only requires a byte-stream contract: open, write with a
//! byte count back, a stream of inbound bytes, close. Two adapters implement
//! it: the real serial port and an in-process loopback device used for
//! hardware-free self-checks and tests.

mod loopback;
mod serial;

pub use loopback::{LoopbackConfig, LoopbackFault, LoopbackTransport};
pub use serial::{list_ports, SerialConfig, SerialFlowControl, SerialParity, SerialTransport};

use async_trait::async_trait;
use bytes::Bytes;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;

/// Transport configuration variants.
#[derive(Debug, Clone)]
pub enum Transport {
    /// Physical serial port.
    Serial(SerialConfig),
    /// In-process scripted device.
    Loopback(LoopbackConfig),
}

/// Transport type identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportType {
    /// Physical serial port.
    Serial,
    /// In-process scripted device.
    Loopback,
}

impl fmt::Display for TransportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Serial => write!(f, "Serial"),
            Self::Loopback => write!(f, "Loopback"),
        }
    }
}

/// Transport error types.
#[derive(Error, Debug)]
pub enum TransportError {
    /// Connection failed
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Port not found
    #[error("Port not found: {0}")]
    PortNotFound(String),

    /// Permission denied
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Not connected
    #[error("Not connected")]
    NotConnected,

    /// Peer closed the connection
    #[error("Disconnected")]
    Disconnected,
}

/// Byte-stream contract consumed by the driver.
#[async_trait]
pub trait TransportTrait: Send + Sync {
    /// Open the underlying port.
    async fn connect(&mut self) -> Result<(), TransportError>;

    /// Close the underlying port.
    async fn disconnect(&mut self) -> Result<(), TransportError>;

    /// Check if connected.
    fn is_connected(&self) -> bool;

    /// Write raw bytes, returning the number actually written. The driver
    /// compares this against the frame length; it never assumes a full write.
    async fn send(&mut self, data: &[u8]) -> Result<usize, TransportError>;

    /// Read whatever bytes are available right now. Returns an empty buffer
    /// when nothing has arrived; never blocks indefinitely.
    async fn receive(&mut self) -> Result<Bytes, TransportError>;

    /// Get transport type.
    fn transport_type(&self) -> TransportType;

    /// Human-readable connection description for logs.
    fn connection_info(&self) -> String;
}

/// Shared handle to a connected transport: the reader task and the sequencer
/// both need access, serialized through one async mutex.
pub type SharedTransport = Arc<tokio::sync::Mutex<Box<dyn TransportTrait>>>;

/// Lifecycle events forwarded from the transport to the driver loop.
#[derive(Debug, Clone)]
pub enum PortEvent {
    /// Inbound bytes arrived.
    Data(Bytes),
    /// The transport closed mid-run.
    Closed,
    /// The transport reported an error.
    Error(String),
}

/// Create a transport instance from configuration.
pub fn create_transport(config: Transport) -> Box<dyn TransportTrait> {
    match config {
        Transport::Serial(cfg) => Box::new(SerialTransport::new(cfg)),
        Transport::Loopback(cfg) => Box::new(LoopbackTransport::new(cfg)),
    }
}

/// Spawn the reader task: polls the transport and forwards inbound bytes and
/// lifecycle failures into a channel consumed by the driver loop. The channel
/// closing counts as [`PortEvent::Closed`] on the consumer side.
pub fn spawn_reader(transport: SharedTransport) -> mpsc::Receiver<PortEvent> {
    let (tx, rx) = mpsc::channel(256);

    tokio::spawn(async move {
        loop {
            let read = {
                let mut transport = transport.lock().await;
                if !transport.is_connected() {
                    break;
                }
                transport.receive().await
            };

            match read {
                Ok(bytes) if !bytes.is_empty() => {
                    if tx.send(PortEvent::Data(bytes)).await.is_err() {
                        break;
                    }
                }
                Ok(_) => {
                    // Nothing pending; yield before polling again.
                    tokio::time::sleep(Duration::from_millis(10)).await;
                }
                Err(TransportError::Disconnected) => {
                    let _ = tx.send(PortEvent::Closed).await;
                    break;
                }
                Err(e) => {
                    let _ = tx.send(PortEvent::Error(e.to_string())).await;
                    break;
                }
            }
        }
    });

    rx
}
