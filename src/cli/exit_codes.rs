//! CLI Exit Codes
//!
//! Distinguishable exit codes so CI and scripts can tell a conformance
//! failure from a broken cable from a bad invocation.

use std::process::ExitCode;

use crate::core::sequencer::DriverError;
use crate::core::transport::TransportError;

/// Exit code constants
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitCodes;

impl ExitCodes {
    /// Success: every case matched
    pub const SUCCESS: u8 = 0;

    /// General error
    pub const ERROR: u8 = 1;

    /// Invalid arguments
    pub const INVALID_ARGS: u8 = 2;

    /// Connection failed
    pub const CONNECTION_FAILED: u8 = 3;

    /// Watchdog timeout waiting for a response
    pub const TIMEOUT: u8 = 4;

    /// Configuration error
    pub const CONFIG_ERROR: u8 = 8;

    /// Protocol violation (short write, transport lost mid-run)
    pub const PROTOCOL_ERROR: u8 = 9;

    /// Port not found
    pub const PORT_NOT_FOUND: u8 = 14;
}

/// Exit code description
pub fn exit_code_description(code: u8) -> &'static str {
    match code {
        0 => "Success",
        1 => "General error",
        2 => "Invalid arguments",
        3 => "Connection failed",
        4 => "Watchdog timeout",
        8 => "Configuration error",
        9 => "Protocol error",
        14 => "Port not found",
        _ => "Unknown error",
    }
}

/// Map a fatal run outcome to its exit code.
pub fn code_for(error: &DriverError) -> u8 {
    match error {
        DriverError::Timeout { .. } => ExitCodes::TIMEOUT,
        DriverError::ShortWrite { .. }
        | DriverError::TransportClosed
        | DriverError::TransportFailed(_) => ExitCodes::PROTOCOL_ERROR,
        DriverError::Transport(TransportError::PortNotFound(_)) => ExitCodes::PORT_NOT_FOUND,
        DriverError::Transport(_) => ExitCodes::CONNECTION_FAILED,
        DriverError::WatchdogAlreadyArmed => ExitCodes::ERROR,
    }
}

/// Map a fatal run outcome to a process [`ExitCode`].
pub fn exit_code_for(error: &DriverError) -> ExitCode {
    ExitCode::from(code_for(error))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_maps_to_timeout_code() {
        let err = DriverError::Timeout {
            case: "READY".to_string(),
            expected: "READY".to_string(),
            received: String::new(),
            window_ms: 2000,
        };
        assert_eq!(code_for(&err), ExitCodes::TIMEOUT);
        assert_eq!(exit_code_description(code_for(&err)), "Watchdog timeout");
    }

    #[test]
    fn test_transport_errors_are_distinguishable() {
        let not_found = DriverError::Transport(TransportError::PortNotFound("COM9".into()));
        assert_eq!(code_for(&not_found), ExitCodes::PORT_NOT_FOUND);

        let refused =
            DriverError::Transport(TransportError::ConnectionFailed("busy".into()));
        assert_eq!(code_for(&refused), ExitCodes::CONNECTION_FAILED);

        let short = DriverError::ShortWrite {
            case: "x".into(),
            expected: 10,
            written: 3,
        };
        assert_eq!(code_for(&short), ExitCodes::PROTOCOL_ERROR);
    }

    #[test]
    fn test_exit_code_agrees_with_raw_code() {
        let err = DriverError::TransportFailed("device unplugged".into());
        // ExitCode has no PartialEq; compare through Debug.
        assert_eq!(
            format!("{:?}", exit_code_for(&err)),
            format!("{:?}", ExitCode::from(ExitCodes::PROTOCOL_ERROR)),
        );
    }
}
