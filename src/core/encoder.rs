//! Command encoder
//!
//! Maps a bare command string to the wire frame actually transmitted: the
//! command bytes followed by exactly one line terminator. The empty string is
//! a sentinel meaning "send nothing, wait for an unsolicited message" (used
//! for the device-ready handshake), so it produces no frame at all.

use bytes::Bytes;

/// Line terminator appended to every transmitted command.
pub const LINE_TERMINATOR: u8 = b'\n';

/// Encode a command into its wire frame.
///
/// Returns `None` for the empty sentinel command. No escaping and no length
/// validation is performed here: the device enforces its own maximum command
/// length, and the conformance suite deliberately sends an oversized command
/// to exercise that limit.
pub fn encode(command: &str) -> Option<Bytes> {
    if command.is_empty() {
        return None;
    }

    let mut frame = Vec::with_capacity(command.len() + 1);
    frame.extend_from_slice(command.as_bytes());
    frame.push(LINE_TERMINATOR);
    Some(Bytes::from(frame))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_appends_single_terminator() {
        let frame = encode("a/write/3?val=25").unwrap();
        assert_eq!(frame.len(), "a/write/3?val=25".len() + 1);
        assert_eq!(frame.as_ref(), b"a/write/3?val=25\n");
    }

    #[test]
    fn test_sentinel_produces_no_frame() {
        assert!(encode("").is_none());
    }

    #[test]
    fn test_oversized_command_is_not_rejected() {
        let long = "a".repeat(164);
        let frame = encode(&long).unwrap();
        assert_eq!(frame.len(), 165);
    }
}
