//! Response accumulator
//!
//! Captures every byte received since the last command was sent. The buffer
//! only ever grows between resets; match checks are a literal substring
//! search over the decoded text, case- and whitespace-sensitive.

/// Append-only buffer of decoded response text for the current test case.
#[derive(Debug, Default)]
pub struct ResponseBuffer {
    text: String,
}

impl ResponseBuffer {
    /// Create an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear the buffer. Called once per test case, before the command goes out.
    pub fn reset(&mut self) {
        self.text.clear();
    }

    /// Append newly arrived bytes, preserving arrival order.
    ///
    /// Decoding is lossy UTF-8; the device speaks ASCII JSON, so replacement
    /// characters only show up when the line is genuinely corrupted, in which
    /// case the match fails and the buffer dump shows what came in.
    pub fn append(&mut self, data: &[u8]) {
        self.text.push_str(&String::from_utf8_lossy(data));
    }

    /// Literal substring containment check against the accumulated text.
    pub fn contains(&self, fragment: &str) -> bool {
        self.text.contains(fragment)
    }

    /// Accumulated text so far.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// True if nothing has been received since the last reset.
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}
