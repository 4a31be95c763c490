//! Run transcript
//!
//! Every passed case is recorded with the expected fragment and the text that
//! actually arrived, so a green run still leaves an auditable trail. Output
//! comes in human-readable and JSON forms.

use serde::Serialize;

/// One passed exchange: what was asked for and what came back.
#[derive(Debug, Clone, Serialize)]
pub struct CaseRecord {
    /// Test case label.
    pub name: String,
    /// Command that was sent (empty for the handshake sentinel).
    pub command: String,
    /// Fragment the response had to contain.
    pub expected: String,
    /// Full accumulated response at the moment of the match.
    pub received: String,
}

/// Transcript of a completed conformance run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunReport {
    /// Records for every case, in execution order.
    pub cases: Vec<CaseRecord>,
}

impl RunReport {
    /// Create an empty report.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a passed case.
    pub fn record(&mut self, record: CaseRecord) {
        self.cases.push(record);
    }

    /// Number of cases that passed.
    pub fn passed(&self) -> usize {
        self.cases.len()
    }

    /// One-line summary.
    pub fn summary(&self) -> String {
        format!("{} cases passed", self.passed())
    }

    /// Human-readable transcript. Expected and received text are trimmed for
    /// display only; matching never trims.
    pub fn transcript(&self) -> String {
        let mut out = String::new();
        for record in &self.cases {
            out.push_str(&format!("PASS {}\n", record.name));
            out.push_str(&format!("  expected : {}\n", record.expected.trim()));
            out.push_str(&format!("  received : {}\n", record.received.trim()));
        }
        out.push_str(&self.summary());
        out.push('\n');
        out
    }

    /// JSON transcript for automation.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
