//! Conformance suite
//!
//! The fixed table of request / expected-fragment pairs exercised against the
//! firmware, in execution order. The order is load-bearing: later cases rely
//! on device state left behind by earlier ones (pin modes, attached
//! interrupts), so the table must never be reordered or filtered.

/// One protocol exchange to validate: send `command`, wait until `expected`
/// appears somewhere in the accumulated response.
#[derive(Debug, Clone)]
pub struct TestCase {
    /// Human-readable label for logs and diagnostics.
    pub name: String,
    /// Bare request text, without terminator. Empty means "send nothing and
    /// wait for an unsolicited message" (the device-ready handshake).
    pub command: String,
    /// Fragment that must appear in the response for the case to pass.
    pub expected: String,
    /// Flips to true exactly once, when the command has gone out.
    pub(crate) sent: bool,
}

impl TestCase {
    /// Create a pending test case.
    pub fn new(
        name: impl Into<String>,
        command: impl Into<String>,
        expected: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            command: command.into(),
            expected: expected.into(),
            sent: false,
        }
    }

    /// True for the "wait for an unsolicited message" sentinel.
    pub fn is_sentinel(&self) -> bool {
        self.command.is_empty()
    }

    /// Whether the command has been transmitted (or, for the sentinel,
    /// whether the wait has started).
    pub fn sent(&self) -> bool {
        self.sent
    }
}

/// The full conformance table, in execution order.
///
/// Expected fragments are the exact JSON the firmware emits. Two of them are
/// intentional prefixes (`a/read` and `d/read` return a value that depends on
/// the pin, so only the part up to the value is checked); substring matching
/// in the sequencer is what makes those work.
pub fn conformance_suite() -> Vec<TestCase> {
    vec![
        // Boot handshake: nothing is sent, the firmware announces itself.
        TestCase::new("READY", "", "READY"),
        TestCase::new(
            "Illegal Command.",
            "aaaaa",
            r#"{"msg":"NG","error":"Illegal command."}"#,
        ),
        TestCase::new(
            "AO write test.",
            "a/write/3?val=25",
            r#"{"msg":"OK","port":3,"val":25}"#,
        ),
        TestCase::new(
            "AO write test. No query.",
            "a/write/3",
            r#"{"msg":"NG","error":"Query not found."}"#,
        ),
        TestCase::new(
            "AO write test. Illegal query.",
            "a/write/3?hoge",
            r#"{"msg":"NG","error":"val is not specified."}"#,
        ),
        TestCase::new(
            "AO write test. Illegal value.",
            "a/write/3?val=hoge",
            r#"{"msg":"NG","error":"Illegal value."}"#,
        ),
        TestCase::new(
            "AO write test. Illegal port number.",
            "a/write/a?val=20",
            r#"{"msg":"NG","error":"Illegal port number."}"#,
        ),
        TestCase::new(
            "AI Reference test. type = INTERNAL",
            "a/ref?type=INTERNAL",
            r#"{"msg":"OK","type":"INTERNAL"}"#,
        ),
        TestCase::new(
            "AI Reference test. type = EXTERNAL",
            "a/ref?type=EXTERNAL",
            r#"{"msg":"OK","type":"EXTERNAL"}"#,
        ),
        TestCase::new(
            "AI Reference test. type = DEFAULT",
            "a/ref?type=DEFAULT",
            r#"{"msg":"OK","type":"DEFAULT"}"#,
        ),
        TestCase::new(
            "AI Reference test. Unknown type.",
            "a/ref?type=hoge",
            r#"{"msg":"NG","error":"Illegal type."}"#,
        ),
        // Read values depend on the pin state, so only the prefix is checked.
        TestCase::new("AI read test.", "a/read/1", r#"{"msg":"OK","port":1,"#),
        TestCase::new(
            "AI read test. Illegal port.",
            "a/read/a",
            r#"{"msg":"NG","error":"Illegal port number."}"#,
        ),
        TestCase::new("DI read test.", "d/read/0", r#"{"msg":"OK","port":0,"#),
        TestCase::new(
            "DI read test. Illegal port",
            "d/read/aa",
            r#"{"msg":"NG","error":"Illegal port number."}"#,
        ),
        TestCase::new(
            "DO write test.",
            "d/write/3?val=25",
            r#"{"msg":"OK","port":3,"val":0}"#,
        ),
        TestCase::new(
            "DO write test. HIGH",
            "d/write/4?val=HIGH",
            r#"{"msg":"OK","port":4,"val":1}"#,
        ),
        TestCase::new(
            "DO write test. LOW",
            "d/write/4?val=LOW",
            r#"{"msg":"OK","port":4,"val":0}"#,
        ),
        TestCase::new(
            "DO write test. Illegal port number.",
            "d/write/40?val=LOW",
            r#"{"msg":"NG","error":"Illegal port number."}"#,
        ),
        TestCase::new(
            "DO write test. No query.",
            "d/write/3",
            r#"{"msg":"NG","error":"Query not found."}"#,
        ),
        TestCase::new(
            "DO write test. Illegal port number. query is val.",
            "d/write/b?val=3",
            r#"{"msg":"NG","error":"Illegal port number."}"#,
        ),
        TestCase::new(
            "DO write test. Illegal query.",
            "d/write/3?hoge",
            r#"{"msg":"NG","error":"val is not specified."}"#,
        ),
        TestCase::new(
            "DO write test. Illegal value.",
            "d/write/3?val=hoge",
            r#"{"msg":"NG","error":"Illegal value."}"#,
        ),
        TestCase::new(
            "Switch pin mode. INPUT",
            "d/mode/3?type=INPUT",
            r#"{"msg":"OK","type":"INPUT"}"#,
        ),
        TestCase::new(
            "Switch pin mode. OUTPUT",
            "d/mode/3?type=OUTPUT",
            r#"{"msg":"OK","type":"OUTPUT"}"#,
        ),
        TestCase::new(
            "Switch pin mode. INPUT_PULLUP",
            "d/mode/3?type=INPUT_PULLUP",
            r#"{"msg":"OK","type":"INPUT_PULLUP"}"#,
        ),
        TestCase::new(
            "Switch pin mode. Unknown type.",
            "d/mode/3?type=hogehoge",
            r#"{"msg":"NG","error":"Illegal type."}"#,
        ),
        TestCase::new(
            "Attach Interrupt. CHANGE",
            "d/int/on/0?type=CHANGE",
            r#"{"msg":"OK","num":0,"mode":"CHANGE"}"#,
        ),
        TestCase::new(
            "Attach Interrupt. RISING",
            "d/int/on/1?type=RISING",
            r#"{"msg":"OK","num":1,"mode":"RISING"}"#,
        ),
        TestCase::new(
            "Attach Interrupt. Illegal type.",
            "d/int/on/1?type=AAA",
            r#"{"msg":"NG","error":"Illegal type."}"#,
        ),
        TestCase::new(
            "Attach Interrupt. Illegal number.",
            "d/int/on/10?type=CHANGE",
            r#"{"msg":"NG","error":"Illegal interrupt number."}"#,
        ),
        TestCase::new("Detach Interrupt.", "d/int/off/0", r#"{"msg":"OK","num":0}"#),
        TestCase::new("Detach Interrupt.", "d/int/off/1", r#"{"msg":"OK","num":1}"#),
        TestCase::new(
            "Detach Interrupt. Illegal number.",
            "d/int/off/10",
            r#"{"msg":"NG","error":"Illegal interrupt number."}"#,
        ),
        TestCase::new(
            "Too long command.",
            "a".repeat(164),
            r#"{"msg":"NG","error":"Command is too long."}"#,
        ),
    ]
}
