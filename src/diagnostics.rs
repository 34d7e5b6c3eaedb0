//! Diagnostics Channel - Structured Failure Records
//!
//! The core never renders or displays failures; it hands `Diagnostic`
//! records to whatever reporting surface the driver plugged in.

use serde::{Deserialize, Serialize};

/// The sole observable failure artifact of a round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostic {
    /// Error kind label, e.g. `NoDefaultConstructor` or `IOFailure`.
    pub kind: String,
    /// Qualified name of the originating declaration; `None` for
    /// round-scoped failures such as emission write errors.
    pub origin: Option<String>,
    pub message: String,
}

impl Diagnostic {
    pub fn new(
        kind: impl Into<String>,
        origin: Option<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind: kind.into(),
            origin,
            message: message.into(),
        }
    }
}

/// Reporting surface the driver supplies: build logs, IDE markers, stderr.
pub trait DiagnosticsSink {
    fn report(&mut self, diagnostic: Diagnostic);
}

/// Accumulates diagnostics in memory; used by tests and the CLI's JSON output.
#[derive(Debug, Default)]
pub struct CollectingSink {
    pub diagnostics: Vec<Diagnostic>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DiagnosticsSink for CollectingSink {
    fn report(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }
}
