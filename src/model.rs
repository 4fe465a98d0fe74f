//! Protocol-facing shapes: cycle outcomes, side-channel notifications and
//! completion/inspection replies.
//!
//! These structs are what a hosting front-end consumes; they carry no
//! behavior beyond construction helpers.

use serde::{Deserialize, Serialize};

use crate::error::KernelError;

/// Terminal state of an evaluation cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CycleStatus {
    Ok,
    Error,
}

/// Exactly one of these is produced per evaluation cycle.
#[derive(Debug, Clone, Serialize)]
pub struct CycleOutcome {
    pub status: CycleStatus,
    pub sequence: u64,
    pub payload: Vec<serde_json::Value>,
    #[serde(rename = "errorName", skip_serializing_if = "Option::is_none")]
    pub error_name: Option<String>,
    #[serde(rename = "errorMessage", skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(rename = "errorTrace", skip_serializing_if = "Option::is_none")]
    pub error_trace: Option<Vec<String>>,
}

impl CycleOutcome {
    pub fn ok(sequence: u64) -> Self {
        Self {
            status: CycleStatus::Ok,
            sequence,
            payload: Vec::new(),
            error_name: None,
            error_message: None,
            error_trace: None,
        }
    }

    pub fn error(sequence: u64, err: &KernelError) -> Self {
        Self {
            status: CycleStatus::Error,
            sequence,
            payload: Vec::new(),
            error_name: Some(err.name().to_string()),
            error_message: Some(err.to_string()),
            error_trace: Some(err.trace()),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == CycleStatus::Ok
    }
}

/// Stream category for text notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamName {
    Stdout,
    Stderr,
}

/// Out-of-band message emitted while a cycle runs, in production order.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Notification {
    /// Plain text on a stdout/stderr-like channel.
    Stream { name: StreamName, text: String },
    /// Rich result payload for direct front-end display, keyed by MIME type.
    Display { data: serde_json::Value },
}

impl Notification {
    pub fn stdout(text: impl Into<String>) -> Self {
        Notification::Stream {
            name: StreamName::Stdout,
            text: text.into(),
        }
    }

    pub fn stderr(text: impl Into<String>) -> Self {
        Notification::Stream {
            name: StreamName::Stderr,
            text: text.into(),
        }
    }

    pub fn display_text(text: impl Into<String>) -> Self {
        Notification::Display {
            data: serde_json::json!({ "text/plain": text.into() }),
        }
    }
}

/// One cycle's structured outcome plus everything emitted on the way.
#[derive(Debug, Clone, Serialize)]
pub struct CycleResult {
    pub outcome: CycleOutcome,
    pub notifications: Vec<Notification>,
}

impl CycleResult {
    pub fn ok(sequence: u64) -> Self {
        Self {
            outcome: CycleOutcome::ok(sequence),
            notifications: Vec::new(),
        }
    }
}

/// Reply to a completion request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompleteReply {
    pub matches: Vec<String>,
    pub cursor_start: usize,
    pub cursor_end: usize,
}

/// Reply to an inspection (contextual help) request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InspectReply {
    pub found: bool,
    pub text: String,
}

/// Static identity the host shim announces at startup.
#[derive(Debug, Clone, Serialize)]
pub struct KernelInfo {
    pub implementation: &'static str,
    pub implementation_version: &'static str,
    pub language: &'static str,
    pub mimetype: &'static str,
    pub file_extension: &'static str,
    pub banner: &'static str,
}

impl Default for KernelInfo {
    fn default() -> Self {
        Self {
            implementation: "shacl-kernel",
            implementation_version: env!("CARGO_PKG_VERSION"),
            language: "shacl",
            mimetype: "text/turtle",
            file_extension: ".ttl",
            banner: "SHACL kernel - Shapes Constraint Language with SPARQL support",
        }
    }
}
