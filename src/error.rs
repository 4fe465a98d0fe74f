//! Error taxonomy for the evaluation engine.
//!
//! Every failure that can abort an evaluation cycle is a [`KernelError`].
//! The router converts the first error of a cycle into an `error` outcome;
//! nothing is allowed to propagate past the router boundary as a panic.

use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, KernelError>;

/// Closed set of cycle-aborting failures.
///
/// An unrecognized magic is deliberately absent from this set: it is
/// reported inline as a notification and never fails the cycle.
#[derive(Debug, Error)]
pub enum KernelError {
    /// Input could not be parsed as Turtle.
    #[error("failed to parse Turtle input: {0}")]
    Parse(String),

    /// An operation was attempted before its required state existed,
    /// e.g. `%validate` with an empty graph or a query without an endpoint.
    #[error("{0}")]
    Precondition(String),

    /// Opaque failure surfaced from the remote SPARQL endpoint.
    #[error("SPARQL request failed: {0}")]
    RemoteQuery(String),

    /// Anything else caught at the router boundary.
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl KernelError {
    /// Stable error name reported in the cycle outcome.
    pub fn name(&self) -> &'static str {
        match self {
            KernelError::Parse(_) => "ParseError",
            KernelError::Precondition(_) => "PreconditionError",
            KernelError::RemoteQuery(_) => "RemoteQueryError",
            KernelError::Internal(_) => "InternalError",
        }
    }

    /// Formatted trace lines for the outcome and the stderr notification.
    pub fn trace(&self) -> Vec<String> {
        match self {
            KernelError::Internal(err) => {
                let mut lines = vec![format!("InternalError: {err}")];
                lines.extend(err.chain().skip(1).map(|cause| format!("  caused by: {cause}")));
                lines
            }
            other => vec![format!("{}: {}", other.name(), other)],
        }
    }
}

impl From<oxigraph::store::StorageError> for KernelError {
    fn from(err: oxigraph::store::StorageError) -> Self {
        KernelError::Internal(anyhow::Error::new(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_stable() {
        assert_eq!(KernelError::Parse(String::new()).name(), "ParseError");
        assert_eq!(
            KernelError::Precondition(String::new()).name(),
            "PreconditionError"
        );
        assert_eq!(
            KernelError::RemoteQuery(String::new()).name(),
            "RemoteQueryError"
        );
        assert_eq!(
            KernelError::Internal(anyhow::anyhow!("boom")).name(),
            "InternalError"
        );
    }

    #[test]
    fn trace_includes_cause_chain() {
        let inner = anyhow::anyhow!("root cause").context("outer context");
        let trace = KernelError::Internal(inner).trace();
        assert_eq!(trace.len(), 2);
        assert!(trace[0].contains("outer context"));
        assert!(trace[1].contains("root cause"));
    }
}
