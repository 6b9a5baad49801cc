use std::fmt;

/// A per-request failure that was absorbed into an outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    Construction(String),
    Transport(String),
    Aborted(String),
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::Construction(e) => write!(f, "failed to build request: {}", e),
            Diagnostic::Transport(e) => write!(f, "request failed: {}", e),
            Diagnostic::Aborted(e) => write!(f, "request task aborted: {}", e),
        }
    }
}

/// Sink for diagnostics raised by request tasks.
pub trait Diagnostics: Send + Sync {
    fn report(&self, diagnostic: Diagnostic);
}

/// Forwards diagnostics to the `tracing` subscriber installed by `main`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingDiagnostics;

impl Diagnostics for TracingDiagnostics {
    fn report(&self, diagnostic: Diagnostic) {
        tracing::error!("{}", diagnostic);
    }
}
