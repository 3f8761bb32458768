//! Diagnostic sinks (spec §6 "Diagnostic output", §7 "Propagation policy").

use crate::diagnostic::Diagnostic;
use crate::errors::CompileError;
use tracing::{error, warn};

/// Receives diagnostics as they occur during compilation.
///
/// `report` returning `Some(error)` aborts compilation immediately with that
/// error. Returning `None` lets compilation continue so multiple diagnostics
/// can surface in one run. Once *any* error-severity diagnostic has been
/// reported, the overall compile result is an error regardless of what
/// individual calls returned — see [`CollectingReporter::into_result`].
pub trait Reporter {
    fn report(&mut self, diagnostic: Diagnostic) -> Option<CompileError>;
}

/// Default reporter: collects every diagnostic, never aborts early, and
/// turns "did we see an error" into the aggregate [`CompileError`] at the end.
#[derive(Debug, Default)]
pub struct CollectingReporter {
    diagnostics: Vec<Diagnostic>,
    saw_error: bool,
}

impl CollectingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn saw_error(&self) -> bool {
        self.saw_error
    }

    /// Converts accumulated diagnostics into the final compile result.
    ///
    /// If no error-severity diagnostic was ever reported, returns `Ok(())`.
    /// Otherwise returns the aggregate [`CompileError::Diagnostics`] — even if
    /// every individual `report()` call returned `None`, matching spec §7's
    /// "invalid_source sentinel" rule.
    pub fn into_result(self) -> Result<Vec<Diagnostic>, CompileError> {
        if self.saw_error {
            Err(CompileError::Diagnostics(self.diagnostics))
        } else {
            Ok(self.diagnostics)
        }
    }
}

impl Reporter for CollectingReporter {
    fn report(&mut self, diagnostic: Diagnostic) -> Option<CompileError> {
        if diagnostic.is_error() {
            self.saw_error = true;
            error!(%diagnostic, "compile error");
        } else {
            warn!(%diagnostic, "compile warning");
        }
        self.diagnostics.push(diagnostic);
        None
    }
}

/// Reporter that aborts on the very first error, used by callers that want
/// fail-fast behavior instead of best-effort multi-error collection.
#[derive(Debug, Default)]
pub struct FailFastReporter {
    diagnostics: Vec<Diagnostic>,
}

impl FailFastReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }
}

impl Reporter for FailFastReporter {
    fn report(&mut self, diagnostic: Diagnostic) -> Option<CompileError> {
        let is_error = diagnostic.is_error();
        if is_error {
            error!(%diagnostic, "compile error (fail-fast)");
        } else {
            warn!(%diagnostic, "compile warning (fail-fast)");
        }
        self.diagnostics.push(diagnostic);
        if is_error {
            Some(CompileError::Diagnostics(self.diagnostics.clone()))
        } else {
            None
        }
    }
}
