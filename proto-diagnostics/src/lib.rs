//! Diagnostic collection and the error taxonomy consumed by every other
//! compiler crate (spec §6 "Diagnostic output", §7 "Error handling design").

pub mod diagnostic;
pub mod errors;
pub mod reporter;
pub mod span;

pub use diagnostic::{Diagnostic, DiagnosticKind, Severity};
pub use errors::{CompileError, ExecutorError, ResolveError, Result};
pub use reporter::{CollectingReporter, FailFastReporter, Reporter};
pub use span::Span;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_spans_takes_outer_bounds() {
        let a = Span::new("a.proto", 1, 1, 1, 5, 0, 4);
        let b = Span::new("a.proto", 1, 6, 1, 10, 5, 9);
        let merged = Span::merge(&a, &b);
        assert_eq!(merged.start_offset, 0);
        assert_eq!(merged.end_offset, 9);
    }

    #[test]
    fn collecting_reporter_continues_past_errors() {
        let mut reporter = CollectingReporter::new();
        let span = Span::point("a.proto", 1, 1, 0);
        assert!(
            reporter
                .report(Diagnostic::error(DiagnosticKind::Parse, span.clone(), "boom"))
                .is_none()
        );
        assert!(
            reporter
                .report(Diagnostic::warning(DiagnosticKind::Lex, span, "heads up"))
                .is_none()
        );
        assert_eq!(reporter.diagnostics().len(), 2);
        assert!(reporter.into_result().is_err());
    }

    #[test]
    fn collecting_reporter_ok_when_only_warnings() {
        let mut reporter = CollectingReporter::new();
        let span = Span::point("a.proto", 1, 1, 0);
        reporter.report(Diagnostic::warning(DiagnosticKind::Link, span, "unused import"));
        assert!(reporter.into_result().is_ok());
    }

    #[test]
    fn fail_fast_reporter_aborts_on_first_error() {
        let mut reporter = FailFastReporter::new();
        let span = Span::point("a.proto", 1, 1, 0);
        assert!(
            reporter
                .report(Diagnostic::error(DiagnosticKind::Structural, span, "dup"))
                .is_some()
        );
    }
}
