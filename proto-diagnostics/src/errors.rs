//! Error taxonomy (spec §7), grouped by *cause* rather than by the phase that
//! happened to detect it.

use crate::diagnostic::Diagnostic;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CompileError>;

/// The aggregate error returned by a compile run.
///
/// Compilation returns this even when individual [`crate::Reporter::report`]
/// calls suppressed their error (spec §7's "invalid_source" sentinel rule):
/// seeing any error-severity diagnostic is enough to fail the overall run.
#[derive(Debug, Error)]
pub enum CompileError {
    /// One or more diagnostics of error severity were reported.
    #[error("{} error(s) reported during compilation", .0.iter().filter(|d| d.is_error()).count())]
    Diagnostics(Vec<Diagnostic>),

    /// The resolver could not locate or read a requested file.
    #[error("io error resolving {path}: {source}")]
    Resolve {
        path: String,
        #[source]
        source: ResolveError,
    },

    /// A dependency cycle was detected among either imports or queries.
    #[error("cycle found in imports: {}", .0.join(" -> "))]
    ImportCycle(Vec<String>),

    /// The incremental executor itself failed (cycle, cancellation, panic).
    #[error(transparent)]
    Executor(#[from] ExecutorError),
}

/// I/O-flavored failures reaching through a [`proto_resolve`]-style resolver.
///
/// (`proto-diagnostics` is the lowest crate in the dependency graph, so this
/// taxonomy lives here rather than depending on `proto-resolve` itself.)
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("file not found: {0}")]
    NotFound(String),
    #[error("io error: {0}")]
    Io(String),
}

/// Failures originating in the incremental query executor (spec §4.7, §7).
#[derive(Debug, Error, Clone)]
pub enum ExecutorError {
    #[error("cycle in query graph: {}", .0.join(" -> "))]
    Cycle(Vec<String>),

    #[error("compilation was cancelled: {0}")]
    Cancelled(String),

    #[error("internal panic while running query {key}: {message}")]
    Panic { key: String, message: String },
}
