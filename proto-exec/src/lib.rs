//! Keyed, memoizing incremental query executor (spec §4.7, §5).
//!
//! This crate knows nothing about lexing, parsing, or linking `.proto`
//! files — it provides the scheduling primitive `proto-compiler` uses to
//! run those phases with bounded parallelism, result memoization, and
//! cycle detection across a whole compilation graph.

mod call_stack;
mod context;
mod executor;

pub use context::{CancellationToken, Context};
pub use executor::{Executor, QueryResult};

pub use proto_diagnostics::ExecutorError;
