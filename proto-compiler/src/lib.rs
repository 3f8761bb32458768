//! Public entry point for the Protocol Buffers compiler pipeline.
//!
//! Single high-level type — [`Compiler`] — runs the whole pipeline for a
//! requested set of `.proto` files.
//!
//! 1) **Step 1 — Resolve + parse**
//!    - Turn each `import "..."` path into bytes via the caller's resolver
//!    - Lex + parse into a span-accurate AST (`proto-ast`)
//!
//! 2) **Step 2 — Lower (per file, independent of imports)**
//!    - Build this file's own [`proto_ir::DescriptorPool`] from its AST
//!
//! 3) **Step 3 — Resolve imports (recursive, memoized)**
//!    - Recursively compile every `import`, concurrently, through the same
//!      incremental executor so a diamond-shaped import graph only compiles
//!      each file once and an import cycle is caught rather than deadlocking
//!
//! 4) **Step 4 — Link + interpret options + finish**
//!    - Resolve type references against the run's shared symbol table
//!      (`proto-ir::linker`)
//!    - Turn `UninterpretedOption`s into typed fields (`proto-options`)
//!    - Rebuild the pool's embedded `FileDescriptorProto` bottom-up and
//!      attach `source_code_info` if requested
//!
//! The pipeline uses `tracing` for debug logging and avoids `async-trait` and
//! heap trait objects (no `Box<dyn ...>`, aside from the one boxed future
//! `compile_one` needs for its own self-recursion). Resolver and executor
//! dispatch are enum-/generic-based rather than trait objects.

mod compiler;
mod options;
mod source_info;

pub use compiler::{CompiledFile, CompileOutcome, Compiler, RetainedAst};
pub use options::{CompilerOptions, SourceInfoMode};

pub use proto_diagnostics::{
    CollectingReporter, CompileError, Diagnostic, DiagnosticKind, Reporter, Result as CompileResult, Severity,
};
