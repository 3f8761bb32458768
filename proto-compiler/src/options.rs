//! Knobs a caller sets before driving a [`crate::Compiler`] (spec §6
//! "Compiler entry point").

use proto_resolve::AnyResolver;

/// How much `SourceCodeInfo` a compiled [`prost_types::FileDescriptorProto`]
/// carries (spec §6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SourceInfoMode {
    /// No `source_code_info` at all — the default, since most callers only
    /// want the typed descriptors.
    #[default]
    None,
    /// One `Location` per declaration, spans only, the way `protoc` behaves
    /// without `--include_source_info`.
    Standard,
    /// `Standard` plus leading/trailing/detached comment text attached to
    /// each `Location`, the way `protoc --include_source_info` +
    /// doc-comment extraction tools expect.
    ExtraComments,
}

/// Everything a compile run needs besides the list of files to compile.
///
/// Grounded on `mr-reviewer`'s own top-level options struct shape (one
/// struct bundling resolver/concurrency/output knobs, passed once to the
/// pipeline's entry point rather than threaded argument-by-argument).
#[derive(Clone)]
pub struct CompilerOptions {
    /// Turns an `import "..."` path into file bytes.
    pub resolver: AnyResolver,
    /// Upper bound on concurrently running per-file compile queries.
    /// `<= 0` means unbounded, matching [`proto_exec::Executor::new`].
    pub max_parallelism: isize,
    pub source_info_mode: SourceInfoMode,
    /// Keep each file's parsed [`crate::RetainedAst`] in its
    /// [`crate::CompiledFile`] instead of dropping it once lowering
    /// finishes.
    pub retain_ast: bool,
}

impl CompilerOptions {
    pub fn new(resolver: AnyResolver) -> Self {
        Self {
            resolver,
            max_parallelism: 8,
            source_info_mode: SourceInfoMode::None,
            retain_ast: false,
        }
    }

    pub fn with_max_parallelism(mut self, max_parallelism: isize) -> Self {
        self.max_parallelism = max_parallelism;
        self
    }

    pub fn with_source_info_mode(mut self, mode: SourceInfoMode) -> Self {
        self.source_info_mode = mode;
        self
    }

    pub fn with_retain_ast(mut self, retain_ast: bool) -> Self {
        self.retain_ast = retain_ast;
        self
    }
}
