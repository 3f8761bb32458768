//! Orchestrates one compile run (spec §4.7, §6): resolves each requested
//! file and its transitive imports through a single
//! [`proto_exec::Executor`] query — "fully compile file X" — so cross-file
//! dependencies, memoization, bounded parallelism, and cycle detection all
//! fall out of the executor's own contract instead of being reimplemented
//! here.
//!
//! 1) Resolve — turn a path into source bytes via the caller's [`AnyResolver`].
//! 2) Parse — lex + parse into a span-accurate AST (`proto-ast`).
//! 3) Lower — build this file's own [`DescriptorPool`] (`proto-ir`).
//! 4) Resolve imports — recursively compile each `import`, concurrently,
//!    memoized by the same executor so a diamond-shaped import graph only
//!    compiles each file once.
//! 5) Link — resolve type references against the shared symbol table
//!    (`proto-ir::linker`).
//! 6) Interpret options — turn `UninterpretedOption`s into typed fields
//!    (`proto-options`).
//! 7) Finish — rebuild the pool's embedded `FileDescriptorProto` bottom-up
//!    and attach `source_code_info` if requested.

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::BoxFuture;
use tracing::debug;

use proto_ast::{parse_source, Ast, AstView, SourceFile};
use proto_diagnostics::{CollectingReporter, Diagnostic, DiagnosticKind, ExecutorError, Reporter};
use proto_exec::{CancellationToken, Context, Executor};
use proto_ir::{lower_file, symbol_table::SymbolTable, DescriptorPool};
use proto_options::{
    interpret_enum_options, interpret_enum_value_options, interpret_field_options, interpret_file_options,
    interpret_message_options, interpret_method_options, interpret_oneof_options, interpret_service_options,
    resolve_features, FeatureDefaults, InterpretMode, OptionsContext,
};
use proto_resolve::{AnyResolver, Resolver};
use prost_types::{EnumOptions, EnumValueOptions, FeatureSet, FieldOptions, FileOptions, MessageOptions, MethodOptions, OneofOptions, ServiceOptions};

use crate::options::{CompilerOptions, SourceInfoMode};

/// One file's parsed tree, kept alongside its source when
/// [`CompilerOptions::retain_ast`] is set.
pub struct RetainedAst {
    pub source: SourceFile,
    pub ast: Ast,
}

/// Result of compiling one requested (or transitively imported) file.
/// `pool` is `None` when compilation failed before a descriptor pool could
/// be produced at all — the reason is always in the accompanying
/// [`CompileOutcome::diagnostics`].
pub struct CompiledFile {
    pub path: String,
    pub pool: Option<Arc<DescriptorPool>>,
    pub unused_imports: Vec<String>,
    pub ast: Option<Arc<RetainedAst>>,
}

/// Every per-file result from one [`Compiler::compile`] call, plus every
/// diagnostic raised anywhere in the run.
pub struct CompileOutcome {
    pub files: Vec<CompiledFile>,
    pub diagnostics: Vec<Diagnostic>,
    executor_errors: Vec<ExecutorError>,
}

impl CompileOutcome {
    /// Collapses this outcome into the spec's result shape: `Ok` only if no
    /// error-severity diagnostic was raised and no query failed outright.
    pub fn into_result(self) -> proto_diagnostics::Result<Vec<CompiledFile>> {
        use proto_diagnostics::CompileError;

        for err in self.executor_errors {
            return Err(match err {
                ExecutorError::Cycle(path) => CompileError::ImportCycle(path),
                other => CompileError::Executor(other),
            });
        }
        if self.diagnostics.iter().any(Diagnostic::is_error) {
            return Err(CompileError::Diagnostics(self.diagnostics));
        }
        Ok(self.files)
    }
}

/// One memoized query's worth of result: the value type of the executor
/// this module drives internally. Kept private — callers see
/// [`CompiledFile`] instead, which doesn't need to be `Clone`.
#[derive(Clone)]
struct FileOutput {
    pool: Option<Arc<DescriptorPool>>,
    diagnostics: Vec<Diagnostic>,
    unused_imports: Vec<String>,
    ast: Option<Arc<RetainedAst>>,
}

struct Shared {
    resolver: AnyResolver,
    table: SymbolTable,
    executor: Executor<String, FileOutput>,
    source_info_mode: SourceInfoMode,
    retain_ast: bool,
}

/// Drives compile runs over a fixed [`CompilerOptions`]. Cheap to clone —
/// everything it owns is behind `Arc`, matching the executor's own
/// shared-behind-`Arc` design (spec §5's "single executor instance per
/// compile run" read loosely as "per `Compiler`", since nothing here stops
/// reusing one across several `compile` calls for warm caching).
#[derive(Clone)]
pub struct Compiler {
    shared: Arc<Shared>,
}

impl Compiler {
    pub fn new(options: CompilerOptions) -> Self {
        Self {
            shared: Arc::new(Shared {
                resolver: options.resolver,
                table: SymbolTable::new(),
                executor: Executor::new(options.max_parallelism),
                source_info_mode: options.source_info_mode,
                retain_ast: options.retain_ast,
            }),
        }
    }

    /// Compiles every path in `paths`, plus whatever they transitively
    /// import, as one `Run` (spec §4.7). Never returns early on a per-file
    /// error — call [`CompileOutcome::into_result`] to collapse the result
    /// once every file has had a chance to report its own diagnostics.
    pub async fn compile(&self, paths: impl IntoIterator<Item = impl Into<String>>) -> CompileOutcome {
        let paths: Vec<String> = paths.into_iter().map(Into::into).collect();
        let (_run_id, ctx) = self.shared.executor.begin_run(CancellationToken::new());

        let queries = paths
            .iter()
            .cloned()
            .map(|path| {
                let shared = self.shared.clone();
                let compute_path = path.clone();
                (path, move |ctx: Context| compile_one(shared, compute_path, ctx))
            })
            .collect();

        let results = self.shared.executor.resolve_many(&ctx, queries).await;

        let mut files = Vec::with_capacity(paths.len());
        let mut diagnostics = Vec::new();
        let mut executor_errors = Vec::new();

        for (path, result) in paths.into_iter().zip(results) {
            match result {
                Ok(query_result) => {
                    let output = query_result.value;
                    diagnostics.extend(output.diagnostics);
                    files.push(CompiledFile {
                        path,
                        pool: output.pool,
                        unused_imports: output.unused_imports,
                        ast: output.ast,
                    });
                }
                Err(err) => {
                    debug!(path, error = %err, "file query failed");
                    executor_errors.push(err);
                }
            }
        }

        CompileOutcome {
            files,
            diagnostics,
            executor_errors,
        }
    }
}

/// Drains `target`'s existing `uninterpreted_option` list through one of
/// `proto-options`' `interpret_*_options` functions and writes the leftover
/// (custom/extension options, or everything if an error aborted early) back.
/// Returns `false` if interpretation failed (already reported to
/// `reporter`), in which case the caller should stop processing this file.
///
/// `$target` is taken out of the pool before `$ctx` is built, so the
/// structural name-path walker's read of the *whole* pool (`$ctx.current`)
/// never overlaps with this element's own `&mut ...options` borrow of it.
macro_rules! interpret_opts {
    ($target:expr, $span:expr, $mode:expr, $reporter:expr, $func:path, $table:expr, $files:expr, $current_name:expr, $current:expr, $extendee:expr) => {{
        let mut taken = $target.take();
        let raw = taken.as_ref().map(|o| o.uninterpreted_option.clone()).unwrap_or_default();
        // Built only now, after `$target` has already been taken out of the
        // pool above — so this borrow of the *whole* pool (for structural
        // name-path resolution against sibling elements) never overlaps
        // with `$target`'s own `&mut` borrow of one pool field.
        let ctx = OptionsContext { table: $table, files: $files, current_name: $current_name, current: $current, extendee: $extendee };
        match $func(&mut taken, raw, $span, $mode, &ctx, $reporter) {
            Ok(leftover) => {
                if let Some(opts) = taken.as_mut() {
                    opts.uninterpreted_option = leftover;
                }
                *$target = taken;
                true
            }
            Err(_) => false,
        }
    }};
}

fn retained_ast(shared: &Shared, source: SourceFile, ast: Ast) -> Option<Arc<RetainedAst>> {
    shared.retain_ast.then(|| Arc::new(RetainedAst { source, ast }))
}

/// The published `descriptor.proto` edition defaults for the two editions
/// this compiler recognizes, as plain `FeatureSet` enum values (each feature
/// field is `Option<i32>` on the generated type, same as every other
/// enum-valued field this workspace reads — see `features.rs`'s own tests).
/// `edition_cmp`-ordered ascending, as `resolve_features`'s per-field lookup
/// requires.
///
/// EXPLICIT = 1, IMPLICIT = 2; OPEN = 1; PACKED = 1; VERIFY = 2;
/// LENGTH_PREFIXED = 1; ALLOW = 1 (upstream `descriptor.proto`'s
/// `FeatureSet` enum numbering).
fn edition_feature_defaults() -> FeatureDefaults {
    FeatureDefaults {
        field_presence: vec![("2023", 1), ("2024", 2)],
        enum_type: vec![("2023", 1)],
        repeated_field_encoding: vec![("2023", 1)],
        utf8_validation: vec![("2023", 2)],
        message_encoding: vec![("2023", 1)],
        json_format: vec![("2023", 1)],
    }
}

/// Resolves every element's effective `FeatureSet` for an editions file
/// (spec §4.6, "Editions features inheritance") and writes it into that
/// element's options, walking the pool's flat arenas in parent-before-child
/// order — lowering always pushes a message/enum/service before recursing
/// into what it owns, so each parent's resolved set is already available
/// when its children are reached.
fn apply_editions_features(pool: &mut DescriptorPool, edition: &str) {
    let defaults = edition_feature_defaults();
    let root = FeatureSet::default();

    let file_features = resolve_features(pool.file.options.as_ref().and_then(|o| o.features.as_ref()), &root, edition, &defaults);
    pool.file.options.get_or_insert_with(FileOptions::default).features = Some(file_features.clone());

    let mut resolved_messages = Vec::with_capacity(pool.messages.len());
    for i in 0..pool.messages.len() {
        let parent = pool.messages[i].parent.map(|p| resolved_messages[p.0 as usize].clone()).unwrap_or_else(|| file_features.clone());
        let explicit = pool.messages[i].proto.options.as_ref().and_then(|o| o.features.as_ref()).cloned();
        let resolved = resolve_features(explicit.as_ref(), &parent, edition, &defaults);
        pool.messages[i].proto.options.get_or_insert_with(MessageOptions::default).features = Some(resolved.clone());
        resolved_messages.push(resolved);
    }

    for i in 0..pool.fields.len() {
        let parent = pool.fields[i].parent.map(|p| resolved_messages[p.0 as usize].clone()).unwrap_or_else(|| file_features.clone());
        let explicit = pool.fields[i].proto.options.as_ref().and_then(|o| o.features.as_ref()).cloned();
        let resolved = resolve_features(explicit.as_ref(), &parent, edition, &defaults);
        pool.fields[i].proto.options.get_or_insert_with(FieldOptions::default).features = Some(resolved);
    }

    for i in 0..pool.oneofs.len() {
        let parent = resolved_messages[pool.oneofs[i].parent.0 as usize].clone();
        let explicit = pool.oneofs[i].proto.options.as_ref().and_then(|o| o.features.as_ref()).cloned();
        let resolved = resolve_features(explicit.as_ref(), &parent, edition, &defaults);
        pool.oneofs[i].proto.options.get_or_insert_with(OneofOptions::default).features = Some(resolved);
    }

    let mut resolved_enums = Vec::with_capacity(pool.enums.len());
    for i in 0..pool.enums.len() {
        let parent = pool.enums[i].parent.map(|p| resolved_messages[p.0 as usize].clone()).unwrap_or_else(|| file_features.clone());
        let explicit = pool.enums[i].proto.options.as_ref().and_then(|o| o.features.as_ref()).cloned();
        let resolved = resolve_features(explicit.as_ref(), &parent, edition, &defaults);
        pool.enums[i].proto.options.get_or_insert_with(EnumOptions::default).features = Some(resolved.clone());
        resolved_enums.push(resolved);
    }

    for i in 0..pool.enum_values.len() {
        let parent = resolved_enums[pool.enum_values[i].parent.0 as usize].clone();
        let explicit = pool.enum_values[i].proto.options.as_ref().and_then(|o| o.features.as_ref()).cloned();
        let resolved = resolve_features(explicit.as_ref(), &parent, edition, &defaults);
        pool.enum_values[i].proto.options.get_or_insert_with(EnumValueOptions::default).features = Some(resolved);
    }

    let mut resolved_services = Vec::with_capacity(pool.services.len());
    for i in 0..pool.services.len() {
        let explicit = pool.services[i].proto.options.as_ref().and_then(|o| o.features.as_ref()).cloned();
        let resolved = resolve_features(explicit.as_ref(), &file_features, edition, &defaults);
        pool.services[i].proto.options.get_or_insert_with(ServiceOptions::default).features = Some(resolved.clone());
        resolved_services.push(resolved);
    }

    for i in 0..pool.methods.len() {
        let parent = resolved_services[pool.methods[i].parent.0 as usize].clone();
        let explicit = pool.methods[i].proto.options.as_ref().and_then(|o| o.features.as_ref()).cloned();
        let resolved = resolve_features(explicit.as_ref(), &parent, edition, &defaults);
        pool.methods[i].proto.options.get_or_insert_with(MethodOptions::default).features = Some(resolved);
    }
}

/// Compiles a single file, recursively resolving its imports through the
/// same executor. Boxed because it recurses indirectly through
/// [`Executor::resolve`]'s generic `compute` closure — an `async fn` that
/// calls itself (even through another layer) has no finite-sized future
/// otherwise.
fn compile_one(shared: Arc<Shared>, path: String, ctx: Context) -> BoxFuture<'static, Result<FileOutput, ExecutorError>> {
    Box::pin(async move {
        ctx.check_cancelled()?;

        let mut diagnostics = Vec::new();

        // Resolver I/O is synchronous (filesystem reads, typically) and may
        // block for a while; running it inline on the async worker would
        // hold this query's semaphore permit for the duration. Spec §5
        // calls resolver I/O a suspension point, so it runs on the blocking
        // pool instead, the same way a worker frees its slot while waiting
        // on a peer via `Context::suspend`.
        let blocking_resolver = shared.resolver.clone();
        let blocking_path = path.clone();
        let open_result = tokio::task::spawn_blocking(move || blocking_resolver.open(&blocking_path)).await;

        let bytes = match open_result {
            Ok(Ok(bytes)) => bytes,
            Ok(Err(err)) => {
                diagnostics.push(Diagnostic::error(
                    DiagnosticKind::Io,
                    proto_diagnostics::Span::point(path.clone(), 1, 1, 0),
                    format!("could not resolve {path}: {err}"),
                ));
                return Ok(FileOutput {
                    pool: None,
                    diagnostics,
                    unused_imports: Vec::new(),
                    ast: None,
                });
            }
            Err(join_err) => {
                diagnostics.push(Diagnostic::error(
                    DiagnosticKind::Io,
                    proto_diagnostics::Span::point(path.clone(), 1, 1, 0),
                    format!("resolver task for {path} failed: {join_err}"),
                ));
                return Ok(FileOutput {
                    pool: None,
                    diagnostics,
                    unused_imports: Vec::new(),
                    ast: None,
                });
            }
        };

        let text = String::from_utf8_lossy(&bytes).into_owned();
        let (source, parse_out, lex_errors) = parse_source(path.clone(), text);

        for err in &lex_errors {
            diagnostics.push(Diagnostic::error(DiagnosticKind::Lex, err.span.clone(), err.error.to_string()));
        }
        for err in &parse_out.errors {
            diagnostics.push(Diagnostic::error(DiagnosticKind::Parse, err.span.clone(), err.error.to_string()));
        }

        let view = AstView::new(&parse_out.ast, &source);
        let root = view.root();

        let mut dependencies = Vec::new();
        let mut public_indices = Vec::new();
        let mut weak_indices = Vec::new();
        for (i, import) in root.imports().enumerate() {
            dependencies.push(import.path());
            if import.is_public() {
                public_indices.push(i as i32);
            }
            if import.is_weak() {
                weak_indices.push(i as i32);
            }
        }

        let mut reporter = CollectingReporter::new();
        let mut pool = lower_file(view, &path, dependencies.clone(), public_indices, weak_indices, &mut reporter);

        let import_queries = dependencies
            .iter()
            .cloned()
            .map(|dep| {
                let shared = shared.clone();
                let compute_dep = dep.clone();
                (dep, move |ctx: Context| compile_one(shared, compute_dep, ctx))
            })
            .collect();

        let import_results = shared.executor.resolve_many(&ctx, import_queries).await;

        let mut dependency_pools: HashMap<String, Arc<DescriptorPool>> = HashMap::new();
        for (dep, result) in dependencies.iter().zip(import_results) {
            match result {
                Ok(query_result) => {
                    diagnostics.extend(query_result.value.diagnostics.clone());
                    if let Some(dep_pool) = query_result.value.pool {
                        dependency_pools.insert(dep.clone(), dep_pool);
                    }
                }
                Err(err) => return Err(err),
            }
        }

        if let Some(package) = pool.file.package.clone() {
            if let Err(err) = shared.table.import_packages(&package) {
                diagnostics.push(Diagnostic::error(DiagnosticKind::Link, source.point_span(0), err.to_string()));
                let ast = retained_ast(&shared, source, parse_out.ast);
                return Ok(FileOutput {
                    pool: None,
                    diagnostics,
                    unused_imports: Vec::new(),
                    ast,
                });
            }
        }

        if shared.table.import_file(&path, &pool, &mut reporter).is_err() {
            diagnostics.extend(reporter.diagnostics().iter().cloned());
            let ast = retained_ast(&shared, source, parse_out.ast);
            return Ok(FileOutput {
                pool: None,
                diagnostics,
                unused_imports: Vec::new(),
                ast,
            });
        }

        // A file may reference symbols from itself, its own direct imports,
        // and anything those imports re-export via `import public` — never
        // a dependency's *private* import (spec §4.5). Each dependency's
        // `visible_files` already holds its own public re-export closure, so
        // folding those in (regardless of whether *this* file's own import
        // of that dependency happens to be public) gives exactly that set.
        let mut allowed_files: std::collections::HashSet<String> = std::collections::HashSet::new();
        let mut exported_files: std::collections::HashSet<String> = std::collections::HashSet::new();
        exported_files.insert(path.clone());
        let public_dep_indices: std::collections::HashSet<i32> = pool.file.public_dependency.iter().copied().collect();
        for (i, dep) in dependencies.iter().enumerate() {
            if let Some(dep_pool) = dependency_pools.get(dep) {
                allowed_files.insert(dep.clone());
                allowed_files.extend(dep_pool.visible_files.iter().cloned());
                if public_dep_indices.contains(&(i as i32)) {
                    exported_files.insert(dep.clone());
                    exported_files.extend(dep_pool.visible_files.iter().cloned());
                }
            }
        }
        pool.visible_files = exported_files;

        let linked = match proto_ir::link_file(&path, &mut pool, &shared.table, &dependency_pools, &allowed_files, &mut reporter) {
            Ok(linked) => linked,
            Err(_) => {
                diagnostics.extend(reporter.diagnostics().iter().cloned());
                let ast = retained_ast(&shared, source, parse_out.ast);
                return Ok(FileOutput {
                    pool: None,
                    diagnostics,
                    unused_imports: Vec::new(),
                    ast,
                });
            }
        };

        let mode = InterpretMode::Strict;
        let mut ok = true;

        if ok {
            let span = source.point_span(0);
            ok = interpret_opts!(
                &mut pool.file.options, &span, mode, &mut reporter, interpret_file_options,
                &shared.table, &dependency_pools, &path, &pool, ".google.protobuf.FileOptions"
            );
        }
        if ok {
            for i in 0..pool.messages.len() {
                let span = pool.messages[i].span.clone();
                if !interpret_opts!(
                    &mut pool.messages[i].proto.options, &span, mode, &mut reporter, interpret_message_options,
                    &shared.table, &dependency_pools, &path, &pool, ".google.protobuf.MessageOptions"
                ) {
                    ok = false;
                    break;
                }
            }
        }
        if ok {
            for i in 0..pool.fields.len() {
                let span = pool.fields[i].span.clone();
                if !interpret_opts!(
                    &mut pool.fields[i].proto.options, &span, mode, &mut reporter, interpret_field_options,
                    &shared.table, &dependency_pools, &path, &pool, ".google.protobuf.FieldOptions"
                ) {
                    ok = false;
                    break;
                }
            }
        }
        if ok {
            for i in 0..pool.oneofs.len() {
                let span = pool.oneofs[i].span.clone();
                if !interpret_opts!(
                    &mut pool.oneofs[i].proto.options, &span, mode, &mut reporter, interpret_oneof_options,
                    &shared.table, &dependency_pools, &path, &pool, ".google.protobuf.OneofOptions"
                ) {
                    ok = false;
                    break;
                }
            }
        }
        if ok {
            for i in 0..pool.enums.len() {
                let span = pool.enums[i].span.clone();
                if !interpret_opts!(
                    &mut pool.enums[i].proto.options, &span, mode, &mut reporter, interpret_enum_options,
                    &shared.table, &dependency_pools, &path, &pool, ".google.protobuf.EnumOptions"
                ) {
                    ok = false;
                    break;
                }
            }
        }
        if ok {
            for i in 0..pool.enum_values.len() {
                let span = pool.enum_values[i].span.clone();
                if !interpret_opts!(
                    &mut pool.enum_values[i].proto.options, &span, mode, &mut reporter, interpret_enum_value_options,
                    &shared.table, &dependency_pools, &path, &pool, ".google.protobuf.EnumValueOptions"
                ) {
                    ok = false;
                    break;
                }
            }
        }
        if ok {
            for i in 0..pool.services.len() {
                let span = pool.services[i].span.clone();
                if !interpret_opts!(
                    &mut pool.services[i].proto.options, &span, mode, &mut reporter, interpret_service_options,
                    &shared.table, &dependency_pools, &path, &pool, ".google.protobuf.ServiceOptions"
                ) {
                    ok = false;
                    break;
                }
            }
        }
        if ok {
            for i in 0..pool.methods.len() {
                let span = pool.methods[i].span.clone();
                if !interpret_opts!(
                    &mut pool.methods[i].proto.options, &span, mode, &mut reporter, interpret_method_options,
                    &shared.table, &dependency_pools, &path, &pool, ".google.protobuf.MethodOptions"
                ) {
                    ok = false;
                    break;
                }
            }
        }

        diagnostics.extend(reporter.diagnostics().iter().cloned());

        if !ok {
            let ast = retained_ast(&shared, source, parse_out.ast);
            return Ok(FileOutput {
                pool: None,
                diagnostics,
                unused_imports: linked.unused_imports,
                ast,
            });
        }

        if let Some(edition) = view.root().edition() {
            apply_editions_features(&mut pool, edition);
        }

        pool.finish();

        if let Some(info) = crate::source_info::build(&pool, Some(&source), shared.source_info_mode) {
            pool.file.source_code_info = Some(info);
        }

        let ast = retained_ast(&shared, source, parse_out.ast);

        Ok(FileOutput {
            pool: Some(Arc::new(pool)),
            diagnostics,
            unused_imports: linked.unused_imports,
            ast,
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proto_resolve::DirectoryResolver;
    use std::path::PathBuf;

    fn write(dir: &std::path::Path, name: &str, contents: &str) {
        std::fs::write(dir.join(name), contents).unwrap();
    }

    fn temp_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("proto_compiler_test_{tag}"));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[tokio::test]
    async fn compiles_single_file_with_no_imports() {
        let dir = temp_dir("single");
        write(&dir, "a.proto", "syntax = \"proto3\";\nmessage Ping {}\n");

        let resolver = AnyResolver::Directory(DirectoryResolver::new(vec![dir.clone()]));
        let compiler = Compiler::new(CompilerOptions::new(resolver));
        let outcome = compiler.compile(["a.proto"]).await;
        let files = outcome.into_result().unwrap();

        assert_eq!(files.len(), 1);
        let pool = files[0].pool.as_ref().unwrap();
        assert_eq!(pool.file.message_type[0].name.as_deref(), Some("Ping"));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn resolves_types_across_an_import() {
        let dir = temp_dir("cross_file");
        write(&dir, "a.proto", "syntax = \"proto3\";\npackage pkg;\nmessage Bar {}\n");
        write(
            &dir,
            "b.proto",
            "syntax = \"proto3\";\npackage pkg;\nimport \"a.proto\";\nmessage Foo { Bar b = 1; }\n",
        );

        let resolver = AnyResolver::Directory(DirectoryResolver::new(vec![dir.clone()]));
        let compiler = Compiler::new(CompilerOptions::new(resolver));
        let outcome = compiler.compile(["b.proto"]).await;
        let files = outcome.into_result().unwrap();

        let b = files.iter().find(|f| f.path == "b.proto").unwrap();
        let pool = b.pool.as_ref().unwrap();
        let field = &pool.file.message_type[0].field[0];
        assert_eq!(field.type_name.as_deref(), Some(".pkg.Bar"));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn import_cycle_is_reported() {
        let dir = temp_dir("cycle");
        write(&dir, "a.proto", "syntax = \"proto3\";\nimport \"b.proto\";\nmessage A {}\n");
        write(&dir, "b.proto", "syntax = \"proto3\";\nimport \"a.proto\";\nmessage B {}\n");

        let resolver = AnyResolver::Directory(DirectoryResolver::new(vec![dir.clone()]));
        let compiler = Compiler::new(CompilerOptions::new(resolver));
        let outcome = compiler.compile(["a.proto"]).await;
        let err = outcome.into_result().unwrap_err();

        assert!(matches!(err, proto_diagnostics::CompileError::ImportCycle(_)));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn unresolved_type_reference_surfaces_as_diagnostic() {
        let dir = temp_dir("unresolved");
        write(&dir, "a.proto", "syntax = \"proto3\";\nmessage Foo { Missing m = 1; }\n");

        let resolver = AnyResolver::Directory(DirectoryResolver::new(vec![dir.clone()]));
        let compiler = Compiler::new(CompilerOptions::new(resolver));
        let outcome = compiler.compile(["a.proto"]).await;
        let err = outcome.into_result().unwrap_err();

        assert!(matches!(err, proto_diagnostics::CompileError::Diagnostics(_)));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn diamond_import_compiles_shared_dependency_once() {
        let dir = temp_dir("diamond");
        write(&dir, "base.proto", "syntax = \"proto3\";\npackage pkg;\nmessage Base {}\n");
        write(
            &dir,
            "left.proto",
            "syntax = \"proto3\";\npackage pkg;\nimport \"base.proto\";\nmessage Left { Base b = 1; }\n",
        );
        write(
            &dir,
            "right.proto",
            "syntax = \"proto3\";\npackage pkg;\nimport \"base.proto\";\nmessage Right { Base b = 1; }\n",
        );
        write(
            &dir,
            "top.proto",
            "syntax = \"proto3\";\npackage pkg;\nimport \"left.proto\";\nimport \"right.proto\";\nmessage Top {}\n",
        );

        let resolver = AnyResolver::Directory(DirectoryResolver::new(vec![dir.clone()]));
        let compiler = Compiler::new(CompilerOptions::new(resolver));
        let outcome = compiler.compile(["top.proto"]).await;
        let files = outcome.into_result().unwrap();

        assert_eq!(files.len(), 1);
        assert!(files[0].pool.is_some());

        std::fs::remove_dir_all(&dir).ok();
    }
}
