//! Import-path resolution (spec §6): turning the string on an `import
//! "..."` line into file bytes.
//!
//! `Resolver` is deliberately a plain synchronous trait returning raw
//! bytes, not a pre-parsed AST or descriptor — decoupling this crate from
//! `proto-ast`/`proto-ir` avoids a dependency cycle (`proto-ir` needs to
//! resolve imports while it's lowering, and `proto-resolve` must not in
//! turn depend on `proto-ir`'s types). Any caching of higher-level layers
//! (parsed AST, linked descriptors) belongs to the executor that drives a
//! compilation, not to the resolver itself.

use proto_diagnostics::ResolveError;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Something that can turn an import path into file bytes.
pub trait Resolver {
    /// Reads the file at `path`, where `path` is exactly the string that
    /// appeared on an `import` statement (forward-slash separated,
    /// relative to whichever import root resolves it).
    fn open(&self, path: &str) -> Result<Vec<u8>, ResolveError>;
}

/// Resolves import paths against an ordered list of filesystem
/// directories, first match wins — mirroring protoc's `-I`/`--proto_path`
/// semantics.
#[derive(Debug, Clone, Default)]
pub struct DirectoryResolver {
    roots: Vec<PathBuf>,
}

impl DirectoryResolver {
    pub fn new(roots: Vec<PathBuf>) -> Self {
        Self { roots }
    }

    pub fn add_root(&mut self, root: impl Into<PathBuf>) -> &mut Self {
        self.roots.push(root.into());
        self
    }
}

impl Resolver for DirectoryResolver {
    fn open(&self, path: &str) -> Result<Vec<u8>, ResolveError> {
        for root in &self.roots {
            let candidate = join_import_path(root, path);
            match std::fs::read(&candidate) {
                Ok(bytes) => {
                    debug!(path, candidate = %candidate.display(), "resolved import");
                    return Ok(bytes);
                }
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => continue,
                Err(err) => return Err(ResolveError::Io(err.to_string())),
            }
        }

        Err(ResolveError::NotFound(path.to_string()))
    }
}

fn join_import_path(root: &Path, path: &str) -> PathBuf {
    let mut candidate = root.to_path_buf();
    for component in path.split('/') {
        candidate.push(component);
    }
    candidate
}

/// Serves the well-known `.proto` sources embedded in this crate (spec
/// §6's "well-known types" list), independent of any caller-supplied
/// import path.
#[derive(Debug, Clone, Copy, Default)]
pub struct WellKnownTypesResolver;

impl Resolver for WellKnownTypesResolver {
    fn open(&self, path: &str) -> Result<Vec<u8>, ResolveError> {
        crate::well_known::lookup(path)
            .map(|text| text.as_bytes().to_vec())
            .ok_or_else(|| ResolveError::NotFound(path.to_string()))
    }
}

/// Concrete resolver with enum dispatch, combining a user-supplied
/// resolution strategy with the built-in well-known-types fallback.
///
/// Mirrors the provider-facade pattern used elsewhere in this codebase for
/// fanning out to one of several concrete implementations without a boxed
/// trait object: a fixed enum of variants, one inherent method per
/// operation, dispatched with a `match`.
#[derive(Debug, Clone)]
pub enum AnyResolver {
    Directory(DirectoryResolver),
    WellKnown(WellKnownTypesResolver),
    Composite(CompositeResolver),
}

impl Resolver for AnyResolver {
    fn open(&self, path: &str) -> Result<Vec<u8>, ResolveError> {
        match self {
            Self::Directory(r) => r.open(path),
            Self::WellKnown(r) => r.open(path),
            Self::Composite(r) => r.open(path),
        }
    }
}

/// Tries each resolver in order, returning the first successful read and
/// only reporting [`ResolveError::NotFound`] if every one of them misses.
///
/// Built with the well-known-types resolver appended last by
/// [`CompositeResolver::with_well_known_types`] so a caller-supplied
/// import root can still shadow a well-known type on purpose.
#[derive(Debug, Clone, Default)]
pub struct CompositeResolver {
    resolvers: Vec<AnyResolver>,
}

impl CompositeResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, resolver: AnyResolver) -> &mut Self {
        self.resolvers.push(resolver);
        self
    }

    /// Convenience constructor: a [`DirectoryResolver`] over `roots`,
    /// falling back to the embedded well-known types.
    pub fn with_well_known_types(roots: Vec<PathBuf>) -> Self {
        let mut composite = Self::new();
        composite.push(AnyResolver::Directory(DirectoryResolver::new(roots)));
        composite.push(AnyResolver::WellKnown(WellKnownTypesResolver));
        composite
    }
}

impl Resolver for CompositeResolver {
    fn open(&self, path: &str) -> Result<Vec<u8>, ResolveError> {
        let mut last_io_error = None;

        for resolver in &self.resolvers {
            match resolver.open(path) {
                Ok(bytes) => return Ok(bytes),
                Err(ResolveError::NotFound(_)) => continue,
                Err(err @ ResolveError::Io(_)) => last_io_error = Some(err),
            }
        }

        Err(last_io_error.unwrap_or_else(|| ResolveError::NotFound(path.to_string())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn well_known_resolver_serves_any_proto() {
        let resolver = WellKnownTypesResolver;
        let bytes = resolver.open("google/protobuf/any.proto").unwrap();
        assert!(String::from_utf8(bytes).unwrap().contains("message Any"));
    }

    #[test]
    fn well_known_resolver_misses_unknown_path() {
        let resolver = WellKnownTypesResolver;
        assert!(matches!(
            resolver.open("not/a/real/path.proto"),
            Err(ResolveError::NotFound(_))
        ));
    }

    #[test]
    fn composite_falls_back_to_well_known_types() {
        let composite = CompositeResolver::with_well_known_types(vec![PathBuf::from(
            "/nonexistent/root/for/this/test",
        )]);
        assert!(composite.open("google/protobuf/duration.proto").is_ok());
    }

    #[test]
    fn composite_reports_not_found_when_nothing_matches() {
        let composite = CompositeResolver::with_well_known_types(vec![PathBuf::from(
            "/nonexistent/root/for/this/test",
        )]);
        assert!(matches!(
            composite.open("widgets/widget.proto"),
            Err(ResolveError::NotFound(_))
        ));
    }

    #[test]
    fn directory_resolver_joins_components_per_platform_separator() {
        let dir = std::env::temp_dir().join("proto_resolve_test_root");
        let nested = dir.join("pkg");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(nested.join("widget.proto"), b"syntax = \"proto3\";").unwrap();

        let resolver = DirectoryResolver::new(vec![dir.clone()]);
        let bytes = resolver.open("pkg/widget.proto").unwrap();
        assert_eq!(bytes, b"syntax = \"proto3\";");

        std::fs::remove_dir_all(&dir).ok();
    }
}
