//! Source text for the well-known `.proto` files every compiler front end
//! must be able to resolve without the caller adding an import path for
//! them (spec §6).
//!
//! The text is embedded at compile time so this crate never depends on a
//! filesystem layout that happens to contain a copy of Google's protobuf
//! distribution.

const ANY: &str = include_str!("wkt/any.proto");
const API: &str = include_str!("wkt/api.proto");
const DURATION: &str = include_str!("wkt/duration.proto");
const EMPTY: &str = include_str!("wkt/empty.proto");
const FIELD_MASK: &str = include_str!("wkt/field_mask.proto");
const SOURCE_CONTEXT: &str = include_str!("wkt/source_context.proto");
const STRUCT: &str = include_str!("wkt/struct.proto");
const TIMESTAMP: &str = include_str!("wkt/timestamp.proto");
const TYPE: &str = include_str!("wkt/type.proto");
const WRAPPERS: &str = include_str!("wkt/wrappers.proto");
const DESCRIPTOR: &str = include_str!("wkt/descriptor.proto");
const PLUGIN: &str = include_str!("wkt/compiler/plugin.proto");

/// Every `(import path, source text)` pair this crate can serve without
/// consulting a caller-supplied resolver.
const ENTRIES: &[(&str, &str)] = &[
    ("google/protobuf/any.proto", ANY),
    ("google/protobuf/api.proto", API),
    ("google/protobuf/duration.proto", DURATION),
    ("google/protobuf/empty.proto", EMPTY),
    ("google/protobuf/field_mask.proto", FIELD_MASK),
    ("google/protobuf/source_context.proto", SOURCE_CONTEXT),
    ("google/protobuf/struct.proto", STRUCT),
    ("google/protobuf/timestamp.proto", TIMESTAMP),
    ("google/protobuf/type.proto", TYPE),
    ("google/protobuf/wrappers.proto", WRAPPERS),
    ("google/protobuf/descriptor.proto", DESCRIPTOR),
    ("google/protobuf/compiler/plugin.proto", PLUGIN),
];

/// Looks up a well-known import path, returning its embedded source text.
///
/// `path` is matched verbatim against the canonical form protoc itself
/// uses (forward slashes, no leading slash); callers are expected to have
/// already normalized whatever path separator their own platform uses.
pub fn lookup(path: &str) -> Option<&'static str> {
    ENTRIES
        .iter()
        .find(|(candidate, _)| *candidate == path)
        .map(|(_, text)| *text)
}

/// Import paths this crate can serve without a caller-supplied resolver,
/// in the fixed order they're declared in `ENTRIES`.
pub fn known_paths() -> impl Iterator<Item = &'static str> {
    ENTRIES.iter().map(|(path, _)| *path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_every_advertised_path() {
        for path in known_paths() {
            assert!(lookup(path).is_some(), "missing source for {path}");
        }
    }

    #[test]
    fn unknown_path_is_none() {
        assert!(lookup("google/protobuf/nonexistent.proto").is_none());
    }

    #[test]
    fn any_proto_declares_its_package() {
        let text = lookup("google/protobuf/any.proto").unwrap();
        assert!(text.contains("package google.protobuf;"));
    }
}
