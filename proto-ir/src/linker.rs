//! Reference resolution and post-resolution fix-ups (spec §4.5).
//!
//! Lowering leaves every qualified type reference as an `uninterpreted`
//! `TYPE_MESSAGE` guess (`lower.rs` can't know yet whether `.pkg.Foo` names a
//! message or an enum) and every extension/method untouched. This module
//! resolves those names against a [`SymbolTable`] built from every file in
//! the compilation, retags enum references, and checks the constraints that
//! only make sense once a name is known to resolve.

use crate::errors::IrError;
use crate::pool::{DescriptorPool, MessageIndex};
use crate::symbol_table::{SymbolKind, SymbolTable};
use proto_diagnostics::{Diagnostic, DiagnosticKind, Reporter};
use prost_types::field_descriptor_proto::Type as FieldType;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Outcome of linking one file: the same pool, mutated in place with
/// resolved type tags, plus the imports it declared but never used.
pub struct LinkedFile {
    pub unused_imports: Vec<String>,
}

/// Resolves a (possibly unqualified) type name against the scoping rules in
/// spec §4.5: a leading dot means "fully qualified, look it up directly";
/// otherwise walk from `scope` outward, trying the innermost enclosing scope
/// first. The first scope whose first path component exists at all commits
/// to that scope — if the *full* name doesn't resolve there, resolution
/// halts rather than falling back to an outer scope (the "shallow match"
/// rule), because protoc's C++ implementation behaves the same way and
/// schemas have come to depend on it.
pub fn resolve_type_name(scope: &str, name: &str, table: &SymbolTable) -> Result<SymbolKind, IrError> {
    if let Some(stripped) = name.strip_prefix('.') {
        return table.lookup(stripped).ok_or_else(|| IrError::SymbolNotFound(name.to_string()));
    }

    let first_component = name.split('.').next().unwrap_or(name);

    let mut current = scope.to_string();
    loop {
        let prefix_candidate = if current.is_empty() {
            first_component.to_string()
        } else {
            format!("{current}.{first_component}")
        };
        let shallow_match = table.lookup(&prefix_candidate).is_some() || table.lookup_package(&prefix_candidate).is_some();

        if shallow_match {
            let full_candidate = if current.is_empty() { name.to_string() } else { format!("{current}.{name}") };
            return table.lookup(&full_candidate).ok_or(IrError::ShallowMatchHalt(full_candidate));
        }

        if current.is_empty() {
            break;
        }
        match current.rfind('.') {
            Some(idx) => current.truncate(idx),
            None => current.clear(),
        }
    }

    Err(IrError::SymbolNotFound(name.to_string()))
}

fn scope_of(pool: &DescriptorPool, parent: Option<MessageIndex>) -> String {
    match parent {
        Some(idx) => pool.message(idx).fqn.clone(),
        None => pool.file.package.clone().unwrap_or_default(),
    }
}

fn pool_for<'f>(kind: &SymbolKind, current_name: &str, current: &'f DescriptorPool, files: &'f HashMap<String, Arc<DescriptorPool>>) -> Option<&'f DescriptorPool> {
    if kind.file() == current_name {
        Some(current)
    } else {
        files.get(kind.file()).map(|pool| pool.as_ref())
    }
}

/// A name can resolve to a symbol declared anywhere in the whole
/// compilation's shared table, but spec §4.5 only allows using a symbol
/// declared in the current file, a direct import, or a file reachable
/// through a chain of `import public` statements from a direct import —
/// never a transitive private import. `visible_files` is that precomputed
/// set (see [`crate::pool::DescriptorPool::visible_files`]).
fn check_visible(resolved: &SymbolKind, current_name: &str, visible_files: &HashSet<String>, name: &str) -> Result<(), IrError> {
    if resolved.file() == current_name || visible_files.contains(resolved.file()) {
        Ok(())
    } else {
        Err(IrError::SymbolNotFound(name.to_string()))
    }
}

/// Does `pool.message(index)` have `message_set_wire_format = true`? Reads
/// through the already-interpreted `MessageOptions` when available (a
/// dependency, fully compiled before this file links), and falls back to
/// scanning the raw `uninterpreted_option` list for a same-file extendee,
/// whose options haven't been interpreted yet at link time.
fn message_set_flag(pool: &DescriptorPool, index: MessageIndex) -> bool {
    let Some(opts) = pool.message(index).proto.options.as_ref() else { return false };
    if opts.message_set_wire_format == Some(true) {
        return true;
    }
    opts.uninterpreted_option.iter().any(|uo| {
        uo.name.len() == 1
            && !uo.name[0].is_extension
            && uo.name[0].name_part == "message_set_wire_format"
            && uo.identifier_value.as_deref() == Some("true")
    })
}

/// Links one already-lowered file against the rest of the compilation.
/// `files` holds every other already-linked file's pool, keyed by the name
/// it was lowered under, shared via `Arc` since the executor driving a
/// compilation hands the same completed pool to every dependent query
/// concurrently; `current` is mutated in place.
pub fn link_file<R: Reporter>(
    current_name: &str,
    current: &mut DescriptorPool,
    table: &SymbolTable,
    files: &HashMap<String, Arc<DescriptorPool>>,
    visible_files: &HashSet<String>,
    reporter: &mut R,
) -> Result<LinkedFile, IrError> {
    let is_proto3 = current.file.syntax.as_deref() != Some("proto2");
    let mut used_files: HashSet<String> = HashSet::new();

    let field_count = current.fields.len();
    for i in 0..field_count {
        let (parent, is_message_guess, type_name) = {
            let data = &current.fields[i];
            (
                data.parent,
                data.proto.r#type == Some(FieldType::Message as i32),
                data.proto.type_name.clone(),
            )
        };
        let Some(type_name) = type_name.filter(|_| is_message_guess) else { continue };

        let scope = scope_of(current, parent);
        let resolved = resolve_type_name(&scope, type_name.trim_start_matches('.'), table);
        let resolved = match resolved {
            Ok(r) => r,
            Err(err) => {
                let span = current.fields[i].span.clone();
                reporter.report(Diagnostic::error(DiagnosticKind::Link, span, err.to_string()));
                return Err(err);
            }
        };
        if let Err(err) = check_visible(&resolved, current_name, visible_files, &type_name) {
            let span = current.fields[i].span.clone();
            reporter.report(Diagnostic::error(DiagnosticKind::Link, span, err.to_string()));
            return Err(err);
        }

        if resolved.file() != current_name {
            used_files.insert(resolved.file().to_string());
        }

        match &resolved {
            SymbolKind::Enum { .. } => {
                let enum_pool = pool_for(&resolved, current_name, current, files);
                let fqn = enum_fqn(&resolved, enum_pool);
                if is_proto3 {
                    if let Some(enum_pool) = enum_pool {
                        let enum_is_proto3 = enum_pool.file.syntax.as_deref() != Some("proto2");
                        if !enum_is_proto3 {
                            let field_fqn = current.fields[i].fqn.clone();
                            let err = IrError::Proto3FieldReferencesProto2Enum(field_fqn);
                            let span = current.fields[i].span.clone();
                            reporter.report(Diagnostic::error(DiagnosticKind::Link, span, err.to_string()));
                            return Err(err);
                        }
                    }
                }
                let field = &mut current.fields[i];
                field.proto.r#type = Some(FieldType::Enum as i32);
                field.proto.type_name = Some(fqn);
            }
            SymbolKind::Message { .. } => {
                let fqn = message_fqn(&resolved, pool_for(&resolved, current_name, current, files));
                current.fields[i].proto.type_name = Some(fqn);
            }
            other => {
                let err = IrError::ExpectedMessage(type_name.clone(), other.describe().to_string());
                let span = current.fields[i].span.clone();
                reporter.report(Diagnostic::error(DiagnosticKind::Link, span, err.to_string()));
                return Err(err);
            }
        }
    }

    for i in 0..current.methods.len() {
        let (input, output, span) = {
            let m = &current.methods[i];
            (m.proto.input_type.clone(), m.proto.output_type.clone(), m.span.clone())
        };
        for (label, raw) in [("input", input), ("output", output)] {
            let Some(raw) = raw else { continue };
            let resolved = resolve_type_name("", raw.trim_start_matches('.'), table);
            match resolved {
                Ok(resolved @ SymbolKind::Message { .. }) => {
                    if let Err(err) = check_visible(&resolved, current_name, visible_files, &raw) {
                        reporter.report(Diagnostic::error(DiagnosticKind::Link, span.clone(), err.to_string()));
                        return Err(err);
                    }
                    if resolved.file() != current_name {
                        used_files.insert(resolved.file().to_string());
                    }
                }
                Ok(other) => {
                    let err = IrError::ExpectedMessage(raw.clone(), other.describe().to_string());
                    reporter.report(Diagnostic::error(DiagnosticKind::Link, span.clone(), format!("rpc {label} type: {err}")));
                    return Err(err);
                }
                Err(err) => {
                    reporter.report(Diagnostic::error(DiagnosticKind::Link, span.clone(), err.to_string()));
                    return Err(err);
                }
            }
        }
    }

    for &field_idx in &current.extensions.clone() {
        let (extendee_fqn, tag, span, field_name, field_is_message) = {
            let data = current.field(field_idx);
            (
                data.extendee_fqn.clone().unwrap_or_default(),
                data.proto.number.unwrap_or_default(),
                data.span.clone(),
                data.proto.name.clone().unwrap_or_default(),
                data.proto.r#type == Some(FieldType::Message as i32),
            )
        };
        let resolved = resolve_type_name("", extendee_fqn.trim_start_matches('.'), table);
        let resolved = match resolved {
            Ok(r) => r,
            Err(err) => {
                reporter.report(Diagnostic::error(DiagnosticKind::Link, span.clone(), err.to_string()));
                return Err(err);
            }
        };
        let SymbolKind::Message { .. } = &resolved else {
            let err = IrError::ExpectedMessage(extendee_fqn.clone(), resolved.describe().to_string());
            reporter.report(Diagnostic::error(DiagnosticKind::Link, span.clone(), err.to_string()));
            return Err(err);
        };
        if let Err(err) = check_visible(&resolved, current_name, visible_files, &extendee_fqn) {
            reporter.report(Diagnostic::error(DiagnosticKind::Link, span.clone(), err.to_string()));
            return Err(err);
        }
        if resolved.file() != current_name {
            used_files.insert(resolved.file().to_string());
        }
        let extendee_pool = pool_for(&resolved, current_name, current, files);
        if let (Some(pool), SymbolKind::Message { index, .. }) = (extendee_pool, &resolved) {
            let in_range = pool.message(*index).proto.extension_range.iter().any(|r| {
                let start = r.start.unwrap_or(1);
                let end = r.end.unwrap_or(start);
                tag >= start && tag < end
            });
            if !in_range {
                let err = IrError::ExtensionTagNotInRange { extendee: extendee_fqn.clone(), tag };
                reporter.report(Diagnostic::error(DiagnosticKind::Link, span.clone(), err.to_string()));
                return Err(err);
            }
            if message_set_flag(pool, *index) && !field_is_message {
                let err = IrError::ScalarExtensionOnMessageSet;
                reporter.report(Diagnostic::error(DiagnosticKind::Link, span.clone(), err.to_string()));
                return Err(err);
            }
        }
        let normalized_extendee = format!(".{}", extendee_fqn.trim_start_matches('.'));
        if let Err(err) = table.add_extension(&normalized_extendee, tag, &span) {
            reporter.report(Diagnostic::error(DiagnosticKind::Link, span, err.to_string()));
            return Err(err);
        }
        table.register_extension_name(&normalized_extendee, &field_name, current_name, field_idx);
    }

    let public_deps: HashSet<i32> = current.file.public_dependency.iter().copied().collect();
    let unused_imports = current
        .file
        .dependency
        .iter()
        .enumerate()
        .filter(|(i, dep)| !public_deps.contains(&(*i as i32)) && !used_files.contains(*dep))
        .map(|(_, dep)| dep.clone())
        .collect();

    Ok(LinkedFile { unused_imports })
}

fn enum_fqn(kind: &SymbolKind, pool: Option<&DescriptorPool>) -> String {
    match (kind, pool) {
        (SymbolKind::Enum { index, .. }, Some(pool)) => format!(".{}", pool.enum_(*index).fqn),
        _ => String::new(),
    }
}

fn message_fqn(kind: &SymbolKind, pool: Option<&DescriptorPool>) -> String {
    match (kind, pool) {
        (SymbolKind::Message { index, .. }, Some(pool)) => format!(".{}", pool.message(*index).fqn),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proto_diagnostics::CollectingReporter;

    fn build(name: &str, source: &str) -> DescriptorPool {
        let (file, parse_out, _) = proto_ast::parse_source(name, source);
        let view = proto_ast::AstView::new(&parse_out.ast, &file);
        let mut reporter = CollectingReporter::new();
        crate::lower::lower_file(view, name, Vec::new(), Vec::new(), Vec::new(), &mut reporter)
    }

    #[test]
    fn resolves_sibling_message_field_type() {
        let mut pool = build(
            "a.proto",
            "syntax = \"proto3\";\npackage pkg;\nmessage Foo { Bar b = 1; }\nmessage Bar {}\n",
        );
        let table = SymbolTable::new();
        table.import_packages("pkg").unwrap();
        let mut reporter = CollectingReporter::new();
        table.import_file("a.proto", &pool, &mut reporter).unwrap();

        let files = HashMap::new();
        link_file("a.proto", &mut pool, &table, &files, &HashSet::new(), &mut reporter).unwrap();

        let field = pool.fields.iter().find(|f| f.proto.name.as_deref() == Some("b")).unwrap();
        assert_eq!(field.proto.type_name.as_deref(), Some(".pkg.Bar"));
        assert_eq!(field.proto.r#type, Some(FieldType::Message as i32));
    }

    #[test]
    fn retags_enum_reference() {
        let mut pool = build(
            "a.proto",
            "syntax = \"proto3\";\npackage pkg;\nenum Color { RED = 0; }\nmessage Foo { Color c = 1; }\n",
        );
        let table = SymbolTable::new();
        table.import_packages("pkg").unwrap();
        let mut reporter = CollectingReporter::new();
        table.import_file("a.proto", &pool, &mut reporter).unwrap();

        let files = HashMap::new();
        link_file("a.proto", &mut pool, &table, &files, &HashSet::new(), &mut reporter).unwrap();

        let field = pool.fields.iter().find(|f| f.proto.name.as_deref() == Some("c")).unwrap();
        assert_eq!(field.proto.r#type, Some(FieldType::Enum as i32));
        assert_eq!(field.proto.type_name.as_deref(), Some(".pkg.Color"));
    }

    #[test]
    fn unresolved_type_name_errors() {
        let mut pool = build("a.proto", "syntax = \"proto3\";\nmessage Foo { Missing m = 1; }\n");
        let table = SymbolTable::new();
        let mut reporter = CollectingReporter::new();
        table.import_file("a.proto", &pool, &mut reporter).unwrap();

        let files = HashMap::new();
        let err = link_file("a.proto", &mut pool, &table, &files, &HashSet::new(), &mut reporter).unwrap_err();
        assert!(matches!(err, IrError::SymbolNotFound(_)));
    }
}
