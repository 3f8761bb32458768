//! Package trie shared across every file in a compilation (spec §4.4).
//!
//! One `SymbolTable` serves a whole compile run: each file's declared
//! messages, enums, enum values, and services are registered under their
//! fully-qualified names, and the linker resolves references against it.
//! Readers take a shared lock per trie node; writers lock only the nodes on
//! their own path, so imports of unrelated packages proceed without
//! contending each other — the concurrency model spec §4.4 calls for.

use crate::errors::IrError;
use crate::pool::{DescriptorPool, EnumDescriptor, EnumIndex, EnumValueIndex, FieldIndex, MessageDescriptor, MessageIndex, PoolView, ServiceIndex};
use proto_diagnostics::{Diagnostic, DiagnosticKind, Reporter, Span};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// What a fully-qualified name resolves to, plus enough to find the owning
/// descriptor: the file it came from and its index in that file's pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SymbolKind {
    Message { file: String, index: MessageIndex },
    Enum { file: String, index: EnumIndex },
    EnumValue { file: String, index: EnumValueIndex },
    Service { file: String, index: ServiceIndex },
}

impl SymbolKind {
    pub fn describe(&self) -> &'static str {
        match self {
            SymbolKind::Message { .. } => "message",
            SymbolKind::Enum { .. } => "enum",
            SymbolKind::EnumValue { .. } => "enum value",
            SymbolKind::Service { .. } => "service",
        }
    }

    pub fn file(&self) -> &str {
        match self {
            SymbolKind::Message { file, .. }
            | SymbolKind::Enum { file, .. }
            | SymbolKind::EnumValue { file, .. }
            | SymbolKind::Service { file, .. } => file,
        }
    }
}

#[derive(Debug, Clone)]
struct Symbol {
    kind: SymbolKind,
    span: Span,
}

#[derive(Clone)]
enum Entry {
    Package,
    Symbol(Symbol),
}

#[derive(Default)]
struct TrieNode {
    children: RwLock<HashMap<String, Arc<TrieNode>>>,
    entry: RwLock<Option<Entry>>,
}

/// A handle onto one package's sub-trie, returned by [`SymbolTable::lookup_package`].
pub struct PackageView(Arc<TrieNode>);

impl PackageView {
    /// Names of the immediate child packages/symbols under this package.
    pub fn child_names(&self) -> Vec<String> {
        self.0.children.read().unwrap().keys().cloned().collect()
    }

    pub fn get(&self, component: &str) -> Option<SymbolKind> {
        let child = self.0.children.read().unwrap().get(component)?.clone();
        match &*child.entry.read().unwrap() {
            Some(Entry::Symbol(sym)) => Some(sym.kind.clone()),
            _ => None,
        }
    }
}

/// Package-and-symbol registry for one compilation, built incrementally as
/// files are imported (spec §4.4).
#[derive(Default)]
pub struct SymbolTable {
    root: Arc<TrieNode>,
    extensions: RwLock<HashMap<(String, i32), Span>>,
    /// `(extendee_fqn, field_name) -> (declaring file, field index)`, so the
    /// option interpreter can resolve `(pkg.ext_field)` name parts without
    /// knowing the extension's tag number up front.
    extensions_by_name: RwLock<HashMap<(String, String), (String, FieldIndex)>>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    fn child_of(node: &Arc<TrieNode>, component: &str) -> Arc<TrieNode> {
        if let Some(existing) = node.children.read().unwrap().get(component) {
            return existing.clone();
        }
        node.children
            .write()
            .unwrap()
            .entry(component.to_string())
            .or_insert_with(|| Arc::new(TrieNode::default()))
            .clone()
    }

    fn walk(&self, fqn: &str) -> Option<Arc<TrieNode>> {
        let mut node = self.root.clone();
        if fqn.is_empty() {
            return Some(node);
        }
        for component in fqn.split('.') {
            let next = node.children.read().unwrap().get(component).cloned()?;
            node = next;
        }
        Some(node)
    }

    /// Inserts every prefix of `fqn` as a package entry. Fails if any prefix
    /// is already defined as a non-package symbol.
    pub fn import_packages(&self, fqn: &str) -> Result<(), IrError> {
        let mut node = self.root.clone();
        let mut prefix = String::new();
        for component in fqn.split('.') {
            node = Self::child_of(&node, component);
            if !prefix.is_empty() {
                prefix.push('.');
            }
            prefix.push_str(component);

            let mut entry = node.entry.write().unwrap();
            match &*entry {
                Some(Entry::Symbol(sym)) => {
                    return Err(IrError::AlreadyDefined(prefix.clone(), sym.kind.describe().to_string()));
                }
                Some(Entry::Package) => {}
                None => *entry = Some(Entry::Package),
            }
        }
        Ok(())
    }

    /// Registers every message/enum/enum-value/service declared in `pool`
    /// under the file's fully-qualified names. Two-pass check-then-commit: a
    /// colliding file contributes none of its symbols, not a partial set.
    pub fn import_file<R: Reporter>(&self, file_name: &str, pool: &DescriptorPool, reporter: &mut R) -> Result<(), IrError> {
        let declared = collect_declarations(file_name, pool);

        for (fqn, span, kind) in &declared {
            if let Some(node) = self.walk(fqn) {
                match &*node.entry.read().unwrap() {
                    Some(Entry::Symbol(existing)) => {
                        let (earlier, later) = order_positions(&existing.span, span);
                        reporter.report(Diagnostic::error(
                            DiagnosticKind::Link,
                            later.clone(),
                            format!("{fqn} is already defined (earlier declaration at {earlier})"),
                        ));
                        return Err(IrError::AlreadyDefined(fqn.clone(), existing.kind.describe().to_string()));
                    }
                    Some(Entry::Package) => {
                        return Err(IrError::AlreadyDefined(fqn.clone(), "package".to_string()));
                    }
                    None => {}
                }
            }
            let _ = kind;
        }

        for (fqn, span, kind) in declared {
            let mut node = self.root.clone();
            for component in fqn.split('.') {
                node = Self::child_of(&node, component);
            }
            *node.entry.write().unwrap() = Some(Entry::Symbol(Symbol { kind, span }));
        }
        Ok(())
    }

    /// Registers an extension's (extendee, tag) pair. Fails if already taken
    /// by an extension declared anywhere in the compilation.
    pub fn add_extension(&self, extendee_fqn: &str, tag: i32, pos: &Span) -> Result<(), IrError> {
        let mut extensions = self.extensions.write().unwrap();
        let key = (extendee_fqn.to_string(), tag);
        if extensions.contains_key(&key) {
            return Err(IrError::DuplicateExtension { extendee: extendee_fqn.to_string(), tag });
        }
        extensions.insert(key, pos.clone());
        Ok(())
    }

    /// Records an extension's field name alongside its tag (see
    /// [`SymbolTable::add_extension`]), so `(extendee).field_name` option
    /// paths can be resolved to the declaring file and field index.
    pub fn register_extension_name(&self, extendee_fqn: &str, field_name: &str, file: &str, field_index: FieldIndex) {
        self.extensions_by_name
            .write()
            .unwrap()
            .insert((extendee_fqn.to_string(), field_name.to_string()), (file.to_string(), field_index));
    }

    pub fn lookup_extension_by_name(&self, extendee_fqn: &str, field_name: &str) -> Option<(String, FieldIndex)> {
        self.extensions_by_name.read().unwrap().get(&(extendee_fqn.to_string(), field_name.to_string())).cloned()
    }

    pub fn lookup(&self, fqn: &str) -> Option<SymbolKind> {
        let node = self.walk(fqn)?;
        match &*node.entry.read().unwrap() {
            Some(Entry::Symbol(sym)) => Some(sym.kind.clone()),
            _ => None,
        }
    }

    pub fn lookup_package(&self, fqn: &str) -> Option<PackageView> {
        let node = self.walk(fqn)?;
        if fqn.is_empty() || matches!(&*node.entry.read().unwrap(), Some(Entry::Package)) {
            Some(PackageView(node))
        } else {
            None
        }
    }
}

fn order_positions<'a>(a: &'a Span, b: &'a Span) -> (&'a Span, &'a Span) {
    let key = |s: &Span| (s.file.clone(), s.start_line, s.start_col);
    if key(a) <= key(b) {
        (a, b)
    } else {
        (b, a)
    }
}

fn collect_declarations(file_name: &str, pool: &DescriptorPool) -> Vec<(String, Span, SymbolKind)> {
    let view = PoolView::new(pool);
    let mut out = Vec::new();
    for message in view.messages() {
        collect_message(file_name, message, &mut out);
    }
    for enum_ in view.enums() {
        collect_enum(file_name, enum_, &mut out);
    }
    for service in view.services() {
        out.push((
            service.fqn().to_string(),
            service.span().clone(),
            SymbolKind::Service { file: file_name.to_string(), index: service.index },
        ));
    }
    out
}

fn collect_message(file_name: &str, message: MessageDescriptor<'_>, out: &mut Vec<(String, Span, SymbolKind)>) {
    out.push((
        message.fqn().to_string(),
        message.span().clone(),
        SymbolKind::Message { file: file_name.to_string(), index: message.index },
    ));
    for nested in message.nested_messages() {
        collect_message(file_name, nested, out);
    }
    for nested_enum in message.nested_enums() {
        collect_enum(file_name, nested_enum, out);
    }
}

fn collect_enum(file_name: &str, enum_: EnumDescriptor<'_>, out: &mut Vec<(String, Span, SymbolKind)>) {
    out.push((
        enum_.fqn().to_string(),
        enum_.span().clone(),
        SymbolKind::Enum { file: file_name.to_string(), index: enum_.index },
    ));
    for value in enum_.values() {
        out.push((
            value.fqn().to_string(),
            value.span().clone(),
            SymbolKind::EnumValue { file: file_name.to_string(), index: value.index },
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proto_diagnostics::CollectingReporter;

    fn pos(line: u32) -> Span {
        Span::point("a.proto", line, 1, 0)
    }

    #[test]
    fn import_packages_rejects_non_package_collision() {
        let table = SymbolTable::new();
        table.import_packages("a.b").unwrap();
        assert!(table.lookup_package("a.b").is_some());
        assert!(table.lookup_package("a").is_some());
    }

    #[test]
    fn add_extension_rejects_duplicate_tag() {
        let table = SymbolTable::new();
        table.add_extension(".pkg.Foo", 5, &pos(1)).unwrap();
        let err = table.add_extension(".pkg.Foo", 5, &pos(2)).unwrap_err();
        assert!(matches!(err, IrError::DuplicateExtension { .. }));
    }

    #[test]
    fn import_file_registers_nested_symbols() {
        let (file, parse_out, _) = proto_ast::parse_source(
            "a.proto",
            "syntax = \"proto3\";\npackage pkg;\nmessage Outer { message Inner {} enum E { V = 0; } }\n",
        );
        let view = proto_ast::AstView::new(&parse_out.ast, &file);
        let mut reporter = CollectingReporter::new();
        let pool = crate::lower::lower_file(view, "a.proto", Vec::new(), Vec::new(), Vec::new(), &mut reporter);

        let table = SymbolTable::new();
        table.import_file("a.proto", &pool, &mut reporter).unwrap();

        assert!(table.lookup("pkg.Outer").is_some());
        assert!(table.lookup("pkg.Outer.Inner").is_some());
        assert!(table.lookup("pkg.Outer.E").is_some());
        // Enum values are scoped to the enum's parent, not the enum itself.
        assert!(table.lookup("pkg.Outer.V").is_some());
        assert!(table.lookup("pkg.Outer.E.V").is_none());
    }

    #[test]
    fn import_file_rejects_duplicate_message_name() {
        let (file, parse_out, _) =
            proto_ast::parse_source("a.proto", "syntax = \"proto3\";\nmessage Dup {}\nmessage Dup2 {}\n");
        let view = proto_ast::AstView::new(&parse_out.ast, &file);
        let mut reporter = CollectingReporter::new();
        let pool = crate::lower::lower_file(view, "a.proto", Vec::new(), Vec::new(), Vec::new(), &mut reporter);

        let table = SymbolTable::new();
        table.import_packages("").ok();
        table.import_file("a.proto", &pool, &mut reporter).unwrap();

        let (file2, parse_out2, _) = proto_ast::parse_source("b.proto", "syntax = \"proto3\";\nmessage Dup {}\n");
        let view2 = proto_ast::AstView::new(&parse_out2.ast, &file2);
        let pool2 = crate::lower::lower_file(view2, "b.proto", Vec::new(), Vec::new(), Vec::new(), &mut reporter);
        let err = table.import_file("b.proto", &pool2, &mut reporter).unwrap_err();
        assert!(matches!(err, IrError::AlreadyDefined(..)));
    }
}
