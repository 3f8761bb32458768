//! Position-preserving AST (spec §3 "AST node families").
//!
//! Nodes live in a flat arena and reference each other by [`NodeId`] rather
//! than through `Rc`/`RefCell`, the same ownership shape the rest of this
//! workspace uses for graph-like structures (see `proto-ir`'s descriptor
//! pool). Terminal nodes wrap a single lexed token; composite nodes carry a
//! [`NodeKind`] tag, an ordered child list, and a span merged from their
//! children — this is deliberately one generic shape rather than dozens of
//! hand-written struct types, with typed accessor methods layered on top for
//! the node families callers actually navigate.

use crate::source_file::TokenId;
use proto_diagnostics::Span;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub u32);

/// Every shape the grammar in spec §4.2 can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    File,
    Syntax,
    Edition,
    Import,
    Package,
    OptionStmt,
    CompactOptions,
    OptionName,

    Message,
    MessageBody,
    Field,
    Group,
    Oneof,
    OneofField,
    MapField,
    MapType,
    Reserved,
    ReservedRange,
    ReservedName,
    Extensions,
    ExtensionsRange,
    Extend,

    Enum,
    EnumBody,
    EnumValue,

    Service,
    Rpc,
    RpcType,

    Ident,
    IdentPath,
    IntLit,
    FloatLit,
    StrLit,
    BoolLit,
    SpecialFloatLit,
    MessageLiteral,
    MessageLiteralField,
    ArrayLiteral,

    /// A field's `optional`/`required`/`repeated` marker, or its absence in
    /// proto3/editions syntax.
    Label,

    EmptyDecl,
    /// A token the parser could not place; kept so downstream tooling still
    /// sees every byte of input represented somewhere in the tree.
    Error,
}

#[derive(Debug, Clone)]
pub enum Node {
    /// Wraps exactly one lexed token. Still tagged with a [`NodeKind`] (e.g.
    /// `Ident`, `IntLit`) so callers can filter children uniformly with
    /// [`Ast::children_of_kind`] without caring whether a child happens to be
    /// a leaf or a subtree.
    Terminal {
        kind: NodeKind,
        token: TokenId,
        span: Span,
    },
    Composite {
        kind: NodeKind,
        children: Vec<NodeId>,
        span: Span,
    },
}

impl Node {
    pub fn span(&self) -> &Span {
        match self {
            Node::Terminal { span, .. } => span,
            Node::Composite { span, .. } => span,
        }
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            Node::Terminal { kind, .. } => *kind,
            Node::Composite { kind, .. } => *kind,
        }
    }
}

/// Owns every node of one file's AST. Built incrementally by the parser:
/// terminals are pushed as tokens are consumed, composites are pushed once
/// all of their children exist, so a `NodeId` is always less than every id
/// among its composite's children... except for the root [`Ast::root`],
/// which is pushed last and therefore holds the *highest* id in the arena.
pub struct Ast {
    nodes: Vec<Node>,
    root: Option<NodeId>,
}

impl Ast {
    pub fn new() -> Self {
        Self { nodes: Vec::new(), root: None }
    }

    pub fn push_terminal(&mut self, kind: NodeKind, token: TokenId, span: Span) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node::Terminal { kind, token, span });
        id
    }

    pub fn push_composite(&mut self, kind: NodeKind, children: Vec<NodeId>, span: Span) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node::Composite { kind, children, span });
        id
    }

    pub fn set_root(&mut self, root: NodeId) {
        self.root = Some(root);
    }

    pub fn root(&self) -> NodeId {
        self.root.expect("Ast::root called before set_root")
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0 as usize]
    }

    pub fn kind(&self, id: NodeId) -> Option<NodeKind> {
        Some(self.node(id).kind())
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        match self.node(id) {
            Node::Composite { children, .. } => children,
            Node::Terminal { .. } => &[],
        }
    }

    /// Children of `id` matching `kind`, in document order.
    pub fn children_of_kind(&self, id: NodeId, kind: NodeKind) -> impl Iterator<Item = NodeId> + '_ {
        self.children(id)
            .iter()
            .copied()
            .filter(move |child| self.kind(*child) == Some(kind))
    }

    pub fn first_child_of_kind(&self, id: NodeId, kind: NodeKind) -> Option<NodeId> {
        self.children_of_kind(id, kind).next()
    }

    pub fn token_text<'a>(&self, id: NodeId, file: &'a crate::source_file::SourceFile) -> Option<&'a str> {
        match self.node(id) {
            Node::Terminal { token, .. } => Some(file.text_of(*token)),
            Node::Composite { .. } => None,
        }
    }
}

impl Default for Ast {
    fn default() -> Self {
        Self::new()
    }
}

/// Borrowed view pairing an [`Ast`] with the [`crate::source_file::SourceFile`]
/// it was parsed from, so typed accessors can read token text directly.
#[derive(Clone, Copy)]
pub struct AstView<'a> {
    pub ast: &'a Ast,
    pub file: &'a crate::source_file::SourceFile,
}

impl<'a> AstView<'a> {
    pub fn new(ast: &'a Ast, file: &'a crate::source_file::SourceFile) -> Self {
        Self { ast, file }
    }

    pub fn root(self) -> FileNode<'a> {
        FileNode { view: self, id: self.ast.root() }
    }

    fn text(self, id: NodeId) -> &'a str {
        self.ast.token_text(id, self.file).unwrap_or_default()
    }

    /// Joins the identifier terminals under an `IdentPath` node with `.`.
    fn ident_path_text(self, id: NodeId) -> String {
        self.ast
            .children_of_kind(id, NodeKind::Ident)
            .map(|child| self.text(child))
            .collect::<Vec<_>>()
            .join(".")
    }

    /// Parses a `ReservedRange`/`ExtensionsRange` node's children: one
    /// `IntLit` start, and an optional end that is either another `IntLit`
    /// or the `max` keyword (an `Ident`-kind terminal).
    fn parse_range(self, id: NodeId) -> (i64, RangeEnd) {
        let children = self.ast.children(id);
        let start = children
            .first()
            .map(|&c| self.text(c))
            .and_then(|t| t.parse().ok())
            .unwrap_or(0);
        let end = match children.get(1) {
            Some(&c) if self.ast.kind(c) == Some(NodeKind::IntLit) => {
                RangeEnd::Value(self.text(c).parse().unwrap_or(start))
            }
            Some(_) => RangeEnd::Max,
            None => RangeEnd::Value(start),
        };
        (start, end)
    }
}

macro_rules! typed_node {
    ($name:ident) => {
        #[derive(Clone, Copy)]
        pub struct $name<'a> {
            pub view: AstView<'a>,
            pub id: NodeId,
        }

        impl<'a> $name<'a> {
            pub fn span(&self) -> &'a Span {
                self.view.ast.node(self.id).span()
            }
        }
    };
}

typed_node!(FileNode);
typed_node!(MessageNode);
typed_node!(FieldNode);
typed_node!(OneofNode);
typed_node!(EnumNode);
typed_node!(EnumValueNode);
typed_node!(ServiceNode);
typed_node!(RpcNode);
typed_node!(OptionStmtNode);
typed_node!(ReservedNode);
typed_node!(ExtensionsNode);
typed_node!(ExtendNode);
typed_node!(ImportNode);

impl<'a> ImportNode<'a> {
    pub fn path(&self) -> String {
        self.view
            .ast
            .first_child_of_kind(self.id, NodeKind::StrLit)
            .map(|id| crate::literal::decode_string_literal(self.view.text(id)))
            .unwrap_or_default()
    }

    fn modifier(&self) -> Option<&'a str> {
        self.view
            .ast
            .first_child_of_kind(self.id, NodeKind::Ident)
            .map(|id| self.view.text(id))
    }

    pub fn is_public(&self) -> bool {
        self.modifier() == Some("public")
    }

    pub fn is_weak(&self) -> bool {
        self.modifier() == Some("weak")
    }
}

impl<'a> FileNode<'a> {
    pub fn imports(&self) -> impl Iterator<Item = ImportNode<'a>> + 'a {
        let view = self.view;
        view.ast
            .children_of_kind(self.id, NodeKind::Import)
            .map(move |id| ImportNode { view, id })
    }

    pub fn syntax(&self) -> Option<&'a str> {
        let stmt = self.view.ast.first_child_of_kind(self.id, NodeKind::Syntax)?;
        let ident = self.view.ast.first_child_of_kind(stmt, NodeKind::StrLit)?;
        Some(self.view.text(ident))
    }

    pub fn edition(&self) -> Option<&'a str> {
        let stmt = self.view.ast.first_child_of_kind(self.id, NodeKind::Edition)?;
        let ident = self.view.ast.first_child_of_kind(stmt, NodeKind::StrLit)?;
        Some(self.view.text(ident))
    }

    pub fn package(&self) -> Option<String> {
        let stmt = self.view.ast.first_child_of_kind(self.id, NodeKind::Package)?;
        let path = self.view.ast.first_child_of_kind(stmt, NodeKind::IdentPath)?;
        Some(self.view.ident_path_text(path))
    }

    pub fn messages(&self) -> impl Iterator<Item = MessageNode<'a>> + 'a {
        let view = self.view;
        view.ast
            .children_of_kind(self.id, NodeKind::Message)
            .map(move |id| MessageNode { view, id })
    }

    pub fn enums(&self) -> impl Iterator<Item = EnumNode<'a>> + 'a {
        let view = self.view;
        view.ast
            .children_of_kind(self.id, NodeKind::Enum)
            .map(move |id| EnumNode { view, id })
    }

    pub fn services(&self) -> impl Iterator<Item = ServiceNode<'a>> + 'a {
        let view = self.view;
        view.ast
            .children_of_kind(self.id, NodeKind::Service)
            .map(move |id| ServiceNode { view, id })
    }

    pub fn extends(&self) -> impl Iterator<Item = ExtendNode<'a>> + 'a {
        let view = self.view;
        view.ast
            .children_of_kind(self.id, NodeKind::Extend)
            .map(move |id| ExtendNode { view, id })
    }

    pub fn options(&self) -> impl Iterator<Item = OptionStmtNode<'a>> + 'a {
        let view = self.view;
        view.ast
            .children_of_kind(self.id, NodeKind::OptionStmt)
            .map(move |id| OptionStmtNode { view, id })
    }
}

impl<'a> MessageNode<'a> {
    pub fn name(&self) -> &'a str {
        self.view
            .ast
            .first_child_of_kind(self.id, NodeKind::Ident)
            .map(|id| self.view.text(id))
            .unwrap_or_default()
    }

    fn body(&self) -> Option<NodeId> {
        self.view.ast.first_child_of_kind(self.id, NodeKind::MessageBody)
    }

    pub fn fields(&self) -> impl Iterator<Item = FieldNode<'a>> + 'a {
        let view = self.view;
        let body = self.body();
        body.into_iter()
            .flat_map(move |b| view.ast.children_of_kind(b, NodeKind::Field))
            .map(move |id| FieldNode { view, id })
    }

    pub fn nested_messages(&self) -> impl Iterator<Item = MessageNode<'a>> + 'a {
        let view = self.view;
        let body = self.body();
        body.into_iter()
            .flat_map(move |b| view.ast.children_of_kind(b, NodeKind::Message))
            .map(move |id| MessageNode { view, id })
    }

    pub fn nested_enums(&self) -> impl Iterator<Item = EnumNode<'a>> + 'a {
        let view = self.view;
        let body = self.body();
        body.into_iter()
            .flat_map(move |b| view.ast.children_of_kind(b, NodeKind::Enum))
            .map(move |id| EnumNode { view, id })
    }

    pub fn oneofs(&self) -> impl Iterator<Item = OneofNode<'a>> + 'a {
        let view = self.view;
        let body = self.body();
        body.into_iter()
            .flat_map(move |b| view.ast.children_of_kind(b, NodeKind::Oneof))
            .map(move |id| OneofNode { view, id })
    }

    pub fn reserved(&self) -> impl Iterator<Item = ReservedNode<'a>> + 'a {
        let view = self.view;
        let body = self.body();
        body.into_iter()
            .flat_map(move |b| view.ast.children_of_kind(b, NodeKind::Reserved))
            .map(move |id| ReservedNode { view, id })
    }

    pub fn extension_ranges(&self) -> impl Iterator<Item = ExtensionsNode<'a>> + 'a {
        let view = self.view;
        let body = self.body();
        body.into_iter()
            .flat_map(move |b| view.ast.children_of_kind(b, NodeKind::Extensions))
            .map(move |id| ExtensionsNode { view, id })
    }

    pub fn extends(&self) -> impl Iterator<Item = ExtendNode<'a>> + 'a {
        let view = self.view;
        let body = self.body();
        body.into_iter()
            .flat_map(move |b| view.ast.children_of_kind(b, NodeKind::Extend))
            .map(move |id| ExtendNode { view, id })
    }

    pub fn options(&self) -> impl Iterator<Item = OptionStmtNode<'a>> + 'a {
        let view = self.view;
        let body = self.body();
        body.into_iter()
            .flat_map(move |b| view.ast.children_of_kind(b, NodeKind::OptionStmt))
            .map(move |id| OptionStmtNode { view, id })
    }
}

/// One end of a numeric range (`reserved`/`extensions` ranges, spec §4.3's
/// `to max` exclusivity rule): `Max` denotes the sentinel upper bound rather
/// than a literal number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeEnd {
    Value(i64),
    Max,
}

impl<'a> FieldNode<'a> {
    /// `optional`/`required`/`repeated`, or `None` for a proto3/editions
    /// singular field with no explicit label.
    pub fn label(&self) -> Option<&'a str> {
        self.view
            .ast
            .first_child_of_kind(self.id, NodeKind::Label)
            .map(|id| self.view.text(id))
    }

    pub fn type_name(&self) -> String {
        self.view
            .ast
            .first_child_of_kind(self.id, NodeKind::IdentPath)
            .map(|id| self.view.ident_path_text(id))
            .unwrap_or_default()
    }

    pub fn name(&self) -> &'a str {
        self.view
            .ast
            .first_child_of_kind(self.id, NodeKind::Ident)
            .map(|id| self.view.text(id))
            .unwrap_or_default()
    }

    pub fn number(&self) -> Option<i64> {
        let lit = self.view.ast.first_child_of_kind(self.id, NodeKind::IntLit)?;
        self.view.text(lit).parse().ok()
    }

    /// Options in `[...]` after the field number, each as an `OptionStmt`
    /// child of the returned `CompactOptions` node.
    pub fn compact_options(&self) -> Option<NodeId> {
        self.view.ast.first_child_of_kind(self.id, NodeKind::CompactOptions)
    }

    /// `Some((key_type, value_type))` for a `map<K, V>` field; `None` for an
    /// ordinary field.
    pub fn map_type(&self) -> Option<(String, String)> {
        let map_ty = self.view.ast.first_child_of_kind(self.id, NodeKind::MapType)?;
        let mut paths = self.view.ast.children_of_kind(map_ty, NodeKind::IdentPath);
        let key = paths.next().map(|id| self.view.ident_path_text(id))?;
        let value = paths.next().map(|id| self.view.ident_path_text(id))?;
        Some((key, value))
    }
}

impl<'a> OneofNode<'a> {
    pub fn name(&self) -> &'a str {
        self.view
            .ast
            .first_child_of_kind(self.id, NodeKind::Ident)
            .map(|id| self.view.text(id))
            .unwrap_or_default()
    }

    pub fn fields(&self) -> impl Iterator<Item = FieldNode<'a>> + 'a {
        let view = self.view;
        view.ast
            .children_of_kind(self.id, NodeKind::OneofField)
            .map(move |id| FieldNode { view, id })
    }
}

impl<'a> EnumNode<'a> {
    pub fn name(&self) -> &'a str {
        self.view
            .ast
            .first_child_of_kind(self.id, NodeKind::Ident)
            .map(|id| self.view.text(id))
            .unwrap_or_default()
    }

    fn body(&self) -> Option<NodeId> {
        self.view.ast.first_child_of_kind(self.id, NodeKind::EnumBody)
    }

    pub fn values(&self) -> impl Iterator<Item = EnumValueNode<'a>> + 'a {
        let view = self.view;
        let body = self.body();
        body.into_iter()
            .flat_map(move |b| view.ast.children_of_kind(b, NodeKind::EnumValue))
            .map(move |id| EnumValueNode { view, id })
    }

    pub fn options(&self) -> impl Iterator<Item = OptionStmtNode<'a>> + 'a {
        let view = self.view;
        let body = self.body();
        body.into_iter()
            .flat_map(move |b| view.ast.children_of_kind(b, NodeKind::OptionStmt))
            .map(move |id| OptionStmtNode { view, id })
    }

    pub fn reserved(&self) -> impl Iterator<Item = ReservedNode<'a>> + 'a {
        let view = self.view;
        let body = self.body();
        body.into_iter()
            .flat_map(move |b| view.ast.children_of_kind(b, NodeKind::Reserved))
            .map(move |id| ReservedNode { view, id })
    }
}

impl<'a> EnumValueNode<'a> {
    pub fn name(&self) -> &'a str {
        self.view
            .ast
            .first_child_of_kind(self.id, NodeKind::Ident)
            .map(|id| self.view.text(id))
            .unwrap_or_default()
    }

    pub fn number(&self) -> Option<i64> {
        let lit = self.view.ast.first_child_of_kind(self.id, NodeKind::IntLit)?;
        self.view.text(lit).parse().ok()
    }
}

impl<'a> ServiceNode<'a> {
    pub fn name(&self) -> &'a str {
        self.view
            .ast
            .first_child_of_kind(self.id, NodeKind::Ident)
            .map(|id| self.view.text(id))
            .unwrap_or_default()
    }

    pub fn rpcs(&self) -> impl Iterator<Item = RpcNode<'a>> + 'a {
        let view = self.view;
        view.ast
            .children_of_kind(self.id, NodeKind::Rpc)
            .map(move |id| RpcNode { view, id })
    }
}

impl<'a> RpcNode<'a> {
    pub fn name(&self) -> &'a str {
        self.view
            .ast
            .first_child_of_kind(self.id, NodeKind::Ident)
            .map(|id| self.view.text(id))
            .unwrap_or_default()
    }

    fn rpc_types(&self) -> Vec<NodeId> {
        self.view.ast.children_of_kind(self.id, NodeKind::RpcType).collect()
    }

    pub fn input_type(&self) -> Option<String> {
        let ty = *self.rpc_types().first()?;
        let path = self.view.ast.first_child_of_kind(ty, NodeKind::IdentPath)?;
        Some(self.view.ident_path_text(path))
    }

    pub fn output_type(&self) -> Option<String> {
        let ty = *self.rpc_types().get(1)?;
        let path = self.view.ast.first_child_of_kind(ty, NodeKind::IdentPath)?;
        Some(self.view.ident_path_text(path))
    }

    pub fn client_streaming(&self) -> bool {
        self.rpc_types()
            .first()
            .is_some_and(|ty| self.view.ast.first_child_of_kind(*ty, NodeKind::Ident).is_some())
    }

    pub fn server_streaming(&self) -> bool {
        self.rpc_types()
            .get(1)
            .is_some_and(|ty| self.view.ast.first_child_of_kind(*ty, NodeKind::Ident).is_some())
    }
}

impl<'a> OptionStmtNode<'a> {
    pub fn name(&self) -> String {
        self.name_parts()
            .into_iter()
            .map(|(text, is_ext)| if is_ext { format!("({text})") } else { text })
            .collect::<Vec<_>>()
            .join(".")
    }

    /// Name parts as `(text, is_extension)`, matching
    /// `UninterpretedOption::NamePart`'s shape (spec §4.3): a `(ext.path)`
    /// component is extension-flagged, a plain identifier is not.
    pub fn name_parts(&self) -> Vec<(String, bool)> {
        let Some(option_name) = self.view.ast.first_child_of_kind(self.id, NodeKind::OptionName) else {
            return Vec::new();
        };
        self.view
            .ast
            .children(option_name)
            .iter()
            .map(|&child| match self.view.ast.kind(child) {
                Some(NodeKind::IdentPath) => (self.view.ident_path_text(child), true),
                _ => (self.view.text(child).to_string(), false),
            })
            .collect()
    }

    /// The node carrying this option's value: the `OptionStmt`'s second
    /// child, whatever shape the grammar produced for it (literal, ident, or
    /// message literal).
    pub fn value(&self) -> Option<NodeId> {
        self.view.ast.children(self.id).get(1).copied()
    }
}

impl<'a> ReservedNode<'a> {
    pub fn ranges(&self) -> Vec<(i64, RangeEnd)> {
        self.view
            .ast
            .children_of_kind(self.id, NodeKind::ReservedRange)
            .map(|id| self.view.parse_range(id))
            .collect()
    }

    pub fn names(&self) -> Vec<String> {
        self.view
            .ast
            .children_of_kind(self.id, NodeKind::ReservedName)
            .map(|id| crate::literal::strip_quotes(self.view.text(id)).to_string())
            .collect()
    }
}

impl<'a> ExtensionsNode<'a> {
    pub fn ranges(&self) -> Vec<(i64, RangeEnd)> {
        self.view
            .ast
            .children_of_kind(self.id, NodeKind::ExtensionsRange)
            .map(|id| self.view.parse_range(id))
            .collect()
    }

    pub fn compact_options(&self) -> Option<NodeId> {
        self.view.ast.first_child_of_kind(self.id, NodeKind::CompactOptions)
    }
}

impl<'a> ExtendNode<'a> {
    pub fn extendee(&self) -> String {
        self.view
            .ast
            .first_child_of_kind(self.id, NodeKind::IdentPath)
            .map(|id| self.view.ident_path_text(id))
            .unwrap_or_default()
    }

    pub fn fields(&self) -> impl Iterator<Item = FieldNode<'a>> + 'a {
        let view = self.view;
        view.ast
            .children_of_kind(self.id, NodeKind::Field)
            .map(move |id| FieldNode { view, id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source_file::SourceFile;

    #[test]
    fn arena_round_trips_children() {
        let file = SourceFile::new("t.proto", "x");
        let mut ast = Ast::new();
        let span = file.point_span(0);
        let leaf = ast.push_terminal(NodeKind::Ident, crate::source_file::TokenId(0), span.clone());
        let root = ast.push_composite(NodeKind::File, vec![leaf], span);
        ast.set_root(root);
        assert_eq!(ast.children(root), &[leaf]);
        assert_eq!(ast.kind(root), Some(NodeKind::File));
        assert_eq!(ast.kind(leaf), Some(NodeKind::Ident));
    }
}
