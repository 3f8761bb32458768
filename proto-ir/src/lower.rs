//! AST → `FileDescriptorProto` lowering plus per-element validation
//! (spec §4.3), walking a `FileNode` depth-first and filling in a
//! [`DescriptorPool`] alongside the wire-shape proto.
//!
//! Options are *not* interpreted here — every `option` statement lands in
//! `uninterpreted_option` as raw name parts plus one literal value. That's
//! `proto-options`' job, run after linking.

use crate::errors::IrError;
use crate::pool::{DescriptorPool, EnumData, EnumValueData, FieldData, MessageData, MethodData, OneofData, ServiceData};
use proto_ast::ast::{EnumNode, ExtendNode, FieldNode, MessageNode, NodeKind, OptionStmtNode, RangeEnd, ServiceNode};
use proto_ast::{AstView, NodeId};
use proto_diagnostics::{Diagnostic, DiagnosticKind, Reporter, Span};
use prost_types::field_descriptor_proto::{Label as FieldLabel, Type as FieldType};
use prost_types::{
    uninterpreted_option, DescriptorProto, EnumDescriptorProto, EnumValueDescriptorProto,
    FieldDescriptorProto, FileDescriptorProto, MethodDescriptorProto, OneofDescriptorProto,
    ServiceDescriptorProto, UninterpretedOption,
};

const MAX_FIELD_NUMBER: i64 = 536_870_911;
const RESERVED_RANGE_START: i64 = 19000;
const RESERVED_RANGE_END: i64 = 19999;
const MAX_NESTING_DEPTH: u32 = 31;

pub struct Lowerer<'a, R: Reporter> {
    view: AstView<'a>,
    pool: DescriptorPool,
    reporter: &'a mut R,
}

pub fn lower_file<'a, R: Reporter>(
    view: AstView<'a>,
    file_name: &str,
    dependencies: Vec<String>,
    public_indices: Vec<i32>,
    weak_indices: Vec<i32>,
    reporter: &'a mut R,
) -> DescriptorPool {
    let root = view.root();
    let package = root.package();

    let mut lowerer = Lowerer {
        view,
        pool: DescriptorPool::default(),
        reporter,
    };

    let mut file = FileDescriptorProto {
        name: Some(file_name.to_string()),
        package: package.clone(),
        dependency: dependencies,
        public_dependency: public_indices,
        weak_dependency: weak_indices,
        syntax: root.syntax().map(|s| proto_ast::decode_string_literal(s)),
        edition: None,
        ..Default::default()
    };

    for opt in root.options() {
        file.options.get_or_insert_with(Default::default).uninterpreted_option.push(lowerer.lower_option(opt));
    }

    for message in root.messages() {
        let index = lowerer.lower_message(&message, None, package.as_deref(), 0);
        lowerer.pool.top_level_messages.push(index);
        file.message_type.push(lowerer.pool.message(index).proto.clone());
    }
    for enum_node in root.enums() {
        let index = lowerer.lower_enum(&enum_node, None, package.as_deref());
        lowerer.pool.top_level_enums.push(index);
        file.enum_type.push(lowerer.pool.enum_(index).proto.clone());
    }
    for service in root.services() {
        let index = lowerer.lower_service(&service, package.as_deref());
        lowerer.pool.top_level_services.push(index);
        file.service.push(lowerer.pool.service(index).proto.clone());
    }
    for extend in root.extends() {
        lowerer.lower_extend(&extend, None, package.as_deref(), &mut file.extension);
    }

    lowerer.pool.file = file;
    lowerer.pool
}

impl<'a, R: Reporter> Lowerer<'a, R> {
    fn span(&self, id: NodeId) -> Span {
        self.view.ast.node(id).span().clone()
    }

    fn fqn(&self, scope: Option<&str>, name: &str) -> String {
        match scope {
            Some(s) if !s.is_empty() => format!("{s}.{name}"),
            _ => name.to_string(),
        }
    }

    fn error(&mut self, id: NodeId, kind: DiagnosticKind, message: impl Into<String>) {
        self.reporter.report(Diagnostic::error(kind, self.span(id), message));
    }

    fn lower_message(
        &mut self,
        node: &MessageNode<'_>,
        parent: Option<crate::pool::MessageIndex>,
        scope: Option<&str>,
        depth: u32,
    ) -> crate::pool::MessageIndex {
        let name = node.name().to_string();
        let fqn = self.fqn(scope, &name);

        if depth > MAX_NESTING_DEPTH {
            self.error(node.id, DiagnosticKind::Structural, IrError::NestingTooDeep(fqn.clone()).to_string());
        }

        let index = self.pool.push_message(MessageData {
            proto: DescriptorProto { name: Some(name.clone()), ..Default::default() },
            parent,
            fqn: fqn.clone(),
            fields: Vec::new(),
            nested_messages: Vec::new(),
            nested_enums: Vec::new(),
            oneofs: Vec::new(),
            span: self.span(node.id),
        });

        let mut seen_numbers = std::collections::HashSet::new();
        for field in node.fields() {
            let field_index = self.lower_field(&field, Some(index), &fqn, None);
            if let Some(number) = field.number() {
                if !seen_numbers.insert(number) {
                    self.error(
                        field.id,
                        DiagnosticKind::Structural,
                        IrError::DuplicateFieldNumber { message: fqn.clone(), number: number as i32 }.to_string(),
                    );
                }
            }
            self.pool.message_mut(index).fields.push(field_index);
            let proto = self.pool.field(field_index).proto.clone();
            self.pool.message_mut(index).proto.field.push(proto);
        }

        for oneof in node.oneofs() {
            let oneof_index = self.lower_oneof(&oneof, index, &fqn);
            self.pool.message_mut(index).oneofs.push(oneof_index);
            let proto = self.pool.oneof(oneof_index).proto.clone();
            self.pool.message_mut(index).proto.oneof_decl.push(proto);
        }

        for nested in node.nested_messages() {
            let nested_index = self.lower_message(&nested, Some(index), Some(&fqn), depth + 1);
            self.pool.message_mut(index).nested_messages.push(nested_index);
            let proto = self.pool.message(nested_index).proto.clone();
            self.pool.message_mut(index).proto.nested_type.push(proto);
        }

        for nested_enum in node.nested_enums() {
            let enum_index = self.lower_enum(&nested_enum, Some(index), Some(&fqn));
            self.pool.message_mut(index).nested_enums.push(enum_index);
            let proto = self.pool.enum_(enum_index).proto.clone();
            self.pool.message_mut(index).proto.enum_type.push(proto);
        }

        for extend in node.extends() {
            let mut extensions = std::mem::take(&mut self.pool.message_mut(index).proto.extension);
            self.lower_extend(&extend, Some(index), Some(&fqn), &mut extensions);
            self.pool.message_mut(index).proto.extension = extensions;
        }

        for reserved in node.reserved() {
            for (start, end) in reserved.ranges() {
                self.pool.message_mut(index).proto.reserved_range.push(prost_types::descriptor_proto::ReservedRange {
                    start: Some(start as i32),
                    end: Some(range_end_exclusive(end)),
                });
            }
            for reserved_name in reserved.names() {
                self.pool.message_mut(index).proto.reserved_name.push(reserved_name);
            }
        }

        let mut ext_ranges = Vec::new();
        for extensions in node.extension_ranges() {
            for (start, end) in extensions.ranges() {
                ext_ranges.push((start, end));
                self.pool.message_mut(index).proto.extension_range.push(prost_types::descriptor_proto::ExtensionRange {
                    start: Some(start as i32),
                    end: Some(range_end_exclusive(end)),
                    options: None,
                });
            }
        }

        self.check_range_overlaps(&fqn, node, &ext_ranges);

        // Rejects map-entry synthesis collisions (spec §4.3: "parent messages
        // with an explicit map_entry = true are rejected"). Read straight off
        // the literal, same as enum `allow_alias` above — options aren't
        // interpreted until after linking, so `proto.options.map_entry` is
        // never populated at this point.
        for opt in node.options() {
            let is_map_entry = opt.name() == "map_entry";
            let is_message_set = opt.name() == "message_set_wire_format";
            let value_text = opt.value().and_then(|v| self.view.ast.token_text(v, self.view.file));
            if is_map_entry && value_text == Some("true") {
                self.error(node.id, DiagnosticKind::Structural, IrError::ExplicitMapEntry(fqn.clone()).to_string());
            }
            if is_message_set && value_text == Some("true") {
                let is_proto2 = self.view.root().syntax().map(proto_ast::decode_string_literal).as_deref() == Some("proto2");
                if !is_proto2 {
                    self.error(node.id, DiagnosticKind::Structural, IrError::MessageSetRequiresProto2(fqn.clone()).to_string());
                } else if ext_ranges.is_empty() || !self.pool.message(index).fields.is_empty() {
                    self.error(node.id, DiagnosticKind::Structural, IrError::InvalidMessageSet(fqn.clone()).to_string());
                }
            }
            let uo = self.lower_option(opt);
            self.pool.message_mut(index).proto.options.get_or_insert_with(Default::default).uninterpreted_option.push(uo);
        }

        index
    }

    fn check_range_overlaps(&mut self, fqn: &str, node: &MessageNode<'_>, ext_ranges: &[(i64, RangeEnd)]) {
        let mut reserved_ranges = Vec::new();
        for reserved in node.reserved() {
            reserved_ranges.extend(reserved.ranges());
        }
        let all: Vec<(i64, i64)> = reserved_ranges
            .iter()
            .chain(ext_ranges.iter())
            .map(|&(s, e)| (s, range_end_exclusive_i64(e)))
            .collect();
        for i in 0..all.len() {
            for j in (i + 1)..all.len() {
                let (s1, e1) = all[i];
                let (s2, e2) = all[j];
                if s1 < e2 && s2 < e1 {
                    self.error(
                        node.id,
                        DiagnosticKind::Structural,
                        IrError::RangeOverlap { message: fqn.to_string(), start: s2 as i32, end: e2 as i32 }.to_string(),
                    );
                }
            }
        }
    }

    fn lower_field(
        &mut self,
        node: &FieldNode<'_>,
        parent: Option<crate::pool::MessageIndex>,
        scope: &str,
        extendee_fqn: Option<String>,
    ) -> crate::pool::FieldIndex {
        let name = node.name().to_string();
        let fqn = self.fqn(Some(scope), &name);
        let number = node.number().unwrap_or(0);

        if number < 1 || number > MAX_FIELD_NUMBER || (RESERVED_RANGE_START..=RESERVED_RANGE_END).contains(&number) {
            self.error(node.id, DiagnosticKind::Structural, IrError::FieldNumberOutOfRange(number).to_string());
        }

        let label = match node.label() {
            Some("required") => FieldLabel::Required,
            Some("repeated") => FieldLabel::Repeated,
            _ => FieldLabel::Optional,
        };

        let mut proto = FieldDescriptorProto {
            name: Some(name.clone()),
            number: Some(number as i32),
            label: Some(label as i32),
            json_name: Some(default_json_name(&name)),
            extendee: extendee_fqn.clone(),
            ..Default::default()
        };

        if let Some((key_ty, value_ty)) = node.map_type() {
            proto.label = Some(FieldLabel::Repeated as i32);
            proto.r#type = Some(FieldType::Message as i32);
            let entry_name = map_entry_name(&name);
            let entry_fqn = self.fqn(Some(scope), &entry_name);
            proto.type_name = Some(format!(".{entry_fqn}"));

            let mut entry = DescriptorProto {
                name: Some(entry_name),
                field: vec![
                    scalar_or_message_field("key", 1, &key_ty),
                    scalar_or_message_field("value", 2, &value_ty),
                ],
                ..Default::default()
            };
            entry.options.get_or_insert_with(Default::default).map_entry = Some(true);
            let entry_index = self.pool.push_message(MessageData {
                proto: entry,
                parent,
                fqn: entry_fqn,
                fields: Vec::new(),
                nested_messages: Vec::new(),
                nested_enums: Vec::new(),
                oneofs: Vec::new(),
                span: self.span(node.id),
            });
            if let Some(parent) = parent {
                self.pool.message_mut(parent).nested_messages.push(entry_index);
                let entry_proto = self.pool.message(entry_index).proto.clone();
                self.pool.message_mut(parent).proto.nested_type.push(entry_proto);
            }
        } else {
            let type_name = node.type_name();
            match scalar_type(&type_name) {
                Some(scalar) => proto.r#type = Some(scalar as i32),
                None => {
                    // Qualified identifier: could be message or enum. Tentatively
                    // MESSAGE; the linker retags TYPE_ENUM once it resolves.
                    proto.r#type = Some(FieldType::Message as i32);
                    proto.type_name = Some(type_name);
                }
            }
        }

        if let Some(opts) = node.compact_options() {
            for child in self.view.ast.children_of_kind(opts, NodeKind::OptionStmt) {
                let opt = OptionStmtNode { view: self.view, id: child };
                let name = opt.name();
                if name == "default" {
                    if let Some(value) = opt.value() {
                        proto.default_value = Some(self.view.ast.token_text(value, self.view.file).unwrap_or_default().to_string());
                    }
                    continue;
                }
                if name == "json_name" {
                    if let Some(value) = opt.value() {
                        proto.json_name = Some(proto_ast::decode_string_literal(
                            self.view.ast.token_text(value, self.view.file).unwrap_or_default(),
                        ));
                    }
                    continue;
                }
                proto.options.get_or_insert_with(Default::default).uninterpreted_option.push(self.lower_option(opt));
            }
        }

        // An explicitly-written `optional` under proto3 needs its own
        // singleton oneof: that's how proto3 distinguishes "never set" from
        // "set to the default value" for a field that would otherwise have
        // no presence bit. Synthesized the same way a source-level `oneof`
        // would be, just with one member and a leading-underscore name.
        let is_proto3 = self.view.root().syntax().map(proto_ast::decode_string_literal).as_deref() == Some("proto3");
        let synthetic_oneof = if is_proto3 && node.label() == Some("optional") {
            parent.map(|parent_idx| {
                proto.proto3_optional = Some(true);
                let oneof_index_in_message = self.pool.message(parent_idx).oneofs.len() as i32;
                proto.oneof_index = Some(oneof_index_in_message);
                let oneof_proto = OneofDescriptorProto { name: Some(format!("_{name}")), ..Default::default() };
                let oneof_idx = self.pool.push_oneof(OneofData {
                    proto: oneof_proto,
                    parent: parent_idx,
                    fields: Vec::new(),
                    span: self.span(node.id),
                });
                self.pool.message_mut(parent_idx).oneofs.push(oneof_idx);
                let oneof_proto = self.pool.oneof(oneof_idx).proto.clone();
                self.pool.message_mut(parent_idx).proto.oneof_decl.push(oneof_proto);
                oneof_idx
            })
        } else {
            None
        };

        let field_index = self.pool.push_field(FieldData { proto, parent, fqn, extendee_fqn, span: self.span(node.id) });
        if let Some(oneof_idx) = synthetic_oneof {
            self.pool.oneof_mut(oneof_idx).fields.push(field_index);
        }
        field_index
    }

    fn lower_oneof(&mut self, node: &proto_ast::ast::OneofNode<'_>, parent: crate::pool::MessageIndex, scope: &str) -> crate::pool::OneofIndex {
        let name = node.name().to_string();
        let proto = OneofDescriptorProto { name: Some(name), ..Default::default() };
        let index = self.pool.push_oneof(OneofData { proto, parent, fields: Vec::new(), span: self.span(node.id) });
        let oneof_index_in_message = self.pool.message(parent).oneofs.len() as i32;
        for field in node.fields() {
            let field_index = self.lower_field(&field, Some(parent), scope, None);
            self.pool.field_mut(field_index).proto.oneof_index = Some(oneof_index_in_message);
            self.pool.oneof_mut(index).fields.push(field_index);
            self.pool.message_mut(parent).fields.push(field_index);
            let proto = self.pool.field(field_index).proto.clone();
            self.pool.message_mut(parent).proto.field.push(proto);
        }
        index
    }

    fn lower_enum(&mut self, node: &EnumNode<'_>, parent: Option<crate::pool::MessageIndex>, scope: Option<&str>) -> crate::pool::EnumIndex {
        let name = node.name().to_string();
        let fqn = self.fqn(scope, &name);
        let index = self.pool.push_enum(EnumData {
            proto: EnumDescriptorProto { name: Some(name), ..Default::default() },
            parent,
            fqn: fqn.clone(),
            values: Vec::new(),
            span: self.span(node.id),
        });

        // `allow_alias` gates the duplicate-number check below, but options
        // aren't interpreted until after linking — so read the raw literal
        // directly instead of waiting on a structured `EnumOptions` this
        // pass never populates.
        let mut allow_alias = false;
        for opt in node.options() {
            let is_allow_alias = opt.name() == "allow_alias";
            let value_text = opt
                .value()
                .and_then(|v| self.view.ast.token_text(v, self.view.file));
            if is_allow_alias && value_text == Some("true") {
                allow_alias = true;
            }
            let uo = self.lower_option(opt);
            self.pool.enum_mut(index).proto.options.get_or_insert_with(Default::default).uninterpreted_option.push(uo);
        }

        for reserved in node.reserved() {
            for (start, end) in reserved.ranges() {
                // Unlike `DescriptorProto::ReservedRange`, an enum's reserved
                // range end is *inclusive* and `max` means `i32::MAX`, not the
                // field-number sentinel used for message ranges.
                self.pool.enum_mut(index).proto.reserved_range.push(prost_types::enum_descriptor_proto::EnumReservedRange {
                    start: Some(start as i32),
                    end: Some(match end {
                        RangeEnd::Value(v) => v as i32,
                        RangeEnd::Max => i32::MAX,
                    }),
                });
            }
            for reserved_name in reserved.names() {
                self.pool.enum_mut(index).proto.reserved_name.push(reserved_name);
            }
        }

        let is_proto3 = self.view.root().syntax().map(proto_ast::decode_string_literal).as_deref() == Some("proto3");
        let mut seen_numbers = std::collections::HashSet::new();
        let mut first = true;
        for value in node.values() {
            // Enum-value FQNs are scoped to the enclosing parent of the enum,
            // not the enum itself (spec §4.5's C++-compat quirk).
            let value_fqn = self.fqn(scope, value.name());
            let number = value.number().unwrap_or(0);
            if is_proto3 && first && number != 0 {
                self.error(value.id, DiagnosticKind::Structural, IrError::Proto3EnumMissingZero(fqn.clone()).to_string());
            }
            first = false;

            if !seen_numbers.insert(number) && !allow_alias {
                self.error(
                    value.id,
                    DiagnosticKind::Structural,
                    IrError::DuplicateEnumNumber { enum_name: fqn.clone(), number: number as i32 }.to_string(),
                );
            }

            let value_index = self.pool.push_enum_value(EnumValueData {
                proto: EnumValueDescriptorProto { name: Some(value.name().to_string()), number: Some(number as i32), ..Default::default() },
                parent: index,
                fqn: value_fqn,
                span: self.span(value.id),
            });
            self.pool.enum_mut(index).values.push(value_index);
            let proto = self.pool.enum_value(value_index).proto.clone();
            self.pool.enum_mut(index).proto.value.push(proto);
        }
        index
    }

    fn lower_service(&mut self, node: &ServiceNode<'_>, scope: Option<&str>) -> crate::pool::ServiceIndex {
        let name = node.name().to_string();
        let fqn = self.fqn(scope, &name);
        let index = self.pool.push_service(ServiceData {
            proto: ServiceDescriptorProto { name: Some(name), ..Default::default() },
            fqn: fqn.clone(),
            methods: Vec::new(),
            span: self.span(node.id),
        });
        for rpc in node.rpcs() {
            let method_fqn = self.fqn(Some(&fqn), rpc.name());
            let proto = MethodDescriptorProto {
                name: Some(rpc.name().to_string()),
                input_type: rpc.input_type().map(|t| format!(".{t}")),
                output_type: rpc.output_type().map(|t| format!(".{t}")),
                client_streaming: Some(rpc.client_streaming()),
                server_streaming: Some(rpc.server_streaming()),
                ..Default::default()
            };
            let method_index = self.pool.push_method(MethodData { proto, parent: index, fqn: method_fqn, span: self.span(rpc.id) });
            self.pool.service_mut(index).methods.push(method_index);
            let proto = self.pool.method(method_index).proto.clone();
            self.pool.service_mut(index).proto.method.push(proto);
        }
        index
    }

    fn lower_extend(
        &mut self,
        node: &ExtendNode<'_>,
        parent: Option<crate::pool::MessageIndex>,
        scope: Option<&str>,
        out: &mut Vec<FieldDescriptorProto>,
    ) {
        let extendee = node.extendee();
        let extendee_fqn = format!(".{extendee}");
        for field in node.fields() {
            let field_index = self.lower_field(&field, parent, scope.unwrap_or(""), Some(extendee_fqn.clone()));
            self.pool.extensions.push(field_index);
            out.push(self.pool.field(field_index).proto.clone());
        }
    }

    fn lower_option(&mut self, opt: OptionStmtNode<'_>) -> UninterpretedOption {
        let name = opt
            .name_parts()
            .into_iter()
            .map(|(name_part, is_extension)| uninterpreted_option::NamePart { name_part, is_extension })
            .collect();

        let mut uo = UninterpretedOption { name, ..Default::default() };
        if let Some(value_id) = opt.value() {
            self.fill_option_value(value_id, &mut uo);
        }
        uo
    }

    fn fill_option_value(&self, id: NodeId, uo: &mut UninterpretedOption) {
        let text = self.view.ast.token_text(id, self.view.file);
        match self.view.ast.kind(id) {
            Some(NodeKind::StrLit) => {
                uo.string_value = text.map(|t| proto_ast::decode_string_literal(t).into_bytes());
            }
            Some(NodeKind::IntLit) => {
                if let Some(t) = text {
                    if let Ok(v) = t.parse::<i64>() {
                        if v < 0 {
                            uo.negative_int_value = Some(v);
                        } else {
                            uo.positive_int_value = Some(v as u64);
                        }
                    }
                }
            }
            Some(NodeKind::FloatLit) | Some(NodeKind::SpecialFloatLit) => {
                uo.double_value = match text {
                    Some("inf") => Some(f64::INFINITY),
                    Some("nan") => Some(f64::NAN),
                    Some(t) => t.parse().ok(),
                    None => None,
                };
            }
            Some(NodeKind::BoolLit) => {
                uo.identifier_value = text.map(str::to_string);
            }
            Some(NodeKind::Ident) => {
                uo.identifier_value = text.map(str::to_string);
            }
            Some(NodeKind::MessageLiteral) => {
                uo.aggregate_value = Some(message_literal_to_text(self.view, id));
            }
            _ => {}
        }
    }
}

fn message_literal_to_text(view: AstView<'_>, id: NodeId) -> String {
    let mut out = String::from("{ ");
    for field in view.ast.children_of_kind(id, NodeKind::MessageLiteralField) {
        let children = view.ast.children(field);
        if let Some(&name_id) = children.first() {
            out.push_str(view.ast.token_text(name_id, view.file).unwrap_or_default());
            out.push_str(": ");
        }
        if let Some(&value_id) = children.get(1) {
            match view.ast.kind(value_id) {
                Some(NodeKind::MessageLiteral) => out.push_str(&message_literal_to_text(view, value_id)),
                _ => out.push_str(view.ast.token_text(value_id, view.file).unwrap_or_default()),
            }
        }
        out.push(' ');
    }
    out.push('}');
    out
}

fn default_json_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper_next = false;
    for c in name.chars() {
        if c == '_' {
            upper_next = true;
        } else if upper_next {
            out.extend(c.to_uppercase());
            upper_next = false;
        } else {
            out.push(c);
        }
    }
    out
}

fn map_entry_name(field_name: &str) -> String {
    let mut out = String::new();
    let mut upper_next = true;
    for c in field_name.chars() {
        if c == '_' {
            upper_next = true;
        } else if upper_next {
            out.extend(c.to_uppercase());
            upper_next = false;
        } else {
            out.push(c);
        }
    }
    out.push_str("Entry");
    out
}

fn scalar_type(name: &str) -> Option<FieldType> {
    Some(match name {
        "double" => FieldType::Double,
        "float" => FieldType::Float,
        "int32" => FieldType::Int32,
        "int64" => FieldType::Int64,
        "uint32" => FieldType::Uint32,
        "uint64" => FieldType::Uint64,
        "sint32" => FieldType::Sint32,
        "sint64" => FieldType::Sint64,
        "fixed32" => FieldType::Fixed32,
        "fixed64" => FieldType::Fixed64,
        "sfixed32" => FieldType::Sfixed32,
        "sfixed64" => FieldType::Sfixed64,
        "bool" => FieldType::Bool,
        "string" => FieldType::String,
        "bytes" => FieldType::Bytes,
        _ => return None,
    })
}

fn scalar_or_message_field(name: &str, number: i32, type_name: &str) -> FieldDescriptorProto {
    let mut f = FieldDescriptorProto {
        name: Some(name.to_string()),
        number: Some(number),
        label: Some(FieldLabel::Optional as i32),
        json_name: Some(name.to_string()),
        ..Default::default()
    };
    match scalar_type(type_name) {
        Some(scalar) => f.r#type = Some(scalar as i32),
        None => {
            f.r#type = Some(FieldType::Message as i32);
            f.type_name = Some(type_name.to_string());
        }
    }
    f
}

fn range_end_exclusive(end: RangeEnd) -> i32 {
    range_end_exclusive_i64(end) as i32
}

fn range_end_exclusive_i64(end: RangeEnd) -> i64 {
    match end {
        RangeEnd::Value(v) => v + 1,
        RangeEnd::Max => MAX_FIELD_NUMBER + 1,
    }
}
