//! Uninterpreted → typed option conversion (spec §4.6).
//!
//! Lowering leaves every option as an `UninterpretedOption` — a dotted name
//! path plus one raw value slot. This module walks that list for each kind
//! of element (file, message, field, oneof, enum, enum value, service,
//! method) and writes recognized names into the real typed options message,
//! the same struct the final `FileDescriptorSet` serializes.
//!
//! Scope note: full custom (extension) option interpretation in the general
//! case requires decoding an arbitrary user-declared extension message by
//! descriptor alone — effectively a small dynamic-message reflection layer.
//! This module interprets every option whose first name part is a *plain*
//! identifier naming a field `descriptor.proto` itself declares (the set
//! protoc calls "the standard options") directly, via `set_known`. Any other
//! name — one rooted in an `(ext)` part, or with more than one part — is
//! walked structurally instead: each part is resolved against the symbol
//! table and the message it lands on is checked to exist, with intermediate
//! parts required to be singular message fields (spec §4.6 step 2) and
//! sibling oneof members tracked across the whole element to catch a second
//! one being set (step 5). The path's *value* is left in
//! `uninterpreted_option` for a downstream consumer holding the resolved
//! extension's own descriptor to decode — this module validates that the
//! path exists, not what's at the end of it.

use crate::error::{OptionError, Result};
use proto_diagnostics::{Diagnostic, DiagnosticKind, Reporter, Span};
use proto_ir::pool::{DescriptorPool, FieldData};
use proto_ir::symbol_table::{SymbolKind, SymbolTable};
use prost_types::field_descriptor_proto::{Label as FieldLabel, Type as FieldType};
use prost_types::uninterpreted_option::NamePart;
use prost_types::{
    field_options::CType, field_options::JsType, file_options::OptimizeMode,
    method_options::IdempotencyLevel, EnumOptions, EnumValueOptions, FieldOptions, FileOptions,
    MessageOptions, MethodOptions, OneofOptions, ServiceOptions, UninterpretedOption,
};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterpretMode {
    Strict,
    Lenient,
}

/// Everything the structural name-path walker needs: the shared symbol
/// table, every other file's finished pool, the file currently being
/// interpreted (whose own pool isn't in `files` yet), and the well-known
/// descriptor.proto message this element's options are attached to (e.g.
/// `.google.protobuf.FileOptions` for [`interpret_file_options`]).
pub struct OptionsContext<'a> {
    pub table: &'a SymbolTable,
    pub files: &'a HashMap<String, Arc<DescriptorPool>>,
    pub current_name: &'a str,
    pub current: &'a DescriptorPool,
    pub extendee: &'static str,
}

fn pool_for<'a>(ctx: &OptionsContext<'a>, file: &str) -> Option<&'a DescriptorPool> {
    if file == ctx.current_name {
        Some(ctx.current)
    } else {
        ctx.files.get(file).map(|p| p.as_ref())
    }
}

/// `(is singular message, fully-qualified message type name)` for a
/// resolved field, used to decide whether a non-last name part can be
/// walked into.
fn message_shape(field: &FieldData) -> (bool, Option<String>) {
    let is_message = field.proto.r#type == Some(FieldType::Message as i32);
    let is_singular = field.proto.label != Some(FieldLabel::Repeated as i32);
    (is_message && is_singular, field.proto.type_name.clone())
}

/// Walks one option's whole name path against `ctx`, resolving `(ext)`
/// parts through the linker's extension registry and ordinary parts as
/// fields of the message the path has reached so far. Records every
/// message fqn the path passes through in `entered` and every leaf field
/// actually named in `set_fields`, for the required-fields sweep that runs
/// once per element after this is called for each of its options; detects
/// a second option setting a different member of an already-set oneof via
/// `oneof_seen`.
/// Whether [`walk_name_path`] fully resolved the option's name path, or
/// bailed out early because its leading `(ext)` part names an extension
/// this compilation never saw a declaration for — any third-party custom
/// option the symbol table has no record of falls here, and is retained
/// unconditionally rather than treated as an error (this crate can only
/// validate paths rooted in extensions it actually knows about).
enum WalkOutcome {
    Resolved,
    UnknownExtension,
}

fn walk_name_path(
    ctx: &OptionsContext<'_>,
    name: &[NamePart],
    full_name: &str,
    entered: &mut HashSet<String>,
    set_fields: &mut HashSet<(String, String)>,
    oneof_seen: &mut HashMap<(String, i32), String>,
) -> Result<WalkOutcome> {
    let mut current_message = ctx.extendee.to_string();

    for (i, part) in name.iter().enumerate() {
        let is_last = i + 1 == name.len();
        entered.insert(current_message.trim_start_matches('.').to_string());

        let (owner_fqn, field) = if part.is_extension {
            let extendee = format!(".{}", current_message.trim_start_matches('.'));
            let Some((file, field_idx)) = ctx.table.lookup_extension_by_name(&extendee, &part.name_part) else {
                if i == 0 {
                    return Ok(WalkOutcome::UnknownExtension);
                }
                return Err(OptionError::UnknownExtension(
                    full_name.to_string(),
                    part.name_part.clone(),
                    current_message.trim_start_matches('.').to_string(),
                ));
            };
            let Some(pool) = pool_for(ctx, &file) else {
                return Err(OptionError::UnknownExtension(
                    full_name.to_string(),
                    part.name_part.clone(),
                    current_message.trim_start_matches('.').to_string(),
                ));
            };
            (current_message.trim_start_matches('.').to_string(), pool.field(field_idx))
        } else {
            let trimmed = current_message.trim_start_matches('.').to_string();
            let Some(SymbolKind::Message { file, index }) = ctx.table.lookup(&trimmed) else {
                return Err(OptionError::UnknownFieldOf(full_name.to_string(), part.name_part.clone(), short_name(&trimmed)));
            };
            let Some(pool) = pool_for(ctx, &file) else {
                return Err(OptionError::UnknownFieldOf(full_name.to_string(), part.name_part.clone(), short_name(&trimmed)));
            };
            let message = pool.message(index);
            let found = message.fields.iter().map(|&fi| pool.field(fi)).find(|f| f.proto.name.as_deref() == Some(part.name_part.as_str()));
            let Some(field) = found else {
                return Err(OptionError::UnknownFieldOf(full_name.to_string(), part.name_part.clone(), short_name(&message.fqn)));
            };
            if is_last {
                if let Some(oneof_index) = field.proto.oneof_index {
                    let key = (message.fqn.clone(), oneof_index);
                    if let Some(previous) = oneof_seen.get(&key) {
                        let oneof_idx = message.oneofs[oneof_index as usize];
                        let oneof_name = pool.oneof(oneof_idx).proto.name.clone().unwrap_or_default();
                        if previous != &part.name_part {
                            return Err(OptionError::OneofConflict(oneof_name, part.name_part.clone()));
                        }
                    } else {
                        oneof_seen.insert(key, part.name_part.clone());
                    }
                }
                set_fields.insert((message.fqn.clone(), part.name_part.clone()));
            }
            (trimmed, field)
        };

        if !is_last {
            let (is_singular_message, target_fqn) = message_shape(field);
            if !is_singular_message {
                return Err(OptionError::NotASingularMessage(full_name.to_string(), short_name(&owner_fqn)));
            }
            current_message = target_fqn.unwrap_or_default();
        }
    }

    Ok(WalkOutcome::Resolved)
}

fn short_name(fqn: &str) -> String {
    fqn.rsplit('.').next().unwrap_or(fqn).to_string()
}

/// Spec §4.6 step 7: once every option on an element has been walked,
/// check that every message type the walk actually entered had all of its
/// `required` fields named by some option's leaf path. Only meaningful for
/// proto2 custom option messages — the standard `descriptor.proto` option
/// messages declare no required fields — but runs unconditionally since
/// nothing here is specific to extensions.
fn check_required_fields(
    ctx: &OptionsContext<'_>,
    entered: &HashSet<String>,
    set_fields: &HashSet<(String, String)>,
) -> Result<()> {
    for message_fqn in entered {
        let Some(SymbolKind::Message { file, index }) = ctx.table.lookup(message_fqn) else { continue };
        let Some(pool) = pool_for(ctx, &file) else { continue };
        let message = pool.message(index);
        for &field_idx in &message.fields {
            let field = pool.field(field_idx);
            if field.proto.label == Some(FieldLabel::Required as i32) {
                let field_name = field.proto.name.clone().unwrap_or_default();
                if !set_fields.contains(&(message.fqn.clone(), field_name.clone())) {
                    return Err(OptionError::MissingRequiredField(short_name(&message.fqn), field_name));
                }
            }
        }
    }
    Ok(())
}

fn identifier(opt: &UninterpretedOption) -> Option<&str> {
    opt.identifier_value.as_deref()
}

fn option_name(opt: &UninterpretedOption) -> String {
    opt.name
        .iter()
        .map(|p: &NamePart| if p.is_extension { format!("({})", p.name_part) } else { p.name_part.clone() })
        .collect::<Vec<_>>()
        .join(".")
}

fn bool_value(opt: &UninterpretedOption) -> Result<bool> {
    match identifier(opt) {
        Some("true") => Ok(true),
        Some("false") => Ok(false),
        _ => Err(OptionError::TypeMismatch(option_name(opt), "bool".to_string())),
    }
}

fn string_value(opt: &UninterpretedOption) -> Result<String> {
    opt.string_value
        .as_ref()
        .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
        .ok_or_else(|| OptionError::TypeMismatch(option_name(opt), "string".to_string()))
}

fn enum_value<T>(opt: &UninterpretedOption, enum_name: &str, variants: &[(&str, T)]) -> Result<T>
where
    T: Copy,
{
    let ident = identifier(opt).ok_or_else(|| OptionError::TypeMismatch(option_name(opt), enum_name.to_string()))?;
    variants
        .iter()
        .find(|(name, _)| *name == ident)
        .map(|(_, value)| *value)
        .ok_or_else(|| OptionError::UnknownEnumValue(option_name(opt), ident.to_string(), enum_name.to_string()))
}

/// Interprets one element's option list, writing every recognized plain
/// (non-extension) name into `target` via `set_known`; anything else is
/// resolved by walking its name parts against `ctx` (spec §4.6 step 2).
/// Returns the options left uninterpreted (empty in strict mode, since an
/// unresolved name there is a hard error instead).
fn interpret<T: Default>(
    target: &mut Option<T>,
    uninterpreted: Vec<UninterpretedOption>,
    owner_span: &Span,
    mode: InterpretMode,
    ctx: &OptionsContext<'_>,
    set_known: impl Fn(&mut T, &str, &UninterpretedOption) -> Result<bool>,
    reporter: &mut impl Reporter,
) -> Result<Vec<UninterpretedOption>> {
    let mut leftover = Vec::new();
    let mut slot = target.take().unwrap_or_default();
    let mut entered = HashSet::new();
    let mut set_fields = HashSet::new();
    let mut oneof_seen = HashMap::new();

    for opt in uninterpreted {
        let Some(first) = opt.name.first() else { continue };

        if !first.is_extension && opt.name.len() == 1 {
            match (set_known(&mut slot, &first.name_part, &opt), mode) {
                (Ok(true), _) => {}
                (Ok(false), InterpretMode::Lenient) => {
                    leftover.push(opt);
                }
                (Ok(false), InterpretMode::Strict) => {
                    let err = OptionError::UnknownField(option_name(&opt), first.name_part.clone());
                    reporter.report(Diagnostic::error(DiagnosticKind::Option, owner_span.clone(), err.to_string()));
                    return Err(OptionError::StrictInterpretFailed(option_name(&opt), err.to_string()));
                }
                (Err(err), InterpretMode::Lenient) => {
                    reporter.report(Diagnostic::warning(DiagnosticKind::Option, owner_span.clone(), err.to_string()));
                    leftover.push(opt);
                }
                (Err(err), InterpretMode::Strict) => {
                    reporter.report(Diagnostic::error(DiagnosticKind::Option, owner_span.clone(), err.to_string()));
                    return Err(OptionError::StrictInterpretFailed(option_name(&opt), err.to_string()));
                }
            }
            continue;
        }

        // `(ext)`-rooted or multi-part: walked structurally against the
        // symbol table instead of `set_known`. The path's value is opaque
        // to this crate (see module docs) — a successful walk just proves
        // the path exists, and the option is retained either way for a
        // downstream decoder.
        let full_name = option_name(&opt);
        match walk_name_path(ctx, &opt.name, &full_name, &mut entered, &mut set_fields, &mut oneof_seen) {
            Ok(WalkOutcome::Resolved) | Ok(WalkOutcome::UnknownExtension) => leftover.push(opt),
            Err(err) => match mode {
                InterpretMode::Lenient => {
                    reporter.report(Diagnostic::warning(DiagnosticKind::Option, owner_span.clone(), err.to_string()));
                    leftover.push(opt);
                }
                InterpretMode::Strict => {
                    reporter.report(Diagnostic::error(DiagnosticKind::Option, owner_span.clone(), err.to_string()));
                    return Err(OptionError::StrictInterpretFailed(full_name, err.to_string()));
                }
            },
        }
    }

    if let Err(err) = check_required_fields(ctx, &entered, &set_fields) {
        match mode {
            InterpretMode::Lenient => {
                reporter.report(Diagnostic::warning(DiagnosticKind::Option, owner_span.clone(), err.to_string()));
            }
            InterpretMode::Strict => {
                reporter.report(Diagnostic::error(DiagnosticKind::Option, owner_span.clone(), err.to_string()));
                return Err(OptionError::StrictInterpretFailed(owner_span.file.clone(), err.to_string()));
            }
        }
    }

    *target = Some(slot);
    Ok(leftover)
}

fn set_file_field(opts: &mut FileOptions, name: &str, opt: &UninterpretedOption) -> Result<bool> {
    match name {
        "java_package" => opts.java_package = Some(string_value(opt)?),
        "java_outer_classname" => opts.java_outer_classname = Some(string_value(opt)?),
        "java_multiple_files" => opts.java_multiple_files = Some(bool_value(opt)?),
        "java_string_check_utf8" => opts.java_string_check_utf8 = Some(bool_value(opt)?),
        "java_generic_services" => opts.java_generic_services = Some(bool_value(opt)?),
        "py_generic_services" => opts.py_generic_services = Some(bool_value(opt)?),
        "php_generic_services" => opts.php_generic_services = Some(bool_value(opt)?),
        "cc_generic_services" => opts.cc_generic_services = Some(bool_value(opt)?),
        "cc_enable_arenas" => opts.cc_enable_arenas = Some(bool_value(opt)?),
        "deprecated" => opts.deprecated = Some(bool_value(opt)?),
        "go_package" => opts.go_package = Some(string_value(opt)?),
        "objc_class_prefix" => opts.objc_class_prefix = Some(string_value(opt)?),
        "csharp_namespace" => opts.csharp_namespace = Some(string_value(opt)?),
        "swift_prefix" => opts.swift_prefix = Some(string_value(opt)?),
        "php_class_prefix" => opts.php_class_prefix = Some(string_value(opt)?),
        "php_namespace" => opts.php_namespace = Some(string_value(opt)?),
        "php_metadata_namespace" => opts.php_metadata_namespace = Some(string_value(opt)?),
        "ruby_package" => opts.ruby_package = Some(string_value(opt)?),
        "optimize_for" => {
            opts.optimize_for = Some(enum_value(
                opt,
                "FileOptions.OptimizeMode",
                &[("SPEED", OptimizeMode::Speed as i32), ("CODE_SIZE", OptimizeMode::CodeSize as i32), ("LITE_RUNTIME", OptimizeMode::LiteRuntime as i32)],
            )?)
        }
        _ => return Ok(false),
    }
    Ok(true)
}

pub fn interpret_file_options(
    target: &mut Option<FileOptions>,
    uninterpreted: Vec<UninterpretedOption>,
    owner_span: &Span,
    mode: InterpretMode,
    ctx: &OptionsContext<'_>,
    reporter: &mut impl Reporter,
) -> Result<Vec<UninterpretedOption>> {
    interpret(target, uninterpreted, owner_span, mode, ctx, set_file_field, reporter)
}

fn set_message_field(opts: &mut MessageOptions, name: &str, opt: &UninterpretedOption) -> Result<bool> {
    match name {
        "message_set_wire_format" => opts.message_set_wire_format = Some(bool_value(opt)?),
        "no_standard_descriptor_accessor" => opts.no_standard_descriptor_accessor = Some(bool_value(opt)?),
        "deprecated" => opts.deprecated = Some(bool_value(opt)?),
        // `map_entry` and `allow_alias` are read straight off the raw token
        // text during lowering (their *value* gates a structural check that
        // runs before options are ever interpreted); interpreting them again
        // here would just repeat that work on the same uninterpreted list.
        "map_entry" => opts.map_entry = Some(bool_value(opt)?),
        _ => return Ok(false),
    }
    Ok(true)
}

pub fn interpret_message_options(
    target: &mut Option<MessageOptions>,
    uninterpreted: Vec<UninterpretedOption>,
    owner_span: &Span,
    mode: InterpretMode,
    ctx: &OptionsContext<'_>,
    reporter: &mut impl Reporter,
) -> Result<Vec<UninterpretedOption>> {
    interpret(target, uninterpreted, owner_span, mode, ctx, set_message_field, reporter)
}

fn set_field_field(opts: &mut FieldOptions, name: &str, opt: &UninterpretedOption) -> Result<bool> {
    match name {
        "packed" => opts.packed = Some(bool_value(opt)?),
        "lazy" => opts.lazy = Some(bool_value(opt)?),
        "unverified_lazy" => opts.unverified_lazy = Some(bool_value(opt)?),
        "deprecated" => opts.deprecated = Some(bool_value(opt)?),
        "weak" => opts.weak = Some(bool_value(opt)?),
        "debug_redact" => opts.debug_redact = Some(bool_value(opt)?),
        "ctype" => opts.ctype = Some(enum_value(opt, "FieldOptions.CType", &[("STRING", CType::String as i32), ("CORD", CType::Cord as i32), ("STRING_PIECE", CType::StringPiece as i32)])?),
        "jstype" => opts.jstype = Some(enum_value(opt, "FieldOptions.JSType", &[("JS_NORMAL", JsType::JsNormal as i32), ("JS_STRING", JsType::JsString as i32), ("JS_NUMBER", JsType::JsNumber as i32)])?),
        _ => return Ok(false),
    }
    Ok(true)
}

pub fn interpret_field_options(
    target: &mut Option<FieldOptions>,
    uninterpreted: Vec<UninterpretedOption>,
    owner_span: &Span,
    mode: InterpretMode,
    ctx: &OptionsContext<'_>,
    reporter: &mut impl Reporter,
) -> Result<Vec<UninterpretedOption>> {
    interpret(target, uninterpreted, owner_span, mode, ctx, set_field_field, reporter)
}

fn set_oneof_field(_opts: &mut OneofOptions, _name: &str, _opt: &UninterpretedOption) -> Result<bool> {
    Ok(false)
}

pub fn interpret_oneof_options(
    target: &mut Option<OneofOptions>,
    uninterpreted: Vec<UninterpretedOption>,
    owner_span: &Span,
    mode: InterpretMode,
    ctx: &OptionsContext<'_>,
    reporter: &mut impl Reporter,
) -> Result<Vec<UninterpretedOption>> {
    interpret(target, uninterpreted, owner_span, mode, ctx, set_oneof_field, reporter)
}

fn set_enum_field(opts: &mut EnumOptions, name: &str, opt: &UninterpretedOption) -> Result<bool> {
    match name {
        "allow_alias" => opts.allow_alias = Some(bool_value(opt)?),
        "deprecated" => opts.deprecated = Some(bool_value(opt)?),
        _ => return Ok(false),
    }
    Ok(true)
}

pub fn interpret_enum_options(
    target: &mut Option<EnumOptions>,
    uninterpreted: Vec<UninterpretedOption>,
    owner_span: &Span,
    mode: InterpretMode,
    ctx: &OptionsContext<'_>,
    reporter: &mut impl Reporter,
) -> Result<Vec<UninterpretedOption>> {
    interpret(target, uninterpreted, owner_span, mode, ctx, set_enum_field, reporter)
}

fn set_enum_value_field(opts: &mut EnumValueOptions, name: &str, opt: &UninterpretedOption) -> Result<bool> {
    match name {
        "deprecated" => opts.deprecated = Some(bool_value(opt)?),
        _ => return Ok(false),
    }
    Ok(true)
}

pub fn interpret_enum_value_options(
    target: &mut Option<EnumValueOptions>,
    uninterpreted: Vec<UninterpretedOption>,
    owner_span: &Span,
    mode: InterpretMode,
    ctx: &OptionsContext<'_>,
    reporter: &mut impl Reporter,
) -> Result<Vec<UninterpretedOption>> {
    interpret(target, uninterpreted, owner_span, mode, ctx, set_enum_value_field, reporter)
}

fn set_service_field(opts: &mut ServiceOptions, name: &str, opt: &UninterpretedOption) -> Result<bool> {
    match name {
        "deprecated" => opts.deprecated = Some(bool_value(opt)?),
        _ => return Ok(false),
    }
    Ok(true)
}

pub fn interpret_service_options(
    target: &mut Option<ServiceOptions>,
    uninterpreted: Vec<UninterpretedOption>,
    owner_span: &Span,
    mode: InterpretMode,
    ctx: &OptionsContext<'_>,
    reporter: &mut impl Reporter,
) -> Result<Vec<UninterpretedOption>> {
    interpret(target, uninterpreted, owner_span, mode, ctx, set_service_field, reporter)
}

fn set_method_field(opts: &mut MethodOptions, name: &str, opt: &UninterpretedOption) -> Result<bool> {
    match name {
        "deprecated" => opts.deprecated = Some(bool_value(opt)?),
        "idempotency_level" => {
            opts.idempotency_level = Some(enum_value(
                opt,
                "MethodOptions.IdempotencyLevel",
                &[
                    ("IDEMPOTENCY_UNKNOWN", IdempotencyLevel::IdempotencyUnknown as i32),
                    ("NO_SIDE_EFFECTS", IdempotencyLevel::NoSideEffects as i32),
                    ("IDEMPOTENT", IdempotencyLevel::Idempotent as i32),
                ],
            )?)
        }
        _ => return Ok(false),
    }
    Ok(true)
}

pub fn interpret_method_options(
    target: &mut Option<MethodOptions>,
    uninterpreted: Vec<UninterpretedOption>,
    owner_span: &Span,
    mode: InterpretMode,
    ctx: &OptionsContext<'_>,
    reporter: &mut impl Reporter,
) -> Result<Vec<UninterpretedOption>> {
    interpret(target, uninterpreted, owner_span, mode, ctx, set_method_field, reporter)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proto_diagnostics::CollectingReporter;

    fn opt(name: &str, identifier: Option<&str>) -> UninterpretedOption {
        UninterpretedOption {
            name: vec![NamePart { name_part: name.to_string(), is_extension: false }],
            identifier_value: identifier.map(|s| s.to_string()),
            ..Default::default()
        }
    }

    fn span() -> Span {
        Span::point("a.proto", 1, 1, 0)
    }

    fn test_ctx(table: &SymbolTable, files: &HashMap<String, Arc<DescriptorPool>>, current: &DescriptorPool) -> OptionsContext<'_> {
        OptionsContext {
            table,
            files,
            current_name: "a.proto",
            current,
            extendee: ".google.protobuf.MessageOptions",
        }
    }

    #[test]
    fn sets_known_bool_field() {
        let mut target = None;
        let mut reporter = CollectingReporter::new();
        let table = SymbolTable::default();
        let files = HashMap::new();
        let current = DescriptorPool::default();
        let ctx = test_ctx(&table, &files, &current);
        let leftover = interpret_message_options(&mut target, vec![opt("deprecated", Some("true"))], &span(), InterpretMode::Strict, &ctx, &mut reporter).unwrap();
        assert!(leftover.is_empty());
        assert_eq!(target.unwrap().deprecated, Some(true));
    }

    #[test]
    fn strict_mode_rejects_unknown_field() {
        let mut target = None;
        let mut reporter = CollectingReporter::new();
        let table = SymbolTable::default();
        let files = HashMap::new();
        let current = DescriptorPool::default();
        let ctx = test_ctx(&table, &files, &current);
        let err = interpret_message_options(&mut target, vec![opt("not_a_real_option", Some("true"))], &span(), InterpretMode::Strict, &ctx, &mut reporter).unwrap_err();
        assert!(matches!(err, OptionError::StrictInterpretFailed(..)));
    }

    #[test]
    fn lenient_mode_retains_unknown_field() {
        let mut target = None;
        let mut reporter = CollectingReporter::new();
        let table = SymbolTable::default();
        let files = HashMap::new();
        let current = DescriptorPool::default();
        let ctx = test_ctx(&table, &files, &current);
        let leftover = interpret_message_options(&mut target, vec![opt("not_a_real_option", Some("true"))], &span(), InterpretMode::Lenient, &ctx, &mut reporter).unwrap();
        assert_eq!(leftover.len(), 1);
    }

    #[test]
    fn extension_options_are_always_retained() {
        let mut target = None;
        let mut reporter = CollectingReporter::new();
        let table = SymbolTable::default();
        let files = HashMap::new();
        let current = DescriptorPool::default();
        let ctx = test_ctx(&table, &files, &current);
        let ext = UninterpretedOption {
            name: vec![NamePart { name_part: "my.custom.opt".to_string(), is_extension: true }],
            identifier_value: Some("true".to_string()),
            ..Default::default()
        };
        let leftover = interpret_message_options(&mut target, vec![ext], &span(), InterpretMode::Strict, &ctx, &mut reporter).unwrap();
        assert_eq!(leftover.len(), 1);
    }

    #[test]
    fn unknown_field_via_extension_path_is_scenario_f() {
        use proto_ir::pool::{FieldData, FieldIndex, MessageData};

        let mut current = DescriptorPool::default();
        let foo_idx = current.push_message(MessageData {
            proto: Default::default(),
            parent: None,
            fqn: "pkg.Foo".to_string(),
            fields: Vec::new(),
            nested_messages: Vec::new(),
            nested_enums: Vec::new(),
            oneofs: Vec::new(),
            span: span(),
        });
        let b_idx = current.push_field(FieldData {
            proto: prost_types::FieldDescriptorProto {
                name: Some("b".to_string()),
                number: Some(1),
                r#type: Some(FieldType::Int32 as i32),
                label: Some(FieldLabel::Optional as i32),
                ..Default::default()
            },
            parent: Some(foo_idx),
            fqn: "pkg.Foo.b".to_string(),
            extendee_fqn: None,
            span: span(),
        });
        current.messages[foo_idx.0 as usize].fields.push(b_idx);
        current.top_level_messages.push(foo_idx);

        let f_idx = current.push_field(FieldData {
            proto: prost_types::FieldDescriptorProto {
                name: Some("f".to_string()),
                number: Some(50001),
                r#type: Some(FieldType::Message as i32),
                label: Some(FieldLabel::Optional as i32),
                type_name: Some(".pkg.Foo".to_string()),
                extendee: Some(".google.protobuf.MessageOptions".to_string()),
                ..Default::default()
            },
            parent: None,
            fqn: "pkg.f".to_string(),
            extendee_fqn: Some(".google.protobuf.MessageOptions".to_string()),
            span: span(),
        });
        current.extensions.push(f_idx);

        let table = SymbolTable::new();
        table.import_packages("pkg").unwrap();
        let mut reporter = CollectingReporter::new();
        table.import_file("a.proto", &current, &mut reporter).unwrap();
        table.register_extension_name(".google.protobuf.MessageOptions", "f", "a.proto", FieldIndex(f_idx.0));

        let files = HashMap::new();
        let ctx = test_ctx(&table, &files, &current);
        let name = vec![
            NamePart { name_part: "f".to_string(), is_extension: true },
            NamePart { name_part: "a".to_string(), is_extension: false },
        ];
        let bad = UninterpretedOption { name, identifier_value: Some("1".to_string()), ..Default::default() };
        let mut target = None;
        let err = interpret_message_options(&mut target, vec![bad], &span(), InterpretMode::Strict, &ctx, &mut reporter).unwrap_err();
        assert!(matches!(err, OptionError::StrictInterpretFailed(_, msg) if msg.contains("field a of Foo does not exist")));
    }
}
