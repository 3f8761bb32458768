//! Builds `FileDescriptorProto.source_code_info` from a linked
//! [`DescriptorPool`] (spec §6).
//!
//! Walks the pool the same shape `descriptor.proto` itself declares,
//! recording each declaration's field-number path the way `protoc` does so
//! a [`prost_types::SourceCodeInfo::Location::path`] means the same thing
//! here as it does in any other implementation's output.

use proto_ast::SourceFile;
use proto_diagnostics::Span;
use proto_ir::{DescriptorPool, EnumIndex, MessageIndex, ServiceIndex};
use prost_types::source_code_info::Location;
use prost_types::SourceCodeInfo;

use crate::options::SourceInfoMode;

// Field numbers `descriptor.proto` assigns the containers this module walks
// (see `proto-resolve`'s embedded `wkt/descriptor.proto`).
const FILE_MESSAGE_TYPE: i32 = 4;
const FILE_ENUM_TYPE: i32 = 5;
const FILE_SERVICE: i32 = 6;
const MESSAGE_FIELD: i32 = 2;
const MESSAGE_NESTED_TYPE: i32 = 3;
const MESSAGE_ENUM_TYPE: i32 = 4;
const MESSAGE_ONEOF_DECL: i32 = 8;
const ENUM_VALUE: i32 = 2;
const SERVICE_METHOD: i32 = 2;

/// Builds `source_code_info` for `pool`, or returns `None` for
/// [`SourceInfoMode::None`]. `file` is required for
/// [`SourceInfoMode::ExtraComments`] (comment text lives on the `SourceFile`,
/// not in the pool) and ignored otherwise.
pub fn build(pool: &DescriptorPool, file: Option<&SourceFile>, mode: SourceInfoMode) -> Option<SourceCodeInfo> {
    if matches!(mode, SourceInfoMode::None) {
        return None;
    }

    let mut locations = Vec::new();
    for (i, &index) in pool.top_level_messages.iter().enumerate() {
        push_message(pool, index, vec![FILE_MESSAGE_TYPE, i as i32], file, mode, &mut locations);
    }
    for (i, &index) in pool.top_level_enums.iter().enumerate() {
        push_enum(pool, index, vec![FILE_ENUM_TYPE, i as i32], file, mode, &mut locations);
    }
    for (i, &index) in pool.top_level_services.iter().enumerate() {
        push_service(pool, index, vec![FILE_SERVICE, i as i32], file, mode, &mut locations);
    }

    Some(SourceCodeInfo { location: locations })
}

fn push_message(
    pool: &DescriptorPool,
    index: MessageIndex,
    path: Vec<i32>,
    file: Option<&SourceFile>,
    mode: SourceInfoMode,
    out: &mut Vec<Location>,
) {
    let data = pool.message(index);
    out.push(location(&path, &data.span, file, mode));

    for (i, &field) in data.fields.iter().enumerate() {
        let mut field_path = path.clone();
        field_path.extend([MESSAGE_FIELD, i as i32]);
        out.push(location(&field_path, &pool.field(field).span, file, mode));
    }

    for (i, &nested) in data.nested_messages.iter().enumerate() {
        let mut nested_path = path.clone();
        nested_path.extend([MESSAGE_NESTED_TYPE, i as i32]);
        push_message(pool, nested, nested_path, file, mode, out);
    }

    for (i, &nested) in data.nested_enums.iter().enumerate() {
        let mut nested_path = path.clone();
        nested_path.extend([MESSAGE_ENUM_TYPE, i as i32]);
        push_enum(pool, nested, nested_path, file, mode, out);
    }

    for (i, &oneof) in data.oneofs.iter().enumerate() {
        let mut oneof_path = path.clone();
        oneof_path.extend([MESSAGE_ONEOF_DECL, i as i32]);
        out.push(location(&oneof_path, &pool.oneof(oneof).span, file, mode));
    }
}

fn push_enum(
    pool: &DescriptorPool,
    index: EnumIndex,
    path: Vec<i32>,
    file: Option<&SourceFile>,
    mode: SourceInfoMode,
    out: &mut Vec<Location>,
) {
    let data = pool.enum_(index);
    out.push(location(&path, &data.span, file, mode));

    for (i, &value) in data.values.iter().enumerate() {
        let mut value_path = path.clone();
        value_path.extend([ENUM_VALUE, i as i32]);
        out.push(location(&value_path, &pool.enum_value(value).span, file, mode));
    }
}

fn push_service(
    pool: &DescriptorPool,
    index: ServiceIndex,
    path: Vec<i32>,
    file: Option<&SourceFile>,
    mode: SourceInfoMode,
    out: &mut Vec<Location>,
) {
    let data = pool.service(index);
    out.push(location(&path, &data.span, file, mode));

    for (i, &method) in data.methods.iter().enumerate() {
        let mut method_path = path.clone();
        method_path.extend([SERVICE_METHOD, i as i32]);
        out.push(location(&method_path, &pool.method(method).span, file, mode));
    }
}

fn location(path: &[i32], span: &Span, file: Option<&SourceFile>, mode: SourceInfoMode) -> Location {
    let mut loc = Location {
        path: path.to_vec(),
        span: span_to_proto(span),
        leading_comments: None,
        trailing_comments: None,
        leading_detached_comments: Vec::new(),
    };

    if matches!(mode, SourceInfoMode::ExtraComments) {
        if let Some(file) = file {
            attach_comments(&mut loc, span, file);
        }
    }

    loc
}

/// `protoc`'s span encoding: 0-based `[start_line, start_col, end_col]` when
/// the location fits on one line, `[start_line, start_col, end_line,
/// end_col]` otherwise.
fn span_to_proto(span: &Span) -> Vec<i32> {
    let start_line = (span.start_line.saturating_sub(1)) as i32;
    let start_col = (span.start_col.saturating_sub(1)) as i32;
    let end_line = (span.end_line.saturating_sub(1)) as i32;
    let end_col = (span.end_col.saturating_sub(1)) as i32;

    if span.start_line == span.end_line {
        vec![start_line, start_col, end_col]
    } else {
        vec![start_line, start_col, end_line, end_col]
    }
}

/// Best-effort comment attribution: finds the token whose span starts where
/// `span` starts (every declaration's span is seeded from its leading
/// token's span, see `proto_ast::SourceFile::token_at_offset`), then joins
/// whatever `SourceFile` has attributed to it.
///
/// Each `detached` comment block is recorded as its own
/// `leading_detached_comments` entry; consecutive leading/trailing line
/// comments are joined into a single string with `protoc`'s own
/// `leading_comments`/`trailing_comments` field, stripping comment markers.
fn attach_comments(loc: &mut Location, span: &Span, file: &SourceFile) {
    let Some(token) = file.token_at_offset(span.start_offset) else { return };

    let leading: Vec<String> = file.leading_comments(token).into_iter().map(|c| strip_marker(file.text_of(c))).collect();
    if !leading.is_empty() {
        loc.leading_comments = Some(leading.join("\n"));
    }

    let trailing: Vec<String> = file.trailing_comments(token).into_iter().map(|c| strip_marker(file.text_of(c))).collect();
    if !trailing.is_empty() {
        loc.trailing_comments = Some(trailing.join("\n"));
    }

    loc.leading_detached_comments = file.detached_comments(token).into_iter().map(|c| strip_marker(file.text_of(c))).collect();
}

fn strip_marker(text: &str) -> String {
    let trimmed = text.trim();
    if let Some(rest) = trimmed.strip_prefix("//") {
        rest.strip_prefix(' ').unwrap_or(rest).to_string()
    } else if let Some(rest) = trimmed.strip_prefix("/*").and_then(|r| r.strip_suffix("*/")) {
        rest.trim().to_string()
    } else {
        trimmed.to_string()
    }
}
