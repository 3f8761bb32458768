//! Structural and link-time failures (spec §4.3–§4.5), grouped the same way
//! as [`proto_diagnostics::CompileError`]: by cause, not by the phase that
//! raised them.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IrError {
    #[error("field number {0} is out of range [1, 536870911] or reserved (19000-19999)")]
    FieldNumberOutOfRange(i64),

    #[error("duplicate field number {number} in message {message}")]
    DuplicateFieldNumber { message: String, number: i32 },

    #[error("enum value number {0} out of int32 range")]
    EnumValueOutOfRange(i64),

    #[error("proto3 enum {0} must declare value 0 first")]
    Proto3EnumMissingZero(String),

    #[error("duplicate enum value number {number} in enum {enum_name} (allow_alias not set)")]
    DuplicateEnumNumber { enum_name: String, number: i32 },

    #[error("extension range [{start}, {end}) overlaps reserved range in message {message}")]
    RangeOverlap { message: String, start: i32, end: i32 },

    #[error("message nesting depth exceeds 31 at {0}")]
    NestingTooDeep(String),

    #[error("{0} is already defined as {1}")]
    AlreadyDefined(String, String),

    #[error("symbol {0} not found")]
    SymbolNotFound(String),

    #[error("ambiguous shallow match on {0}; scoping halted (spec §4.5 rule 4)")]
    ShallowMatchHalt(String),

    #[error("{name} is a {actual}, expected a {expected}")]
    WrongKind { name: String, expected: String, actual: String },

    #[error("extension (extendee {extendee}, tag {tag}) already registered")]
    DuplicateExtension { extendee: String, tag: i32 },

    #[error("extension tag {tag} on {extendee} is not within a declared extension range")]
    ExtensionTagNotInRange { extendee: String, tag: i32 },

    #[error("proto3 field {0} may not reference a proto2 enum")]
    Proto3FieldReferencesProto2Enum(String),

    #[error("{0} must resolve to a message, found {1}")]
    ExpectedMessage(String, String),

    #[error("a message with map_entry=true may not be declared directly: {0}")]
    ExplicitMapEntry(String),

    #[error("message_set_wire_format is only valid under proto2: {0}")]
    MessageSetRequiresProto2(String),

    #[error("message {0} with message_set_wire_format=true must declare at least one extension range and no non-extension fields")]
    InvalidMessageSet(String),

    #[error("messages with message-set wire format cannot contain scalar extensions, only messages")]
    ScalarExtensionOnMessageSet,
}

pub type Result<T> = std::result::Result<T, IrError>;
