//! Typed error for the proto-options crate.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OptionError {
    /// An option name part didn't resolve to a field of the options message
    /// (or extension) it was being applied to.
    #[error("option {0}: unknown field {1}")]
    UnknownField(String, String),

    /// A name part, walked structurally against a resolved message type,
    /// named a field that message doesn't declare.
    #[error("option {0}: field {1} of {2} does not exist")]
    UnknownFieldOf(String, String, String),

    /// An `(ext)` name part didn't resolve to a registered extension of the
    /// message it was being applied to.
    #[error("option {0}: {1} is not a known extension of {2}")]
    UnknownExtension(String, String, String),

    /// A non-last name part resolved to something other than a singular
    /// message field, so it can't be walked into.
    #[error("option {0}: {1} is not a singular message field, cannot set a nested field on it")]
    NotASingularMessage(String, String),

    /// The source value's shape or range doesn't fit the target field type.
    #[error("option {0}: value does not fit field of type {1}")]
    TypeMismatch(String, String),

    /// An enum-valued option named an identifier with no matching enum value.
    #[error("option {0}: {1} is not a value of enum {2}")]
    UnknownEnumValue(String, String, String),

    /// Two fields of the same oneof were both set by options on one element.
    #[error("oneof \"{0}\" already has field \"{1}\" set")]
    OneofConflict(String, String),

    /// A field marked `required` in an options message was never set.
    #[error("option message for {0} is missing required field {1}")]
    MissingRequiredField(String, String),

    /// Strict mode: the option name or value could not be interpreted and
    /// lenient fallback is not permitted.
    #[error("option {0} could not be interpreted in strict mode: {1}")]
    StrictInterpretFailed(String, String),

    /// The `FeatureSet` descriptor a file's editions depend on is shaped in a
    /// way the resolver cannot reason about (oneof/required/repeated/map
    /// feature field).
    #[error("feature set is malformed: field {0} must be a singular optional scalar or enum")]
    MalformedFeatureSet(String),

    /// No `edition_defaults` entry exists with an edition `<=` the file's.
    #[error("no edition default found for feature {0} at edition {1}")]
    NoEditionDefault(String, String),
}

pub type Result<T> = std::result::Result<T, OptionError>;
