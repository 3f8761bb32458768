//! Interprets `uninterpreted_option` entries left by `proto-ir`'s lowering
//! pass into typed option fields, and resolves editions `FeatureSet`
//! inheritance (spec §4.6).
//!
//! Runs after linking: option names that reference message/enum types (an
//! enum-valued option, a message-literal aggregate) need the symbol table
//! `proto-ir::linker` already populated, and the unused-import warning spec
//! §4.5 describes is only computable once option interpretation has run.

mod error;
mod features;
mod interpret;

pub use error::{OptionError, Result};
pub use features::{edition_cmp, resolve_features, FeatureDefaults};
pub use interpret::{
    interpret_enum_options, interpret_enum_value_options, interpret_field_options,
    interpret_file_options, interpret_message_options, interpret_method_options,
    interpret_oneof_options, interpret_service_options, InterpretMode, OptionsContext,
};
