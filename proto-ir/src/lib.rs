//! Lowers a parsed `.proto` file into descriptor form, links it against the
//! rest of a compilation, and exposes the result as a queryable descriptor
//! pool (spec §4.3–§4.5).
//!
//! This crate does not interpret custom options (`proto-options`) and does
//! not schedule or cache compilation units across a changing file set
//! (`proto-exec`); it is the structural core those crates build on.

pub mod errors;
pub mod linker;
pub mod lower;
pub mod pool;
pub mod symbol_table;

pub use errors::IrError;
pub use linker::{link_file, LinkedFile};
pub use lower::lower_file;
pub use pool::{
    DescriptorPool, EnumDescriptor, EnumIndex, EnumValueDescriptor, EnumValueIndex,
    FieldDescriptor, FieldIndex, MessageDescriptor, MessageIndex, MethodDescriptor, MethodIndex,
    OneofDescriptor, OneofIndex, PoolView, ServiceDescriptor, ServiceIndex,
};
pub use symbol_table::{PackageView, SymbolKind, SymbolTable};
