//! Resolves `import` paths to file bytes (spec §6), combining a
//! caller-supplied resolution strategy with the well-known `.proto`
//! sources every compiler front end must serve without being told where
//! they live on disk.

pub mod resolver;
pub mod well_known;

pub use resolver::{
    AnyResolver, CompositeResolver, DirectoryResolver, Resolver, WellKnownTypesResolver,
};
pub use well_known::{known_paths, lookup as lookup_well_known};
