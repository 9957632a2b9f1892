pub mod archive_ref;
pub mod error;
pub mod import_path;
pub mod importer;
pub mod interface;
pub mod package;
pub mod solvable;
pub mod types;

// Re-export commonly used types
pub use archive_ref::{parse_archive, ArchiveRef};
pub use error::{CoreError, ImportError};
pub use import_path::{crate_name_for, is_stdlib_import};
pub use importer::Importer;
pub use interface::{InterfaceDescriptor, MethodDescriptor, ParamDescriptor, TraitImpl};
pub use package::{
    AliasDef, ItemDef, ItemKind, LifetimeParam, MethodSig, ParamSig, PackageTypes, Receiver,
    TraitDef, Visibility,
};
pub use solvable::Solvable;
pub use types::{Bound, FnSugar, GenericArg, ItemRef, Primitive, TypeDescriptor};
