//! Declared content-schema model and name canonicalization

pub mod manifest;
pub mod naming;
pub mod types;

pub use manifest::{load_manifest, parse_manifest, Manifest, ManifestContentType, ManifestField};
pub use naming::{to_camel_case, to_snake_case};
pub use types::{ContentTypeDef, FieldDef, FieldType, ReferenceTarget};
