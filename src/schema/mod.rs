//! XSD schema compilation and validation.
//!
//! A schema is compiled once into flat lookup tables ([`Schema`]) and then
//! shared read-only across validations. The bundled OME schema compiles
//! lazily on first use; a custom schema file can be loaded explicitly.

pub mod loader;
mod model;
mod validator;

pub use loader::{bundled, from_file, from_str};
pub use model::{
    AttributeDecl, BuiltInType, ComplexType, ElementDecl, Particle, Schema, SimpleType,
    SimpleTypeRef, TypeRef,
};
pub use validator::{validate_document, ValidationOutcome};
