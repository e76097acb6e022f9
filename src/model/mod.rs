//! Typed representation of an application metadata export.
//!
//! The structures mirror the JSON served by the metadata endpoint. Unknown
//! keys are ignored; options the analyses do not interpret are kept as raw
//! JSON values so exports round-trip without loss of the parts we read.

pub mod application;
pub mod object;
pub mod scene;

#[cfg(test)]
pub(crate) mod fixtures;

pub use application::{Account, AppExport, Application, HomeScene};
pub use object::{
    Cardinality, Connection, Connections, FieldFormat, FieldRelationship, Inflections,
    KnackField, KnackObject, ObjectSort, SortOrder,
};
pub use scene::{FieldKeyRef, ParentSource, Scene, View, ViewColumn, ViewSort, ViewSource};
