//! Field and entity metadata, and its discovery.

pub mod entity;
pub mod field;
pub mod resolver;

pub use entity::EntityDescriptor;
pub use field::{FieldBinding, FieldDescriptor, FieldGetter, FieldSetter};
pub use resolver::{DbEntity, find_field, resolve_entity, resolve_fields};
