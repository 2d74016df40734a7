use crate::core::{CoerceError, Value};
use serde::Serialize;
use std::fmt;

/// Wire-level metadata for one entity field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FieldDescriptor {
    /// Procedure parameter / result column name. May differ from the Rust
    /// field name.
    pub external_name: &'static str,
    /// Emitted by the save binder when `true`.
    pub save_eligible: bool,
    /// Identifying field, bound by `delete`.
    pub is_key: bool,
}

impl FieldDescriptor {
    pub const fn new(external_name: &'static str) -> Self {
        Self {
            external_name,
            save_eligible: true,
            is_key: false,
        }
    }

    pub const fn save_eligible(mut self, save_eligible: bool) -> Self {
        self.save_eligible = save_eligible;
        self
    }

    /// Shorthand for `save_eligible(false)`: read back, never saved.
    pub const fn read_only(self) -> Self {
        self.save_eligible(false)
    }

    pub const fn key(mut self) -> Self {
        self.is_key = true;
        self
    }
}

pub type FieldGetter<T> = fn(&T) -> Value;
pub type FieldSetter<T> = fn(&mut T, &Value) -> Result<(), CoerceError>;

/// A field descriptor bound to accessors on `T`.
pub struct FieldBinding<T> {
    descriptor: FieldDescriptor,
    field_name: &'static str,
    get: FieldGetter<T>,
    set: FieldSetter<T>,
}

impl<T> FieldBinding<T> {
    pub fn new(
        descriptor: FieldDescriptor,
        field_name: &'static str,
        get: FieldGetter<T>,
        set: FieldSetter<T>,
    ) -> Self {
        Self {
            descriptor,
            field_name,
            get,
            set,
        }
    }

    pub fn descriptor(&self) -> &FieldDescriptor {
        &self.descriptor
    }

    pub fn external_name(&self) -> &'static str {
        self.descriptor.external_name
    }

    /// Rust-side field name, used in diagnostics only.
    pub fn field_name(&self) -> &'static str {
        self.field_name
    }

    pub fn is_save_eligible(&self) -> bool {
        self.descriptor.save_eligible
    }

    pub fn is_key(&self) -> bool {
        self.descriptor.is_key
    }

    pub fn read(&self, instance: &T) -> Value {
        (self.get)(instance)
    }

    /// Coerces `value` into the field's type and assigns it. On error the
    /// instance is left unchanged.
    pub fn write(&self, instance: &mut T, value: &Value) -> Result<(), CoerceError> {
        (self.set)(instance, value)
    }
}

impl<T> Clone for FieldBinding<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for FieldBinding<T> {}

impl<T> fmt::Debug for FieldBinding<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldBinding")
            .field("field_name", &self.field_name)
            .field("descriptor", &self.descriptor)
            .finish()
    }
}
