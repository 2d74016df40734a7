use crate::core::Value;
use crate::metadata::FieldBinding;
use serde::Serialize;
use std::fmt;

/// A named procedure parameter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Parameter {
    pub name: String,
    pub value: Value,
}

impl Parameter {
    pub fn new(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{} = {}", self.name, self.value)
    }
}

/// Builds a `Vec<Parameter>` from `name => value` pairs.
///
/// ```ignore
/// let params = params!["UserID" => 42, "Active" => true];
/// ```
#[macro_export]
macro_rules! params {
    () => {
        ::std::vec::Vec::<$crate::Parameter>::new()
    };
    ($($name:expr => $value:expr),+ $(,)?) => {
        vec![$($crate::Parameter::new($name, $value)),+]
    };
}

/// Save parameters: one per save-eligible field, in declaration order.
pub fn bind<T>(instance: &T, fields: &[FieldBinding<T>]) -> Vec<Parameter> {
    bind_where(instance, fields, FieldBinding::is_save_eligible)
}

/// Parameters for the key fields only.
pub fn bind_keys<T>(instance: &T, fields: &[FieldBinding<T>]) -> Vec<Parameter> {
    bind_where(instance, fields, FieldBinding::is_key)
}

fn bind_where<T>(
    instance: &T,
    fields: &[FieldBinding<T>],
    include: impl Fn(&FieldBinding<T>) -> bool,
) -> Vec<Parameter> {
    fields
        .iter()
        .filter(|field| include(*field))
        .map(|field| Parameter {
            name: field.external_name().to_string(),
            value: field.read(instance),
        })
        .collect()
}

/// Parameter names only, for trace logs.
pub(crate) fn parameter_names(params: &[Parameter]) -> Vec<&str> {
    params.iter().map(|p| p.name.as_str()).collect()
}
