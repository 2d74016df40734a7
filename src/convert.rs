//! Coercion between Rust field types and [`Value`].
//!
//! `ToValue` is infallible and feeds the parameter binder. `FromValue` is the
//! hydration direction and reports a [`CoerceError`] instead of panicking when
//! a column cannot be represented by the field's type.

use crate::core::{CoerceError, Value};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use uuid::Uuid;

pub trait ToValue {
    fn to_value(&self) -> Value;
}

pub trait FromValue: Sized {
    /// Rust type name used in coercion diagnostics.
    fn type_label() -> &'static str;

    fn from_value(value: &Value) -> Result<Self, CoerceError>;
}

fn mismatch<T: FromValue>(value: &Value) -> CoerceError {
    CoerceError::new(value.type_name(), T::type_label())
}

macro_rules! impl_integer {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl ToValue for $ty {
                fn to_value(&self) -> Value {
                    Value::Integer(*self as i64)
                }
            }

            impl FromValue for $ty {
                fn type_label() -> &'static str {
                    stringify!($ty)
                }

                fn from_value(value: &Value) -> Result<Self, CoerceError> {
                    let wide = match value {
                        Value::Integer(_) | Value::Float(_) => value.as_i64(),
                        Value::Boolean(b) => Some(i64::from(*b)),
                        Value::Text(s) => s.trim().parse::<i64>().ok(),
                        _ => None,
                    }
                    .ok_or_else(|| mismatch::<Self>(value))?;

                    <$ty>::try_from(wide).map_err(|_| {
                        mismatch::<Self>(value).with_detail(format!("{wide} is out of range"))
                    })
                }
            }
        )+
    };
}

impl_integer!(i8, i16, i32, i64, u8, u16, u32);

/// Values above `i64::MAX` are bound as decimal text.
impl ToValue for u64 {
    fn to_value(&self) -> Value {
        match i64::try_from(*self) {
            Ok(i) => Value::Integer(i),
            Err(_) => Value::Text(self.to_string()),
        }
    }
}

impl FromValue for u64 {
    fn type_label() -> &'static str {
        "u64"
    }

    fn from_value(value: &Value) -> Result<Self, CoerceError> {
        if let Value::Text(s) = value {
            if let Ok(parsed) = s.trim().parse::<u64>() {
                return Ok(parsed);
            }
        }
        let wide = i64::from_value(value).map_err(|_| mismatch::<Self>(value))?;
        u64::try_from(wide)
            .map_err(|_| mismatch::<Self>(value).with_detail(format!("{wide} is negative")))
    }
}

impl ToValue for f64 {
    fn to_value(&self) -> Value {
        Value::Float(*self)
    }
}

impl FromValue for f64 {
    fn type_label() -> &'static str {
        "f64"
    }

    fn from_value(value: &Value) -> Result<Self, CoerceError> {
        match value {
            Value::Float(_) | Value::Integer(_) => value.as_f64(),
            Value::Text(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
        .ok_or_else(|| mismatch::<Self>(value))
    }
}

impl ToValue for f32 {
    fn to_value(&self) -> Value {
        Value::Float(f64::from(*self))
    }
}

impl FromValue for f32 {
    fn type_label() -> &'static str {
        "f32"
    }

    fn from_value(value: &Value) -> Result<Self, CoerceError> {
        f64::from_value(value)
            .map(|f| f as f32)
            .map_err(|_| mismatch::<Self>(value))
    }
}

impl ToValue for bool {
    fn to_value(&self) -> Value {
        Value::Boolean(*self)
    }
}

impl FromValue for bool {
    fn type_label() -> &'static str {
        "bool"
    }

    fn from_value(value: &Value) -> Result<Self, CoerceError> {
        match value {
            Value::Boolean(b) => Ok(*b),
            // BIT columns arrive as 0/1.
            Value::Integer(0) => Ok(false),
            Value::Integer(1) => Ok(true),
            Value::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "1" => Ok(true),
                "false" | "0" => Ok(false),
                _ => Err(mismatch::<Self>(value)),
            },
            _ => Err(mismatch::<Self>(value)),
        }
    }
}

impl ToValue for String {
    fn to_value(&self) -> Value {
        Value::Text(self.clone())
    }
}

impl ToValue for &str {
    fn to_value(&self) -> Value {
        Value::Text((*self).to_string())
    }
}

impl FromValue for String {
    fn type_label() -> &'static str {
        "String"
    }

    fn from_value(value: &Value) -> Result<Self, CoerceError> {
        match value {
            Value::Null | Value::Bytes(_) => Err(mismatch::<Self>(value)),
            Value::Text(s) => Ok(s.clone()),
            other => Ok(other.to_string()),
        }
    }
}

impl ToValue for Uuid {
    fn to_value(&self) -> Value {
        Value::Uuid(*self)
    }
}

impl FromValue for Uuid {
    fn type_label() -> &'static str {
        "Uuid"
    }

    fn from_value(value: &Value) -> Result<Self, CoerceError> {
        match value {
            Value::Uuid(u) => Ok(*u),
            Value::Text(s) => Uuid::parse_str(s.trim())
                .map_err(|err| mismatch::<Self>(value).with_detail(err.to_string())),
            Value::Bytes(b) => Uuid::from_slice(b)
                .map_err(|err| mismatch::<Self>(value).with_detail(err.to_string())),
            _ => Err(mismatch::<Self>(value)),
        }
    }
}

impl ToValue for DateTime<Utc> {
    fn to_value(&self) -> Value {
        Value::Timestamp(*self)
    }
}

impl FromValue for DateTime<Utc> {
    fn type_label() -> &'static str {
        "DateTime<Utc>"
    }

    fn from_value(value: &Value) -> Result<Self, CoerceError> {
        match value {
            Value::Timestamp(ts) => Ok(*ts),
            Value::Text(s) => DateTime::parse_from_rfc3339(s.trim())
                .map(|ts| ts.with_timezone(&Utc))
                .or_else(|_| {
                    NaiveDateTime::parse_from_str(s.trim(), "%Y-%m-%d %H:%M:%S%.f")
                        .map(|naive| naive.and_utc())
                })
                .map_err(|err| mismatch::<Self>(value).with_detail(err.to_string())),
            _ => Err(mismatch::<Self>(value)),
        }
    }
}

impl ToValue for NaiveDate {
    fn to_value(&self) -> Value {
        Value::Date(*self)
    }
}

impl FromValue for NaiveDate {
    fn type_label() -> &'static str {
        "NaiveDate"
    }

    fn from_value(value: &Value) -> Result<Self, CoerceError> {
        match value {
            Value::Date(d) => Ok(*d),
            Value::Timestamp(ts) => Ok(ts.date_naive()),
            Value::Text(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
                .map_err(|err| mismatch::<Self>(value).with_detail(err.to_string())),
            _ => Err(mismatch::<Self>(value)),
        }
    }
}

impl ToValue for Vec<u8> {
    fn to_value(&self) -> Value {
        Value::Bytes(self.clone())
    }
}

impl FromValue for Vec<u8> {
    fn type_label() -> &'static str {
        "Vec<u8>"
    }

    fn from_value(value: &Value) -> Result<Self, CoerceError> {
        match value {
            Value::Bytes(b) => Ok(b.clone()),
            _ => Err(mismatch::<Self>(value)),
        }
    }
}

impl ToValue for Value {
    fn to_value(&self) -> Value {
        self.clone()
    }
}

impl FromValue for Value {
    fn type_label() -> &'static str {
        "Value"
    }

    fn from_value(value: &Value) -> Result<Self, CoerceError> {
        Ok(value.clone())
    }
}

impl<T: ToValue> ToValue for Option<T> {
    fn to_value(&self) -> Value {
        match self {
            Some(value) => value.to_value(),
            None => Value::Null,
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn type_label() -> &'static str {
        T::type_label()
    }

    fn from_value(value: &Value) -> Result<Self, CoerceError> {
        if value.is_null() {
            return Ok(None);
        }
        T::from_value(value).map(Some)
    }
}
