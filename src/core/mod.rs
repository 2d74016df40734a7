pub mod error;
pub mod types;
pub mod value;

pub use error::{CoerceError, DbError, Result};
pub use types::Row;
pub use value::Value;
