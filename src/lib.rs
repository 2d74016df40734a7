// ============================================================================
// procbind Library
// ============================================================================

//! Binds Rust structs to stored-procedure calls through field metadata.
//!
//! Fields opt in with `#[db_field("ExternalName")]`; the type carries its
//! save/delete procedures with `#[db_info(...)]`. [`Database`] then turns an
//! instance into procedure parameters and result rows back into instances,
//! matching by external name.
//!
//! ```ignore
//! use procbind::{Database, DbEntity, params};
//!
//! #[derive(Debug, Default, DbEntity)]
//! #[db_info(save = "dbo.UserSave", return_id = "UserID")]
//! struct User {
//!     #[db_field("UserID", save = false, key)]
//!     id: i64,
//!     #[db_field("UserName")]
//!     name: String,
//! }
//!
//! # async fn run(db: &Database<impl procbind::Connector>) -> procbind::Result<()> {
//! let mut user = User { name: "Ann".into(), ..Default::default() };
//! db.save(&mut user, "APP_DB").await?;          // binds @UserName, assigns id
//!
//! let users: Vec<User> = db.fetch_list("APP_DB", "dbo.UserList", &params![], false).await?;
//! # Ok(())
//! # }
//! ```

extern crate self as procbind;

pub mod binder;
pub mod connection;
pub mod convert;
pub mod core;
pub mod facade;
pub mod hydrator;
pub mod interface;
pub mod memory;
pub mod metadata;
pub mod result;

// Re-export main types for convenience
pub use binder::{Parameter, bind, bind_keys};
pub use connection::{ConnectionConfig, EnvTokenSource, MapTokenSource, TokenSource};
pub use convert::{FromValue, ToValue};
pub use crate::core::{CoerceError, DbError, Result, Row, Value};
pub use facade::Database;
pub use hydrator::{HydrationReport, hydrate_many, hydrate_one};
pub use interface::{Connector, ProcedureConnection};
pub use memory::InMemoryConnector;
pub use metadata::{
    DbEntity, EntityDescriptor, FieldBinding, FieldDescriptor, find_field, resolve_entity,
    resolve_fields,
};
pub use result::QueryResult;

pub use procbind_derive::DbEntity;
