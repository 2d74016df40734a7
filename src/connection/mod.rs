pub mod config;

pub use config::{ConnectionConfig, EnvTokenSource, MapTokenSource, TokenSource};
