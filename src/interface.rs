use async_trait::async_trait;
use crate::binder::Parameter;
use crate::core::{Result, Value};
use crate::result::QueryResult;

/// An open connection able to invoke stored procedures.
///
/// Wrap a real driver (SQL Server, Postgres, ...) to implement this trait for
/// production use, or use [`crate::memory::InMemoryConnector`] in tests.
#[async_trait]
pub trait ProcedureConnection: Send {
    /// Execute a procedure and read its row stream.
    async fn query(&mut self, procedure: &str, params: &[Parameter]) -> Result<QueryResult>;

    /// Execute a procedure and read a single scalar. Absent results are
    /// `Value::Null`.
    async fn scalar(&mut self, procedure: &str, params: &[Parameter]) -> Result<Value>;

    /// Release the connection.
    async fn close(self) -> Result<()>;
}

/// A factory for procedure connections.
#[async_trait]
pub trait Connector: Send + Sync {
    type Connection: ProcedureConnection;

    /// Open a connection using a resolved connection string.
    async fn connect(&self, connection_string: &str) -> Result<Self::Connection>;
}
