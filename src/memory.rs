//! An in-process [`Connector`] backed by registered procedure handlers.
//!
//! Handlers receive the bound parameters and return a [`QueryResult`]; scalar
//! calls read the first column of the first row, like `ExecuteScalar`. Every
//! call and every open/close is journaled so tests can assert on what the
//! engine sent.

use crate::binder::Parameter;
use crate::core::{DbError, Result, Value};
use crate::interface::{Connector, ProcedureConnection};
use crate::result::QueryResult;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

type Handler = Arc<dyn Fn(&[Parameter]) -> Result<QueryResult> + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallMode {
    Rows,
    Scalar,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CallRecord {
    pub connection_string: String,
    pub procedure: String,
    pub params: Vec<Parameter>,
    pub mode: CallMode,
}

#[derive(Debug, Default)]
struct Journal {
    calls: Vec<CallRecord>,
    opened: usize,
    closed: usize,
}

#[derive(Clone, Default)]
pub struct InMemoryConnector {
    procedures: Arc<HashMap<String, Handler>>,
    journal: Arc<Mutex<Journal>>,
    refuse_connections: bool,
    fail_close: bool,
}

impl InMemoryConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` under `name`, replacing any previous handler.
    pub fn with_procedure<F>(mut self, name: &str, handler: F) -> Self
    where
        F: Fn(&[Parameter]) -> Result<QueryResult> + Send + Sync + 'static,
    {
        Arc::make_mut(&mut self.procedures).insert(name.to_string(), Arc::new(handler));
        self
    }

    /// Registers a procedure that always returns `result`.
    pub fn with_result(self, name: &str, result: QueryResult) -> Self {
        self.with_procedure(name, move |_| Ok(result.clone()))
    }

    /// Registers a procedure whose scalar is always `value`.
    pub fn with_scalar(self, name: &str, value: impl Into<Value>) -> Self {
        let value = value.into();
        self.with_result(name, QueryResult::new(vec!["".into()], vec![vec![value]]))
    }

    /// Makes every `connect` fail, to exercise transport errors.
    pub fn refuse_connections(mut self) -> Self {
        self.refuse_connections = true;
        self
    }

    /// Makes every `close` fail after the connection is released.
    pub fn fail_close(mut self) -> Self {
        self.fail_close = true;
        self
    }

    pub async fn calls(&self) -> Vec<CallRecord> {
        self.journal.lock().await.calls.clone()
    }

    pub async fn call_count(&self) -> usize {
        self.journal.lock().await.calls.len()
    }

    /// Connections opened and not yet closed.
    pub async fn open_connections(&self) -> usize {
        let journal = self.journal.lock().await;
        journal.opened - journal.closed
    }

    pub async fn opened_connections(&self) -> usize {
        self.journal.lock().await.opened
    }
}

#[async_trait]
impl Connector for InMemoryConnector {
    type Connection = InMemoryConnection;

    async fn connect(&self, connection_string: &str) -> Result<Self::Connection> {
        if self.refuse_connections {
            return Err(DbError::Connection(format!(
                "connection refused for '{}'",
                connection_string
            )));
        }

        self.journal.lock().await.opened += 1;
        Ok(InMemoryConnection {
            connection_string: connection_string.to_string(),
            procedures: Arc::clone(&self.procedures),
            journal: Arc::clone(&self.journal),
            fail_close: self.fail_close,
        })
    }
}

pub struct InMemoryConnection {
    connection_string: String,
    procedures: Arc<HashMap<String, Handler>>,
    journal: Arc<Mutex<Journal>>,
    fail_close: bool,
}

impl InMemoryConnection {
    async fn invoke(&self, procedure: &str, params: &[Parameter], mode: CallMode) -> Result<QueryResult> {
        self.journal.lock().await.calls.push(CallRecord {
            connection_string: self.connection_string.clone(),
            procedure: procedure.to_string(),
            params: params.to_vec(),
            mode,
        });

        let handler = self
            .procedures
            .get(procedure)
            .ok_or_else(|| DbError::ProcedureNotFound(procedure.to_string()))?;
        handler(params)
    }
}

#[async_trait]
impl ProcedureConnection for InMemoryConnection {
    async fn query(&mut self, procedure: &str, params: &[Parameter]) -> Result<QueryResult> {
        self.invoke(procedure, params, CallMode::Rows).await
    }

    async fn scalar(&mut self, procedure: &str, params: &[Parameter]) -> Result<Value> {
        self.invoke(procedure, params, CallMode::Scalar)
            .await
            .map(|result| result.scalar())
    }

    async fn close(self) -> Result<()> {
        self.journal.lock().await.closed += 1;
        if self.fail_close {
            return Err(DbError::Connection(format!(
                "close failed for '{}'",
                self.connection_string
            )));
        }
        Ok(())
    }
}
