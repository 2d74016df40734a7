use crate::binder::{Parameter, bind, bind_keys, parameter_names};
use crate::connection::{ConnectionConfig, EnvTokenSource, TokenSource};
use crate::core::{DbError, Result, Value};
use crate::hydrator::{HydrationReport, hydrate_many, hydrate_one};
use crate::interface::{Connector, ProcedureConnection};
use crate::metadata::{DbEntity, find_field, resolve_entity, resolve_fields};
use crate::result::QueryResult;
use tracing::Instrument;

/// Runs metadata-bound procedure calls through a [`Connector`].
///
/// Every operation opens its own connection, performs a single exchange and
/// closes the connection before returning, on success and on error. No state
/// is kept between calls.
///
/// # Examples
///
/// ```ignore
/// let db = Database::new(connector);
///
/// let mut user = User::default();
/// db.fetch_one(&mut user, "APP_DB", "dbo.UserGetByID", &params!["UserID" => 42]).await?;
///
/// user.name = "Ann".into();
/// db.save(&mut user, "APP_DB").await?;
/// ```
pub struct Database<C, S = EnvTokenSource> {
    connector: C,
    source: S,
    config: ConnectionConfig,
}

impl<C: Connector> Database<C> {
    /// Resolves connection tokens from the process environment.
    pub fn new(connector: C) -> Self {
        Self {
            connector,
            source: EnvTokenSource,
            config: ConnectionConfig::default(),
        }
    }
}

impl<C: Connector, S: TokenSource> Database<C, S> {
    pub fn with_config(connector: C, source: S, config: ConnectionConfig) -> Result<Self> {
        config.validate().map_err(DbError::Config)?;
        Ok(Self {
            connector,
            source,
            config,
        })
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    pub fn connector(&self) -> &C {
        &self.connector
    }

    /// Fills `instance` from the first row returned by `procedure`.
    ///
    /// An empty result leaves `instance` untouched and returns an empty
    /// report.
    pub async fn fetch_one<T: DbEntity>(
        &self,
        instance: &mut T,
        token: &str,
        procedure: &str,
        params: &[Parameter],
    ) -> Result<HydrationReport> {
        let fields = resolve_fields::<T>();
        let result = self.run_query(token, procedure, params).await?;

        Ok(match result.first() {
            Some(row) => hydrate_one(instance, row, &fields),
            None => {
                tracing::debug!(procedure, "procedure returned no rows");
                HydrationReport::default()
            }
        })
    }

    /// Saves `instance` with its entity's save procedure, then writes the
    /// returned scalar into the `return_id` field.
    ///
    /// Types without an entity descriptor or save procedure are skipped
    /// without touching the database.
    pub async fn save<T: DbEntity>(&self, instance: &mut T, token: &str) -> Result<()> {
        let Some(info) = resolve_entity::<T>() else {
            tracing::debug!(entity = std::any::type_name::<T>(), "no entity descriptor, save skipped");
            return Ok(());
        };
        let Some(procedure) = info.save() else {
            tracing::debug!(entity = std::any::type_name::<T>(), "no save procedure, save skipped");
            return Ok(());
        };

        let returned = self.save_with(instance, token, procedure).await?;
        if returned.is_null() {
            return Ok(());
        }
        let Some(return_id) = info.returned_id() else {
            return Ok(());
        };

        let fields = resolve_fields::<T>();
        match find_field(&fields, return_id) {
            Some(field) => {
                if let Err(err) = field.write(instance, &returned) {
                    tracing::debug!(
                        return_id,
                        field = field.field_name(),
                        error = %err,
                        "returned id could not be assigned"
                    );
                }
            }
            None => tracing::debug!(
                return_id,
                "returned id does not resolve to exactly one field"
            ),
        }
        Ok(())
    }

    /// Binds the save-eligible fields of `instance` and runs `procedure` as a
    /// scalar call. Returns the raw scalar, `Value::Null` when absent.
    pub async fn save_with<T: DbEntity>(
        &self,
        instance: &T,
        token: &str,
        procedure: &str,
    ) -> Result<Value> {
        let params = bind(instance, &resolve_fields::<T>());
        self.scalar(procedure, token, &params).await
    }

    /// One hydrated `T` per returned row, plus an optional default-constructed
    /// template at the end.
    pub async fn fetch_list<T: DbEntity>(
        &self,
        token: &str,
        procedure: &str,
        params: &[Parameter],
        append_template: bool,
    ) -> Result<Vec<T>> {
        let fields = resolve_fields::<T>();
        let result = self.run_query(token, procedure, params).await?;

        Ok(hydrate_many(result.rows(), &fields, append_template))
    }

    /// Runs `procedure` and returns its scalar unchanged.
    pub async fn scalar(&self, procedure: &str, token: &str, params: &[Parameter]) -> Result<Value> {
        self.run_scalar(token, procedure, params).await
    }

    /// Runs the entity's delete procedure with its key fields.
    ///
    /// Falls back to the save-eligible fields when the type marks no key.
    /// Types without a delete procedure are skipped.
    pub async fn delete<T: DbEntity>(&self, instance: &T, token: &str) -> Result<()> {
        let Some(procedure) = resolve_entity::<T>().and_then(|info| info.delete()) else {
            tracing::debug!(entity = std::any::type_name::<T>(), "no delete procedure, delete skipped");
            return Ok(());
        };

        let fields = resolve_fields::<T>();
        let mut params = bind_keys(instance, &fields);
        if params.is_empty() {
            params = bind(instance, &fields);
        }

        self.scalar(procedure, token, &params).await?;
        Ok(())
    }

    async fn open(&self, token: &str) -> Result<C::Connection> {
        let connection_string = self.config.resolve(token, &self.source);
        self.connector.connect(&connection_string).await
    }

    async fn run_query(
        &self,
        token: &str,
        procedure: &str,
        params: &[Parameter],
    ) -> Result<QueryResult> {
        let span = tracing::debug_span!("procedure", name = procedure, mode = "rows");
        async {
            tracing::trace!(params = ?parameter_names(params), "invoking procedure");
            let mut conn = self.open(token).await?;
            let outcome = conn.query(procedure, params).await;
            release(conn, outcome).await
        }
        .instrument(span)
        .await
    }

    async fn run_scalar(&self, token: &str, procedure: &str, params: &[Parameter]) -> Result<Value> {
        let span = tracing::debug_span!("procedure", name = procedure, mode = "scalar");
        async {
            tracing::trace!(params = ?parameter_names(params), "invoking procedure");
            let mut conn = self.open(token).await?;
            let outcome = conn.scalar(procedure, params).await;
            release(conn, outcome).await
        }
        .instrument(span)
        .await
    }
}

/// Closes `conn` and merges the close result into the exchange outcome. An
/// exchange error wins over a close error.
async fn release<P: ProcedureConnection, R>(conn: P, outcome: Result<R>) -> Result<R> {
    match (outcome, conn.close().await) {
        (Ok(value), Ok(())) => Ok(value),
        (Ok(_), Err(close_err)) => Err(close_err),
        (Err(err), Ok(())) => Err(err),
        (Err(err), Err(close_err)) => {
            tracing::warn!(error = %close_err, "closing connection failed after procedure error");
            Err(err)
        }
    }
}
