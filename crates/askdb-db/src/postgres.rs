//! PostgreSQL gateway over `tokio-postgres`.
//!
//! One client is opened at startup and shared across requests. The server
//! runs one statement at a time per connection, so requests take turns on
//! it; in read-only mode each execution gets its own read-only transaction.
use askdb_core::{DatabaseConfig, DatabaseError, SqlDatabase};
use async_trait::async_trait;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio_postgres::types::Type;
use tokio_postgres::{Client, NoTls, SimpleQueryMessage, Statement};

use crate::render::{render_rows, ColumnKind};
use crate::schema::{group_columns, quote_ident, render_tables, ColumnInfo};
use crate::{guard, POSTGRES_DIALECT};

const COLUMNS_SQL: &str = "\
SELECT c.table_name::text, c.column_name::text, c.data_type::text, c.is_nullable::text
FROM information_schema.columns c
JOIN information_schema.tables t
  ON t.table_schema = c.table_schema AND t.table_name = c.table_name
WHERE c.table_schema::text = $1 AND t.table_type = 'BASE TABLE'
ORDER BY c.table_name, c.ordinal_position";

const NUMERIC_TYPES: [Type; 7] = [
    Type::INT2,
    Type::INT4,
    Type::INT8,
    Type::FLOAT4,
    Type::FLOAT8,
    Type::NUMERIC,
    Type::OID,
];

pub struct PgDatabase {
    client: Mutex<Client>,
    config: DatabaseConfig,
}

impl PgDatabase {
    /// Open the connection and spawn its driver task on the current runtime.
    pub async fn connect(config: DatabaseConfig) -> Result<Self, DatabaseError> {
        let mut pg: tokio_postgres::Config = config
            .connection_uri()
            .parse()
            .map_err(|e: tokio_postgres::Error| DatabaseError::Connection(e.to_string()))?;

        pg.application_name("askdb");
        pg.connect_timeout(Duration::from_secs(config.connect_timeout_secs));

        let mut options = format!("-c statement_timeout={}", config.statement_timeout_ms);
        if config.read_only {
            options.push_str(" -c default_transaction_read_only=on");
        }
        pg.options(&options);

        let (client, connection) = pg
            .connect(NoTls)
            .await
            .map_err(|e| DatabaseError::Connection(e.to_string()))?;

        tokio::spawn(async move {
            match connection.await {
                Ok(()) => tracing::info!("postgres connection closed"),
                Err(e) => tracing::error!(error = %e, "postgres connection failed"),
            }
        });

        tracing::info!(
            host = %config.host,
            port = config.port,
            database = %config.database,
            read_only = config.read_only,
            "connected to postgres"
        );

        Ok(Self {
            client: Mutex::new(client),
            config,
        })
    }

    async fn sample_rows(
        &self,
        client: &Client,
        table: &str,
    ) -> Result<Vec<Vec<Option<String>>>, DatabaseError> {
        let sql = format!(
            "SELECT * FROM {}.{} LIMIT {}",
            quote_ident(&self.config.schema),
            quote_ident(table),
            self.config.sample_rows
        );
        let messages = client.simple_query(&sql).await.map_err(driver_error)?;
        Ok(text_rows(&messages))
    }

    /// Column types are best effort here: a batch of statements cannot be
    /// prepared and renders untyped.
    async fn execute_unrestricted(&self, sql: &str) -> Result<String, DatabaseError> {
        let client = self.client.lock().await;
        let kinds = match client.prepare(sql).await {
            Ok(statement) => column_kinds(&statement),
            Err(_) => Vec::new(),
        };
        let messages = client.simple_query(sql).await.map_err(driver_error)?;
        Ok(render_rows(&text_rows(&messages), &kinds))
    }

    /// Runs inside `BEGIN READ ONLY`, whatever the session default says, and
    /// always rolls back so no session setting outlives the request.
    async fn execute_read_only(&self, sql: &str) -> Result<String, DatabaseError> {
        guard::ensure_read_only(sql)?;

        let mut client = self.client.lock().await;
        let tx = client
            .build_transaction()
            .read_only(true)
            .start()
            .await
            .map_err(driver_error)?;
        let statement = tx.prepare(sql).await.map_err(driver_error)?;
        let messages = tx.simple_query(sql).await.map_err(driver_error)?;
        tx.rollback().await.map_err(driver_error)?;

        Ok(render_rows(&text_rows(&messages), &column_kinds(&statement)))
    }
}

#[async_trait]
impl SqlDatabase for PgDatabase {
    fn dialect(&self) -> &str {
        POSTGRES_DIALECT
    }

    async fn describe_schema(&self) -> Result<String, DatabaseError> {
        let client = self.client.lock().await;
        let rows = client
            .query(COLUMNS_SQL, &[&self.config.schema])
            .await
            .map_err(driver_error)?;

        let mut catalog = Vec::with_capacity(rows.len());
        for row in rows {
            let table: String = row.try_get(0).map_err(driver_error)?;
            let is_nullable: String = row.try_get(3).map_err(driver_error)?;
            catalog.push((
                table,
                ColumnInfo {
                    name: row.try_get(1).map_err(driver_error)?,
                    data_type: row.try_get(2).map_err(driver_error)?,
                    nullable: is_nullable == "YES",
                },
            ));
        }

        let mut tables = group_columns(catalog, &self.config.include_tables);
        if self.config.sample_rows > 0 {
            for table in &mut tables {
                match self.sample_rows(&client, &table.name).await {
                    Ok(rows) => table.sample_rows = rows,
                    Err(e) => {
                        tracing::warn!(table = %table.name, error = %e, "skipping sample rows")
                    }
                }
            }
        }

        tracing::debug!(tables = tables.len(), "described schema");
        Ok(render_tables(&tables))
    }

    async fn execute(&self, sql: &str) -> Result<String, DatabaseError> {
        if self.config.read_only {
            self.execute_read_only(sql).await
        } else {
            self.execute_unrestricted(sql).await
        }
    }
}

fn text_rows(messages: &[SimpleQueryMessage]) -> Vec<Vec<Option<String>>> {
    messages
        .iter()
        .filter_map(|m| match m {
            SimpleQueryMessage::Row(row) => Some(
                (0..row.len())
                    .map(|i| row.get(i).map(str::to_string))
                    .collect(),
            ),
            _ => None,
        })
        .collect()
}

fn column_kinds(statement: &Statement) -> Vec<ColumnKind> {
    statement.columns().iter().map(|c| column_kind(c.type_())).collect()
}

fn column_kind(ty: &Type) -> ColumnKind {
    if NUMERIC_TYPES.contains(ty) {
        ColumnKind::Numeric
    } else if *ty == Type::BOOL {
        ColumnKind::Boolean
    } else {
        ColumnKind::Text
    }
}

/// Server-side errors keep the server's message; a dead connection is not
/// the query's fault.
fn driver_error(e: tokio_postgres::Error) -> DatabaseError {
    if e.is_closed() {
        return DatabaseError::Connection(e.to_string());
    }
    match e.as_db_error() {
        Some(db) => DatabaseError::QueryExecution(db.to_string()),
        None => DatabaseError::QueryExecution(e.to_string()),
    }
}
