//! askdb-db: PostgreSQL implementation of [`askdb_core::SqlDatabase`].
//!
//! # Example
//!
//! ```ignore
//! use askdb_core::{DatabaseConfig, SqlDatabase};
//! use askdb_db::PgDatabase;
//!
//! let db = PgDatabase::connect(DatabaseConfig::default()).await?;
//! println!("{}", db.describe_schema().await?);
//! println!("{}", db.execute(r#"SELECT SUM("TotalSales") FROM products"#).await?);
//! ```

pub mod guard;
pub mod postgres;
pub mod render;
pub mod schema;

pub use guard::ensure_read_only;
pub use postgres::PgDatabase;
pub use render::{render_rows, render_value, ColumnKind};
pub use schema::{ColumnInfo, TableInfo};

/// Dialect name reported to the query prompt.
pub const POSTGRES_DIALECT: &str = "postgresql";
